//! Email bodies rendered with Jinja2 syntax.
//!
//! Templates are compiled into the binary from `templates/email/`.

use minijinja::{context, Environment};
use std::sync::OnceLock;

use super::EmailMessage;
use crate::core::error::{AppError, Result};

static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

const OTP_TEXT: &str = "otp.txt";
const OTP_HTML: &str = "otp.html";

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();

    let templates = [
        (OTP_TEXT, include_str!("../../../templates/email/otp.txt.jinja")),
        (OTP_HTML, include_str!("../../../templates/email/otp.html.jinja")),
    ];

    for (name, source) in templates {
        if let Err(e) = env.add_template(name, source) {
            tracing::warn!("Failed to load email template {}: {}", name, e);
        }
    }

    env
}

fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// One-time password email
#[derive(Debug, Clone)]
pub struct OtpEmail<'a> {
    pub first_name: &'a str,
    pub code: &'a str,
    /// Lowercase purpose, e.g. "signup" or "login"
    pub purpose: &'a str,
    pub expiry_minutes: i64,
    pub app_name: &'a str,
}

impl OtpEmail<'_> {
    pub fn subject(&self) -> String {
        let mut chars = self.purpose.chars();
        let titled = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        format!("Your OTP for {}", titled)
    }

    pub fn render(&self, to: &str) -> Result<EmailMessage> {
        let env = get_environment();
        let ctx = context! {
            first_name => self.first_name,
            code => self.code,
            purpose => self.purpose,
            expiry_minutes => self.expiry_minutes,
            app_name => self.app_name,
        };

        let render = |name: &str| {
            env.get_template(name)
                .and_then(|t| t.render(&ctx))
                .map_err(|e| AppError::Internal(format!("Failed to render {}: {}", name, e)))
        };

        Ok(EmailMessage {
            to: to.to_string(),
            subject: self.subject(),
            text_body: render(OTP_TEXT)?,
            html_body: Some(render(OTP_HTML)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> OtpEmail<'static> {
        OtpEmail {
            first_name: "Ada",
            code: "042917",
            purpose: "signup",
            expiry_minutes: 10,
            app_name: "Secure File Manager",
        }
    }

    #[test]
    fn test_subject_titles_purpose() {
        assert_eq!(email().subject(), "Your OTP for Signup");
    }

    #[test]
    fn test_render_includes_code_and_expiry() {
        let message = email().render("ada@example.com").unwrap();

        assert_eq!(message.to, "ada@example.com");
        assert!(message.text_body.contains("Hello Ada,"));
        assert!(message.text_body.contains("Your OTP code for signup is: 042917"));
        assert!(message.text_body.contains("expire in 10 minutes"));
        assert!(message.html_body.unwrap().contains("042917"));
    }
}
