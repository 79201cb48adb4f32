use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// What a one-time code unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "otp_purpose", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    Signup,
    Login,
    /// Reserved; no flow issues reset codes
    Reset,
}

impl OtpPurpose {
    /// Wording used in the email body
    pub fn email_label(self) -> &'static str {
        match self {
            OtpPurpose::Signup => "account verification",
            OtpPurpose::Login => "login verification",
            OtpPurpose::Reset => "password reset",
        }
    }
}

impl std::fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OtpPurpose::Signup => write!(f, "signup"),
            OtpPurpose::Login => write!(f, "login"),
            OtpPurpose::Reset => write!(f, "reset"),
        }
    }
}

/// Database model for issued one-time codes
#[derive(Debug, Clone, FromRow)]
pub struct OtpVerification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code_hash: String,
    pub purpose: OtpPurpose,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OtpVerification {
    /// Still usable at the instant of expiry, expired strictly after it
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_otp_expiry_boundary() {
        let now = Utc::now();
        let otp = OtpVerification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            code_hash: String::new(),
            purpose: OtpPurpose::Login,
            is_used: false,
            created_at: now - Duration::minutes(10),
            expires_at: now,
        };

        assert!(!otp.is_expired_at(now));
        assert!(otp.is_expired_at(now + Duration::seconds(1)));
    }
}
