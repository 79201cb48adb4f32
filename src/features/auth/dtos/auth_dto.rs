use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::access::models::UserRole;
use crate::features::auth::models::{OtpPurpose, User};
use crate::shared::validation::{PHONE_REGEX, USERNAME_REGEX};

/// Request DTO for user registration
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequestDto {
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1-150 characters"),
        regex(
            path = *USERNAME_REGEX,
            message = "Username may contain only letters, digits and @/./+/-/_"
        )
    )]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 30, message = "First name must be 1-30 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 30, message = "Last name must be 1-30 characters"))]
    pub last_name: String,

    #[validate(regex(
        path = *PHONE_REGEX,
        message = "Phone number must be entered in the format: '+999999999'. Up to 15 digits allowed."
    ))]
    pub phone_number: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirm: String,
}

/// Request DTO for user login
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequestDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request DTO for submitting a one-time code
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct VerifyOtpRequestDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub purpose: OtpPurpose,

    #[validate(length(equal = 6, message = "OTP code must be 6 digits"))]
    pub otp_code: String,
}

/// Request DTO for asking for a new one-time code
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ResendOtpRequestDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub purpose: OtpPurpose,
}

/// Returned whenever a code has been emailed and awaits verification
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OtpChallengeDto {
    pub email: String,
    pub purpose: OtpPurpose,
    /// Minutes until the code expires
    pub expires_in_minutes: i64,
}

/// Outcome of a successful verification
///
/// Signup verification activates the account and carries no token; login
/// verification returns the access token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyOtpResponseDto {
    pub purpose: OtpPurpose,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Token expiry time in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    pub user: UserDto,
}

/// Account as shown to its owner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone_number: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            full_name: u.full_name(),
            id: u.id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            phone_number: u.phone_number,
            role: u.role,
            is_verified: u.is_verified,
            is_active: u.is_active,
            created_at: u.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register() -> RegisterRequestDto {
        RegisterRequestDto {
            username: "ada_l".to_string(),
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone_number: None,
            password: "analytical-engine".to_string(),
            password_confirm: "analytical-engine".to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(register().validate().is_ok());

        let mut dto = register();
        dto.phone_number = Some("+14155552671".to_string());
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_password_confirmation_must_match() {
        let mut dto = register();
        dto.password_confirm = "something-else".to_string();

        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password_confirm"));
    }

    #[test]
    fn test_bad_phone_and_username_rejected() {
        let mut dto = register();
        dto.phone_number = Some("555-1234".to_string());
        dto.username = "ada lovelace".to_string();

        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("phone_number"));
        assert!(fields.contains_key("username"));
    }

    #[test]
    fn test_purpose_is_lowercase_on_the_wire() {
        let dto: ResendOtpRequestDto =
            serde_json::from_str(r#"{"email":"ada@example.com","purpose":"login"}"#).unwrap();
        assert_eq!(dto.purpose, OtpPurpose::Login);
    }
}
