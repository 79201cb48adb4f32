use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::shared::validation::PHONE_REGEX;

/// Request DTO for updating the caller's profile; omitted fields are kept
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 30, message = "First name must be 1-30 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 30, message = "Last name must be 1-30 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Empty string clears the number
    #[validate(custom(function = "validate_phone"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl UpdateProfileDto {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.phone_number.is_none()
    }
}

fn validate_phone(phone: &str) -> Result<(), validator::ValidationError> {
    if phone.is_empty() || PHONE_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("phone_number").with_message(
            "Phone number must be entered in the format: '+999999999'. Up to 15 digits allowed."
                .into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_may_be_cleared() {
        let dto = UpdateProfileDto {
            phone_number: Some(String::new()),
            ..Default::default()
        };
        assert!(dto.validate().is_ok());
        assert!(!dto.is_empty());
    }

    #[test]
    fn test_invalid_phone_rejected() {
        let dto = UpdateProfileDto {
            phone_number: Some("call me".to_string()),
            ..Default::default()
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("phone_number"));
    }

    #[test]
    fn test_blank_first_name_rejected() {
        let dto = UpdateProfileDto {
            first_name: Some(String::new()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
        assert!(UpdateProfileDto::default().is_empty());
    }
}
