use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::categories::models::Category;

pub const DEFAULT_CATEGORY_ICON: &str = "fa-folder";

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Font Awesome icon class
    pub icon: String,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            icon: c.icon,
            created_at: c.created_at,
        }
    }
}

/// Request DTO for creating a category
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Defaults to `fa-folder`
    #[validate(length(min = 1, max = 50, message = "Icon must be 1-50 characters"))]
    pub icon: Option<String>,
}

impl CreateCategoryDto {
    pub fn icon_or_default(&self) -> &str {
        self.icon
            .as_deref()
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .unwrap_or(DEFAULT_CATEGORY_ICON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_defaults_to_folder() {
        let dto: CreateCategoryDto = serde_json::from_str(r#"{"name":"Invoices"}"#).unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.icon_or_default(), "fa-folder");

        let dto: CreateCategoryDto =
            serde_json::from_str(r#"{"name":"Photos","icon":"fa-image"}"#).unwrap();
        assert_eq!(dto.icon_or_default(), "fa-image");
    }

    #[test]
    fn test_empty_name_rejected() {
        let dto: CreateCategoryDto = serde_json::from_str(r#"{"name":""}"#).unwrap();
        assert!(dto.validate().is_err());
    }
}
