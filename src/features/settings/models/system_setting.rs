use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a key/value system setting
#[derive(Debug, Clone, FromRow)]
pub struct SystemSetting {
    pub id: Uuid,
    pub key: String,
    pub value: String,
    pub description: String,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl SystemSetting {
    pub fn is_enabled(&self) -> bool {
        parse_flag(&self.value)
    }
}

/// "true", "1", "yes" and "on" (any case) are truthy
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        for v in ["true", "TRUE", " 1 ", "yes", "On"] {
            assert!(parse_flag(v), "{v:?} should be truthy");
        }
        for v in ["false", "0", "", "nope"] {
            assert!(!parse_flag(v), "{v:?} should be falsy");
        }
    }
}
