use serde::{Deserialize, Serialize};
use sqlx::Type;
use utoipa::ToSchema;

/// File-level policy tag consulted before any per-user grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema, Default)]
#[sqlx(type_name = "file_visibility", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only the owner may access the file
    #[default]
    Private,
    /// Any authenticated user may view and download
    Public,
    /// Access is decided by per-user grants
    Restricted,
}

impl Visibility {
    /// Public and restricted files count as "shared" in user statistics
    pub fn is_shared(self) -> bool {
        matches!(self, Visibility::Public | Visibility::Restricted)
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Private => write!(f, "private"),
            Visibility::Public => write!(f, "public"),
            Visibility::Restricted => write!(f, "restricted"),
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            "restricted" => Ok(Visibility::Restricted),
            other => Err(format!(
                "Invalid visibility '{}'. Expected private, public or restricted",
                other
            )),
        }
    }
}

/// Level carried by a grant. Variant order is the authorization order:
/// `View < Download < Edit`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Type, ToSchema, Default,
)]
#[sqlx(type_name = "permission_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// View only
    #[default]
    View,
    /// View and download
    Download,
    /// View, download and edit
    Edit,
}

impl std::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionLevel::View => write!(f, "view"),
            PermissionLevel::Download => write!(f, "download"),
            PermissionLevel::Edit => write!(f, "edit"),
        }
    }
}

/// An operation a principal asks to perform on a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    View,
    Download,
    Edit,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::View, Operation::Download, Operation::Edit];

    /// Minimum grant level that authorizes this operation
    pub fn required_level(self) -> PermissionLevel {
        match self {
            Operation::View => PermissionLevel::View,
            Operation::Download => PermissionLevel::Download,
            Operation::Edit => PermissionLevel::Edit,
        }
    }

    /// Verb used in user-facing denial messages
    pub fn verb(self) -> &'static str {
        match self {
            Operation::View => "view",
            Operation::Download => "download",
            Operation::Edit => "edit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_levels_are_totally_ordered() {
        assert!(PermissionLevel::View < PermissionLevel::Download);
        assert!(PermissionLevel::Download < PermissionLevel::Edit);
        assert_eq!(
            [
                PermissionLevel::Edit,
                PermissionLevel::View,
                PermissionLevel::Download
            ]
            .iter()
            .max(),
            Some(&PermissionLevel::Edit)
        );
    }

    #[test]
    fn test_visibility_from_str() {
        assert_eq!("Public".parse::<Visibility>(), Ok(Visibility::Public));
        assert_eq!(" restricted ".parse::<Visibility>(), Ok(Visibility::Restricted));
        assert!("secret".parse::<Visibility>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase() {
        assert_eq!(
            serde_json::to_string(&PermissionLevel::Download).unwrap(),
            "\"download\""
        );
        let v: Visibility = serde_json::from_str("\"restricted\"").unwrap();
        assert_eq!(v, Visibility::Restricted);
    }
}
