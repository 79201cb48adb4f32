use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::MAX_PAGE_SIZE;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Standard pagination query parameters for all list endpoints.
///
/// Extract it as its own `Query<PaginationQuery>` next to the filter query;
/// each listing supplies its own default page size.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Number of items per page (max: 100)
    #[param(minimum = 1, maximum = 100)]
    pub page_size: Option<i64>,
}

fn default_page() -> i64 {
    1
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: None,
        }
    }
}

impl PaginationQuery {
    /// Clamped page size, falling back to `default_size` when not given
    pub fn limit(&self, default_size: i64) -> i64 {
        self.page_size.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE)
    }

    /// SQL OFFSET for the current page
    pub fn offset(&self, default_size: i64) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit(default_size))
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_clamping() {
        let query = PaginationQuery::default();
        assert_eq!(query.limit(12), 12);
        assert_eq!(query.offset(12), 0);

        let query = PaginationQuery {
            page: 3,
            page_size: Some(500),
        };
        assert_eq!(query.limit(12), MAX_PAGE_SIZE);
        assert_eq!(query.offset(12), 2 * MAX_PAGE_SIZE);

        let query = PaginationQuery {
            page: 0,
            page_size: Some(0),
        };
        assert_eq!(query.limit(20), 1);
        assert_eq!(query.offset(20), 0);
    }

    #[test]
    fn test_offset_saturates_for_huge_pages() {
        let query = PaginationQuery {
            page: i64::MAX,
            page_size: Some(50),
        };
        assert_eq!(query.offset(12), i64::MAX);

        let query = PaginationQuery {
            page: i64::MIN,
            page_size: None,
        };
        assert_eq!(query.offset(12), 0);
    }
}
