use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Success envelope wrapped around every handler result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub message: String,
    pub data: T,
}

/// Error envelope produced for every failed request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// ISO-8601 time the failure was rendered
    pub timestamp: String,
    /// Request path (with query string) that failed
    pub path: String,
    pub status_code: u16,
    pub message: ErrorMessage,
}

/// A single message, or the ordered list produced by DTO validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ErrorMessage {
    Single(String),
    Many(Vec<String>),
}

impl From<String> for ErrorMessage {
    fn from(message: String) -> Self {
        ErrorMessage::Single(message)
    }
}

impl From<&str> for ErrorMessage {
    fn from(message: &str) -> Self {
        ErrorMessage::Single(message.to_string())
    }
}

impl From<Vec<String>> for ErrorMessage {
    fn from(messages: Vec<String>) -> Self {
        ErrorMessage::Many(messages)
    }
}

impl std::fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorMessage::Single(message) => f.write_str(message),
            ErrorMessage::Many(messages) => f.write_str(&messages.join(", ")),
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// A page of items plus the counters needed to render a pager
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: Meta,
}

/// Standard pagination query parameters for all list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Number of items per page (default: 10, max: 100)
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationQuery {
    /// Calculate SQL OFFSET from page number
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit())
    }

    /// Get clamped page_size (respects MAX_PAGE_SIZE)
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn paginate<T>(&self, items: Vec<T>, total: i64) -> Paginated<T> {
        Paginated {
            items,
            meta: Meta {
                total,
                page: self.page.max(1),
                page_size: self.limit(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_serializes_untagged() {
        let single = serde_json::to_value(ErrorMessage::from("Not found")).unwrap();
        assert_eq!(single, serde_json::json!("Not found"));

        let many = serde_json::to_value(ErrorMessage::from(vec![
            "name is required".to_string(),
            "code is invalid".to_string(),
        ]))
        .unwrap();
        assert_eq!(
            many,
            serde_json::json!(["name is required", "code is invalid"])
        );
    }

    #[test]
    fn test_pagination_clamps_page_size() {
        let query = PaginationQuery {
            page: 0,
            page_size: 500,
        };
        assert_eq!(query.limit(), MAX_PAGE_SIZE);
        assert_eq!(query.offset(), 0);

        let query = PaginationQuery {
            page: 3,
            page_size: 20,
        };
        assert_eq!(query.offset(), 40);
    }

    #[test]
    fn test_huge_page_saturates_offset() {
        let query = PaginationQuery {
            page: i64::MAX,
            page_size: 10,
        };
        assert_eq!(query.offset(), i64::MAX);
        assert_eq!(query.paginate(Vec::<()>::new(), 0).meta.page, i64::MAX);
    }
}
