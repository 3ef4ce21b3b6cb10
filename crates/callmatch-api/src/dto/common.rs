//! Common DTOs used across the API

use callmatch_core::models::DateWindow;
use callmatch_core::traits::{PaginatedResponse, PaginationMeta};
use callmatch_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            data,
            message: None,
        }
    }

    /// Create a success response with data and message
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: Some(message.into()),
        }
    }
}

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page", deserialize_with = "deserialize_number_from_string")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub page: i64,

    /// Items per page
    #[serde(default = "default_per_page", deserialize_with = "deserialize_number_from_string")]
    #[validate(range(min = 1, max = 1000))]
    pub per_page: i64,
}

/// Deserialize a number from either a string or a number
///
/// Query strings flattened into a struct arrive as strings.
fn deserialize_number_from_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct I64OrStringVisitor;

    impl<'de> Visitor<'de> for I64OrStringVisitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E>(self, value: i64) -> Result<i64, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<i64, E>
        where
            E: de::Error,
        {
            i64::try_from(value).map_err(de::Error::custom)
        }

        fn visit_str<E>(self, value: &str) -> Result<i64, E>
        where
            E: de::Error,
        {
            value.trim().parse::<i64>().map_err(de::Error::custom)
        }
    }

    deserializer.deserialize_any(I64OrStringVisitor)
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    50
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    /// Calculate offset for database query, never negative
    #[inline]
    pub fn offset(&self) -> i64 {
        self.page
            .saturating_sub(1)
            .max(0)
            .saturating_mul(self.per_page.max(0))
    }

    /// Get limit for database query
    #[inline]
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Create pagination metadata
    pub fn metadata(&self, total: i64) -> PaginationMeta {
        PaginationMeta::new(total, self.page, self.per_page)
    }

    /// Create paginated response
    pub fn paginate<T>(&self, data: Vec<T>, total: i64) -> PaginatedResponse<T> {
        PaginatedResponse {
            data,
            pagination: self.metadata(total),
        }
    }
}

/// Window from optional `YYYY-MM-DD` bounds; both or neither must be given
pub fn parse_optional_window(
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> AppResult<Option<DateWindow>> {
    let start = start_date.map(str::trim).filter(|s| !s.is_empty());
    let end = end_date.map(str::trim).filter(|s| !s.is_empty());

    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => DateWindow::parse(start, end).map(Some),
        (Some(_), None) => Err(AppError::MissingField("end_date".to_string())),
        (None, Some(_)) => Err(AppError::MissingField("start_date".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_params_offset() {
        let params = PaginationParams {
            page: 3,
            per_page: 20,
        };
        assert_eq!(params.offset(), 40);
        assert_eq!(params.limit(), 20);
    }

    #[test]
    fn test_huge_page_is_rejected_and_offset_saturates() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"page":"9223372036854775807","per_page":"50"}"#).unwrap();
        assert!(params.validate().is_err());
        assert_eq!(params.offset(), i64::MAX);

        let params = PaginationParams {
            page: i64::MIN,
            per_page: 50,
        };
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_pagination_from_query_strings() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"page":"2","per_page":"25"}"#).unwrap();
        assert_eq!(params.page, 2);
        assert_eq!(params.per_page, 25);

        let params: PaginationParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 50);
    }

    #[test]
    fn test_api_response() {
        let resp = ApiResponse::success("test");
        assert_eq!(resp.data, "test");
        assert!(resp.message.is_none());

        let resp = ApiResponse::with_message("data", "success");
        assert_eq!(resp.message, Some("success".to_string()));
    }

    #[test]
    fn test_parse_optional_window() {
        assert!(parse_optional_window(None, None).unwrap().is_none());
        assert!(parse_optional_window(Some(""), Some(" ")).unwrap().is_none());

        let window = parse_optional_window(Some("2024-01-01"), Some("2024-01-31"))
            .unwrap()
            .unwrap();
        assert_eq!(window.to_string(), "2024-01-01 - 2024-01-31");

        assert!(matches!(
            parse_optional_window(Some("2024-01-01"), None),
            Err(AppError::MissingField(_))
        ));
        assert!(matches!(
            parse_optional_window(Some("2024-02-01"), Some("2024-01-01")),
            Err(AppError::InvalidDateWindow(_))
        ));
    }
}
