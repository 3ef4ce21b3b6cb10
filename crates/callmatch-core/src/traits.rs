//! Common traits for stores and repositories
//!
//! Defines abstractions over the call log and the contact batch storage.

use crate::error::AppError;
use crate::models::{AuthContext, CallEvent, ContactRow, DateWindow, UploadPolicy};
use crate::phone::NormalizedNumber;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;

/// Read-only access to the telephony call log
#[async_trait]
pub trait CallRecordStore: Send + Sync {
    /// Calls in `window` whose caller (plain source or the number inside the
    /// caller ID) normalizes to one of `filter_numbers`, latest first.
    async fn query(
        &self,
        filter_numbers: &BTreeSet<String>,
        window: &DateWindow,
    ) -> Result<Vec<CallEvent>, AppError>;

    /// Calls involving any form of `number` in `window`, latest first, for
    /// browsing. Defaults to the calls placed by `number`.
    async fn list_for_number(
        &self,
        number: &NormalizedNumber,
        window: &DateWindow,
        limit: i64,
    ) -> Result<Vec<CallEvent>, AppError> {
        if number.is_empty() {
            return Ok(Vec::new());
        }
        let mut calls = self.query(number.variants(), window).await?;
        calls.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(calls)
    }
}

/// Storage of uploaded contact batches
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Store an uploaded batch according to `policy`, returning rows written
    async fn replace_batch(
        &self,
        ctx: &AuthContext,
        rows: &[ContactRow],
        policy: UploadPolicy,
    ) -> Result<usize, AppError>;

    /// List stored rows with an optional free-text search
    async fn list(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ContactRow>, i64), AppError>;

    /// All stored rows in upload order
    async fn find_all(&self) -> Result<Vec<ContactRow>, AppError>;

    /// Persist the call fields of reconciled rows that carry an id
    async fn save_reconciled(&self, rows: &[ContactRow]) -> Result<usize, AppError>;
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_meta() {
        assert_eq!(PaginationMeta::new(95, 1, 10).total_pages, 10);
        assert_eq!(PaginationMeta::new(101, 1, 10).total_pages, 11);
        assert_eq!(PaginationMeta::new(0, 1, 10).total_pages, 0);
    }
}
