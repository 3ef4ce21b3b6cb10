//! API layer for Callmatch
//!
//! HTTP handlers for uploading contact batches, reconciling them against the
//! call log and browsing call records.

#![forbid(unsafe_code)]
#![warn(clippy::all, missing_docs)]

pub mod dto;
pub mod handlers;

pub use dto::{ApiResponse, PaginationParams};
pub use handlers::{configure, SharedContacts, SharedEngine};
