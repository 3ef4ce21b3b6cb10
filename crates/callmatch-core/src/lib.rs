//! Callmatch Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the Callmatch system. It includes:
//!
//! - Domain models (ContactRow, CallEvent, DateWindow, AuthContext)
//! - Phone number normalization and equivalence expansion
//! - Traits for the call record store and the contact repository
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod phone;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;
pub use phone::{normalize, NormalizedNumber, PhoneNormalizer};

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
