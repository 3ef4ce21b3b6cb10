//! Callmatch Database Layer
//!
//! This crate provides PostgreSQL access for the Callmatch system. It includes:
//!
//! - Connection pool management with sqlx
//! - The contact batch repository (uploaded rows and their call fields)
//! - A read-only call record store over the telephony `cdr` table
//! - Embedded schema migrations

pub mod pool;
pub mod repositories;

pub use pool::{create_pool, run_migrations};
pub use repositories::*;

// Re-export commonly used types
pub use callmatch_core::{AppError, AppResult};
pub use sqlx::{PgPool, Postgres, Transaction};
