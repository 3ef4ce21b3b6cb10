//! Repository implementations
//!
//! Concrete implementations of the store traits defined in callmatch-core,
//! using sqlx for PostgreSQL access.

pub mod cdr_repo;
pub mod contact_repo;

pub use cdr_repo::PgCallRecordStore;
pub use contact_repo::PgContactRepository;
