//! Domain models for Callmatch
//!
//! This module contains all the core domain models used throughout the application.

pub mod auth;
pub mod call_event;
pub mod contact;
pub mod window;

pub use auth::{AuthContext, Permission, UserRole};
pub use call_event::{CallEvent, Disposition};
pub use contact::{ContactPhone, ContactRow, ReconciliationStatus, UploadPolicy, MAX_CONTACTS};
pub use window::DateWindow;
