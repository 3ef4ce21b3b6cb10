//! Data Transfer Objects (DTOs) for API requests and responses

pub mod cdr;
pub mod common;
pub mod contact;
pub mod reconcile;

pub use cdr::*;
pub use common::*;
pub use contact::*;
pub use reconcile::*;
