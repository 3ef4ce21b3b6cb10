//! Reconciliation services for Callmatch
//!
//! This crate contains the logic that cross-references uploaded contact
//! batches with the telephony call log.
//!
//! # Services
//!
//! - `ReconciliationEngine` - batch matching of callers to observed calls
//! - `metrics` - per-pair call counts and answered talk time
//! - `receiver` - first-match-wins receiver resolution
//! - `merger` - writes results onto rows without clobbering user data
//! - `window` - date range precedence between rows and request

pub mod merger;
pub mod metrics;
pub mod receiver;
pub mod reconciliation;
pub mod window;

pub use metrics::{aggregate, format_duration, parse_duration, CallMetrics};
pub use receiver::{resolve_receiver, ResolvedReceiver};
pub use reconciliation::{
    DiagnosticKind, ReconciliationEngine, ReconciliationReport, ReconciliationSummary,
    RowDiagnostic,
};
pub use window::resolve_window;
