//! Contact row model
//!
//! One uploaded tender/contact record: the company, up to three contact
//! phones, and the staff caller who should have called them. Call fields
//! start empty and are filled by reconciliation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of (contact person, phone) pairs carried by a row
pub const MAX_CONTACTS: usize = 3;

/// Receiver sentinel for rows whose calls could not be attributed
pub const RECEIVER_NOT_FOUND: &str = "N/A";

/// A contact person and phone, a receiver candidate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPhone {
    pub person: Option<String>,
    pub phone: Option<String>,
}

impl ContactPhone {
    pub fn new(person: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            person: Some(person.into()),
            phone: Some(phone.into()),
        }
    }

    /// Phone text, empty when unset
    pub fn phone_str(&self) -> &str {
        self.phone.as_deref().unwrap_or_default()
    }
}

/// Where a row stands with respect to reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    /// Not reconciled yet
    #[default]
    Pending,
    /// Passed through unchanged (no usable caller number)
    Skipped,
    /// No calls from this caller in the window
    NoCalls,
    /// Calls exist but none to this row's contact phones
    NoReceiverMatch,
    /// A receiver was resolved and metrics merged
    Matched,
}

impl ReconciliationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationStatus::Pending => "pending",
            ReconciliationStatus::Skipped => "skipped",
            ReconciliationStatus::NoCalls => "no_calls",
            ReconciliationStatus::NoReceiverMatch => "no_receiver_match",
            ReconciliationStatus::Matched => "matched",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "skipped" => ReconciliationStatus::Skipped,
            "no_calls" => ReconciliationStatus::NoCalls,
            "no_receiver_match" => ReconciliationStatus::NoReceiverMatch,
            "matched" => ReconciliationStatus::Matched,
            _ => ReconciliationStatus::Pending,
        }
    }
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactRow {
    /// Storage id, absent for rows that were never saved
    pub id: Option<i64>,

    pub company_name: String,

    pub identification_code: String,

    /// Receiver candidates in declared order
    pub contacts: [ContactPhone; MAX_CONTACTS],

    pub caller_name: Option<String>,

    /// Join key into the call log once normalized
    pub caller_number: Option<String>,

    pub receiver_name: Option<String>,

    pub receiver_number: Option<String>,

    pub call_count: Option<i64>,

    pub answered_calls: Option<i64>,

    pub no_answer_calls: Option<i64>,

    pub busy_calls: Option<i64>,

    /// User-entered call date; may hold a range such as `2024-01-01 - 2024-01-31`
    pub call_date: Option<String>,

    /// `call_date` was filled from the call log rather than entered by a user
    pub call_date_backfilled: bool,

    /// Date of the latest matched call in the call log
    pub cdr_call_date: Option<NaiveDateTime>,

    /// Answered talk time as `HH:MM:SS`
    pub call_duration: Option<String>,

    /// Disposition of the latest matched call
    pub call_status: Option<String>,

    pub reconciliation: ReconciliationStatus,
}

impl ContactRow {
    /// Caller number text, empty when unset
    pub fn caller_str(&self) -> &str {
        self.caller_number.as_deref().unwrap_or_default()
    }

    /// Whether the user supplied a call date
    ///
    /// A date backfilled by an earlier reconciliation does not count.
    pub fn has_call_date(&self) -> bool {
        !self.call_date_backfilled
            && self
                .call_date
                .as_deref()
                .map(|d| !d.trim().is_empty())
                .unwrap_or(false)
    }

    /// Whether reconciliation produced metrics (including explicit zeros)
    pub fn is_processed(&self) -> bool {
        self.call_count.is_some()
    }
}

/// What happens to previously stored rows when a batch is uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadPolicy {
    /// Truncate the stored batch and insert the new one
    #[default]
    Replace,
    /// Keep stored rows and add the new ones
    Append,
}

impl UploadPolicy {
    pub fn truncates_existing(&self) -> bool {
        matches!(self, UploadPolicy::Replace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_call_date() {
        let mut row = ContactRow::default();
        assert!(!row.has_call_date());

        row.call_date = Some("   ".to_string());
        assert!(!row.has_call_date());

        row.call_date = Some("2024-01-05".to_string());
        assert!(row.has_call_date());

        row.call_date_backfilled = true;
        assert!(!row.has_call_date());
    }

    #[test]
    fn test_processed_distinguishes_zero_from_unset() {
        let mut row = ContactRow::default();
        assert!(!row.is_processed());

        row.call_count = Some(0);
        assert!(row.is_processed());
    }

    #[test]
    fn test_reconciliation_status_round_trip() {
        for status in [
            ReconciliationStatus::Pending,
            ReconciliationStatus::Skipped,
            ReconciliationStatus::NoCalls,
            ReconciliationStatus::NoReceiverMatch,
            ReconciliationStatus::Matched,
        ] {
            assert_eq!(ReconciliationStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_upload_policy() {
        assert!(UploadPolicy::Replace.truncates_existing());
        assert!(!UploadPolicy::Append.truncates_existing());
        assert_eq!(UploadPolicy::default(), UploadPolicy::Replace);
    }
}
