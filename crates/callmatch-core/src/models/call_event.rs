//! Call event model
//!
//! One row of the Asterisk CDR table as seen by the reconciliation engine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::phone::{caller_id_number, normalize};

/// Outcome of a call attempt as written by Asterisk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Disposition {
    Answered,
    NoAnswer,
    Busy,
    /// FAILED, CONGESTION and anything else the switch writes
    Other(String),
}

impl Disposition {
    /// Parse by exact string match; anything unrecognised is kept verbatim
    pub fn parse(s: &str) -> Self {
        match s {
            "ANSWERED" => Disposition::Answered,
            "NO ANSWER" => Disposition::NoAnswer,
            "BUSY" => Disposition::Busy,
            other => Disposition::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Disposition::Answered => "ANSWERED",
            Disposition::NoAnswer => "NO ANSWER",
            Disposition::Busy => "BUSY",
            Disposition::Other(s) => s,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Disposition {
    fn from(s: String) -> Self {
        Disposition::parse(&s)
    }
}

impl From<Disposition> for String {
    fn from(d: Disposition) -> Self {
        d.as_str().to_string()
    }
}

/// Call detail record
///
/// Immutable from the engine's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEvent {
    /// Call start timestamp (switch local time)
    pub calldate: NaiveDateTime,

    /// Composite caller ID, e.g. `"Nino" <995555123456>`
    pub clid: String,

    /// Source (caller) number
    pub src: String,

    /// Destination (receiver) number
    pub dst: String,

    /// Total duration in seconds
    pub duration: i32,

    /// Billed seconds (answer to hangup)
    pub billsec: Option<i32>,

    /// Call outcome
    pub disposition: Disposition,

    /// Recording file reference
    pub recording_file: Option<String>,

    /// Asterisk unique call id
    pub uniqueid: Option<String>,
}

impl CallEvent {
    /// Every caller number the call carries: `src` digits and the caller ID
    /// digits, deduplicated, empties dropped
    pub fn caller_numbers(&self) -> Vec<String> {
        let mut numbers = Vec::with_capacity(2);
        let src = normalize(&self.src);
        if !src.is_empty() {
            numbers.push(src);
        }
        if let Some(clid) = caller_id_number(&self.clid).map(normalize) {
            if !clid.is_empty() && !numbers.contains(&clid) {
                numbers.push(clid);
            }
        }
        numbers
    }

    /// Digits of the destination
    pub fn destination_digits(&self) -> String {
        normalize(&self.dst)
    }

    #[inline]
    pub fn was_answered(&self) -> bool {
        self.disposition == Disposition::Answered
    }

    /// Seconds counted as talk time: billed seconds when present
    #[inline]
    pub fn talk_seconds(&self) -> i64 {
        i64::from(self.billsec.unwrap_or(self.duration))
    }
}

impl Default for CallEvent {
    fn default() -> Self {
        Self {
            calldate: NaiveDateTime::default(),
            clid: String::new(),
            src: String::new(),
            dst: String::new(),
            duration: 0,
            billsec: None,
            disposition: Disposition::Other(String::new()),
            recording_file: None,
            uniqueid: None,
        }
    }
}
