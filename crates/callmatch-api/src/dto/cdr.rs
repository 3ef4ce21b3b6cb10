//! Call record DTOs

use callmatch_core::models::CallEvent;
use callmatch_services::format_duration;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Call log browse parameters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CallLogParams {
    /// Number in any format; all equivalent forms are searched
    #[validate(length(min = 1, max = 64))]
    pub number: String,

    /// Window start (`YYYY-MM-DD`)
    pub start_date: String,

    /// Window end (`YYYY-MM-DD`), inclusive
    pub end_date: String,

    /// Maximum number of calls returned
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 5000))]
    pub limit: i64,
}

fn default_limit() -> i64 {
    500
}

/// Call record as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct CallEventResponse {
    /// Call start
    pub calldate: NaiveDateTime,
    /// Composite caller ID
    pub clid: String,
    /// Source number
    pub src: String,
    /// Destination number
    pub dst: String,
    /// Total seconds
    pub duration: i32,
    /// Billed seconds
    pub billsec: Option<i32>,
    /// Call outcome
    pub disposition: String,
    /// Talk time `HH:MM:SS` for answered calls
    pub talk_time: String,
    /// Recording file reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_file: Option<String>,
    /// Switch call id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniqueid: Option<String>,
}

impl From<CallEvent> for CallEventResponse {
    fn from(call: CallEvent) -> Self {
        let talk_time = if call.was_answered() {
            format_duration(call.talk_seconds())
        } else {
            format_duration(0)
        };
        Self {
            calldate: call.calldate,
            disposition: call.disposition.as_str().to_string(),
            clid: call.clid,
            src: call.src,
            dst: call.dst,
            duration: call.duration,
            billsec: call.billsec,
            talk_time,
            recording_file: call.recording_file,
            uniqueid: call.uniqueid,
        }
    }
}
