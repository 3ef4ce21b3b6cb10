//! Contact row DTOs
//!
//! Rows arrive from spreadsheet uploads and dashboard clients that disagree
//! on key casing. Input accepts both snake_case and camelCase keys, and
//! numeric cells where text is expected. Output carries every field under
//! both spellings.

use super::common::PaginationParams;
use callmatch_core::models::{ContactPhone, ContactRow, ReconciliationStatus, UploadPolicy};
use chrono::NaiveDateTime;
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use validator::Validate;

/// Contact row as exchanged with clients
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ContactRowDto {
    /// Storage id
    #[serde(default)]
    pub id: Option<i64>,

    /// Company (tender) name
    #[serde(default, alias = "companyName", deserialize_with = "text")]
    pub company_name: Option<String>,

    /// Company identification code
    #[serde(default, alias = "identificationCode", deserialize_with = "text")]
    pub identification_code: Option<String>,

    /// First contact person
    #[serde(default, alias = "contactPerson1", deserialize_with = "text")]
    pub contact_person1: Option<String>,

    /// First contact phone
    #[serde(default, deserialize_with = "text")]
    pub tel1: Option<String>,

    /// Second contact person
    #[serde(default, alias = "contactPerson2", deserialize_with = "text")]
    pub contact_person2: Option<String>,

    /// Second contact phone
    #[serde(default, deserialize_with = "text")]
    pub tel2: Option<String>,

    /// Third contact person
    #[serde(default, alias = "contactPerson3", deserialize_with = "text")]
    pub contact_person3: Option<String>,

    /// Third contact phone
    #[serde(default, deserialize_with = "text")]
    pub tel3: Option<String>,

    /// Staff member expected to call
    #[serde(default, alias = "callerName", deserialize_with = "text")]
    pub caller_name: Option<String>,

    /// Staff member's number
    #[serde(default, alias = "callerNumber", deserialize_with = "text")]
    pub caller_number: Option<String>,

    /// Resolved receiver's name
    #[serde(default, alias = "receiverName", deserialize_with = "text")]
    pub receiver_name: Option<String>,

    /// Resolved receiver's number, `N/A` when unresolved
    #[serde(default, alias = "receiverNumber", deserialize_with = "text")]
    pub receiver_number: Option<String>,

    /// Calls to the receiver
    #[serde(default, alias = "callCount")]
    pub call_count: Option<i64>,

    /// Answered calls
    #[serde(default, alias = "answeredCalls")]
    pub answered_calls: Option<i64>,

    /// Unanswered calls
    #[serde(default, alias = "noAnswerCalls")]
    pub no_answer_calls: Option<i64>,

    /// Busy calls
    #[serde(default, alias = "busyCalls")]
    pub busy_calls: Option<i64>,

    /// User-entered call date or date range
    #[serde(default, alias = "callDate", deserialize_with = "text")]
    pub call_date: Option<String>,

    /// Whether `call_date` was filled from the call log
    #[serde(default, alias = "callDateBackfilled")]
    pub call_date_backfilled: Option<bool>,

    /// Latest matched call in the call log
    #[serde(default, alias = "cdrCallDate")]
    pub cdr_call_date: Option<NaiveDateTime>,

    /// Answered talk time `HH:MM:SS`
    #[serde(default, alias = "callDuration", deserialize_with = "text")]
    pub call_duration: Option<String>,

    /// Disposition of the latest matched call
    #[serde(default, alias = "callStatus", deserialize_with = "text")]
    pub call_status: Option<String>,

    /// Reconciliation outcome
    #[serde(default)]
    pub reconciliation: Option<ReconciliationStatus>,
}

/// Optional text accepting strings, numbers, or null
fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(match n.as_f64() {
            Some(f) if f.fract() == 0.0 && n.is_f64() => format!("{:.0}", f),
            _ => n.to_string(),
        }),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected text or number, found {}",
                other
            )))
        }
    })
}

impl From<ContactRowDto> for ContactRow {
    fn from(dto: ContactRowDto) -> Self {
        Self {
            id: dto.id,
            company_name: dto.company_name.unwrap_or_default(),
            identification_code: dto.identification_code.unwrap_or_default(),
            contacts: [
                ContactPhone {
                    person: dto.contact_person1,
                    phone: dto.tel1,
                },
                ContactPhone {
                    person: dto.contact_person2,
                    phone: dto.tel2,
                },
                ContactPhone {
                    person: dto.contact_person3,
                    phone: dto.tel3,
                },
            ],
            caller_name: dto.caller_name,
            caller_number: dto.caller_number,
            receiver_name: dto.receiver_name,
            receiver_number: dto.receiver_number,
            call_count: dto.call_count,
            answered_calls: dto.answered_calls,
            no_answer_calls: dto.no_answer_calls,
            busy_calls: dto.busy_calls,
            call_date: dto.call_date,
            call_date_backfilled: dto.call_date_backfilled.unwrap_or(false),
            cdr_call_date: dto.cdr_call_date,
            call_duration: dto.call_duration,
            call_status: dto.call_status,
            reconciliation: dto.reconciliation.unwrap_or_default(),
        }
    }
}

impl From<ContactRow> for ContactRowDto {
    fn from(row: ContactRow) -> Self {
        let [c1, c2, c3] = row.contacts;
        Self {
            id: row.id,
            company_name: Some(row.company_name),
            identification_code: Some(row.identification_code),
            contact_person1: c1.person,
            tel1: c1.phone,
            contact_person2: c2.person,
            tel2: c2.phone,
            contact_person3: c3.person,
            tel3: c3.phone,
            caller_name: row.caller_name,
            caller_number: row.caller_number,
            receiver_name: row.receiver_name,
            receiver_number: row.receiver_number,
            call_count: row.call_count,
            answered_calls: row.answered_calls,
            no_answer_calls: row.no_answer_calls,
            busy_calls: row.busy_calls,
            call_date: row.call_date,
            call_date_backfilled: Some(row.call_date_backfilled),
            cdr_call_date: row.cdr_call_date,
            call_duration: row.call_duration,
            call_status: row.call_status,
            reconciliation: Some(row.reconciliation),
        }
    }
}

/// Row serialized under snake_case keys plus their camelCase twins
#[derive(Debug, Clone, PartialEq)]
pub struct AliasedRow(pub ContactRowDto);

impl From<ContactRow> for AliasedRow {
    fn from(row: ContactRow) -> Self {
        Self(row.into())
    }
}

impl Serialize for AliasedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Value::Object(fields) = serde_json::to_value(&self.0).map_err(S::Error::custom)? else {
            return Err(S::Error::custom("contact row did not serialize to an object"));
        };

        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
            let camel = camel_case(key);
            if camel != *key {
                map.serialize_entry(&camel, value)?;
            }
        }
        map.end()
    }
}

/// `contact_person1` -> `contactPerson1`
fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Upload request body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UploadRequest {
    /// Rows to store
    #[validate(length(min = 1, max = 20000))]
    pub rows: Vec<ContactRowDto>,

    /// Whether the previous batch is replaced
    #[serde(default)]
    pub policy: UploadPolicy,
}

/// Upload result
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    /// Rows written
    pub stored: usize,
    /// Policy applied
    pub policy: UploadPolicy,
}

/// Contact list query parameters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactListParams {
    /// Pagination parameters
    #[serde(flatten)]
    #[validate(nested)]
    pub pagination: PaginationParams,

    /// Free-text search over company, code and people
    #[validate(length(max = 200))]
    pub search: Option<String>,
}
