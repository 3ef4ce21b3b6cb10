//! Call record store over the Asterisk `cdr` table
//!
//! Read-only. The table is owned by the telephony switch; its name is taken
//! from configuration and validated before it is interpolated into SQL.
//! Uses runtime queries (not compile-time macros) to avoid requiring a
//! database connection at build time.

use callmatch_core::{
    models::{CallEvent, DateWindow, Disposition},
    phone::LOCAL_NUMBER_DIGITS,
    traits::CallRecordStore,
    AppError, AppResult, NormalizedNumber,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use std::collections::BTreeSet;
use tracing::{debug, error, instrument};

/// Default name of the call detail record table
pub const DEFAULT_CDR_TABLE: &str = "cdr";

const CDR_SELECT_COLUMNS: &str = r#"
    calldate, clid, src, dst,
    duration, billsec, disposition,
    recordingfile, uniqueid
"#;

/// PostgreSQL implementation of CallRecordStore
pub struct PgCallRecordStore {
    pool: PgPool,
    table: String,
}

impl PgCallRecordStore {
    /// Create a store reading from `table`
    ///
    /// Accepts `name` or `schema.name` made of ASCII letters, digits and
    /// underscores, not starting with a digit.
    pub fn new(pool: PgPool, table: &str) -> AppResult<Self> {
        if !is_valid_table_name(table) {
            return Err(AppError::Config(format!(
                "Invalid call record table name: '{}'",
                table
            )));
        }
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl CallRecordStore for PgCallRecordStore {
    #[instrument(skip(self, filter_numbers), fields(filter_size = filter_numbers.len()))]
    async fn query(
        &self,
        filter_numbers: &BTreeSet<String>,
        window: &DateWindow,
    ) -> AppResult<Vec<CallEvent>> {
        if filter_numbers.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            r#"
            SELECT {columns} FROM {table}
            WHERE calldate >= $1 AND calldate < $2
              AND ({src} OR {clid})
            ORDER BY calldate DESC
            "#,
            columns = CDR_SELECT_COLUMNS,
            table = self.table,
            src = digits_match("src", "$3"),
            clid = digits_match("substring(clid from '<([^>]*)>')", "$3"),
        );

        let filter: Vec<String> = filter_numbers.iter().cloned().collect();
        let rows = sqlx::query_as::<sqlx::Postgres, CallEventRow>(&query)
            .bind(window.start_bound())
            .bind(window.end_bound())
            .bind(filter)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error querying call log: {}", e);
                AppError::CallStore(format!("Failed to query call log: {}", e))
            })?;

        debug!("Call log returned {} calls", rows.len());
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Calls from or to any form of `number`, not only those it placed
    #[instrument(skip(self, number), fields(number = number.digits()))]
    async fn list_for_number(
        &self,
        number: &NormalizedNumber,
        window: &DateWindow,
        limit: i64,
    ) -> AppResult<Vec<CallEvent>> {
        if number.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            r#"
            SELECT {columns} FROM {table}
            WHERE calldate >= $1 AND calldate < $2
              AND ({src} OR {dst})
            ORDER BY calldate DESC
            LIMIT $4
            "#,
            columns = CDR_SELECT_COLUMNS,
            table = self.table,
            src = digits_match("src", "$3"),
            dst = digits_match("dst", "$3"),
        );

        let variants: Vec<String> = number.variants().iter().cloned().collect();
        let rows = sqlx::query_as::<sqlx::Postgres, CallEventRow>(&query)
            .bind(window.start_bound())
            .bind(window.end_bound())
            .bind(variants)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing calls for number: {}", e);
                AppError::CallStore(format!("Failed to list calls: {}", e))
            })?;

        debug!("Found {} calls", rows.len());
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// SQL predicate: digits of `expr`, or their local tail, are in array `param`
fn digits_match(expr: &str, param: &str) -> String {
    let digits = format!("regexp_replace(COALESCE({}, ''), '\\D', '', 'g')", expr);
    format!(
        "({digits} = ANY({param}) OR right({digits}, {tail}) = ANY({param}))",
        digits = digits,
        param = param,
        tail = LOCAL_NUMBER_DIGITS,
    )
}

fn is_valid_table_name(name: &str) -> bool {
    let mut parts = 0;
    for part in name.split('.') {
        parts += 1;
        let mut chars = part.chars();
        let valid_start = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return false;
        }
    }
    parts <= 2
}

/// Helper struct for mapping database rows to domain model
#[derive(Debug, sqlx::FromRow)]
struct CallEventRow {
    calldate: NaiveDateTime,
    clid: Option<String>,
    src: Option<String>,
    dst: Option<String>,
    duration: Option<i32>,
    billsec: Option<i32>,
    disposition: Option<String>,
    recordingfile: Option<String>,
    uniqueid: Option<String>,
}

impl From<CallEventRow> for CallEvent {
    fn from(row: CallEventRow) -> Self {
        Self {
            calldate: row.calldate,
            clid: row.clid.unwrap_or_default(),
            src: row.src.unwrap_or_default(),
            dst: row.dst.unwrap_or_default(),
            duration: row.duration.unwrap_or_default(),
            billsec: row.billsec,
            disposition: Disposition::parse(row.disposition.as_deref().unwrap_or_default()),
            recording_file: row.recordingfile.filter(|f| !f.is_empty()),
            uniqueid: row.uniqueid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_table_name_validation() {
        assert!(is_valid_table_name("cdr"));
        assert!(is_valid_table_name("asteriskcdrdb.cdr"));
        assert!(is_valid_table_name("_cdr_2024"));
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("2024cdr"));
        assert!(!is_valid_table_name("cdr; DROP TABLE cdr"));
        assert!(!is_valid_table_name("a.b.c"));
        assert!(!is_valid_table_name("cdr."));
    }

    #[test]
    fn test_digits_match_uses_array_parameter() {
        let sql = digits_match("src", "$3");
        assert!(sql.contains("= ANY($3)"));
        assert!(sql.contains("right("));
        assert!(sql.contains(", 9)"));
    }

    #[test]
    fn test_call_event_row_conversion() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let row = CallEventRow {
            calldate: at,
            clid: Some("\"Nino\" <995555123456>".to_string()),
            src: None,
            dst: Some("555987654".to_string()),
            duration: Some(40),
            billsec: Some(32),
            disposition: Some("ANSWERED".to_string()),
            recordingfile: Some(String::new()),
            uniqueid: Some("1705312800.42".to_string()),
        };

        let call: CallEvent = row.into();
        assert_eq!(call.src, "");
        assert_eq!(call.caller_numbers(), vec!["995555123456"]);
        assert_eq!(call.disposition, Disposition::Answered);
        assert_eq!(call.talk_seconds(), 32);
        assert!(call.recording_file.is_none());
    }

    #[tokio::test]
    #[ignore] // Requires database with a cdr table
    async fn test_query_empty_filter_returns_nothing() {
        let database_url = std::env::var("CDR_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/asteriskcdrdb".to_string());
        let pool = crate::create_pool(&database_url, Some(2)).await.unwrap();
        let store = PgCallRecordStore::new(pool, DEFAULT_CDR_TABLE).unwrap();
        let window = DateWindow::parse("2024-01-01", "2024-01-31").unwrap();

        let calls = store.query(&BTreeSet::new(), &window).await.unwrap();
        assert!(calls.is_empty());
    }
}
