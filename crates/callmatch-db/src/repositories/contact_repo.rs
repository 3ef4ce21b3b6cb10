//! Contact batch repository implementation
//!
//! Stores uploaded contact rows and the call fields written back by
//! reconciliation.

use callmatch_core::{
    models::{
        AuthContext, ContactPhone, ContactRow, Permission, ReconciliationStatus, UploadPolicy,
    },
    traits::ContactRepository,
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};

/// PostgreSQL implementation of ContactRepository
pub struct PgContactRepository {
    pool: PgPool,
}

impl PgContactRepository {
    /// Create a new contact repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CONTACT_SELECT_COLUMNS: &str = r#"
    id, company_name, identification_code,
    contact_person1, tel1, contact_person2, tel2, contact_person3, tel3,
    caller_name, caller_number, receiver_name, receiver_number,
    call_count, answered_calls, no_answer_calls, busy_calls,
    call_date, call_date_backfilled, cdr_call_date, call_duration, call_status,
    reconciliation
"#;

const SEARCH_CONDITION: &str = r#"
    ($1::text IS NULL
     OR company_name ILIKE $1
     OR identification_code ILIKE $1
     OR caller_name ILIKE $1
     OR caller_number ILIKE $1
     OR receiver_name ILIKE $1)
"#;

/// `%text%` with LIKE wildcards in `text` escaped
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    #[instrument(skip(self, ctx, rows), fields(user = %ctx.username, rows = rows.len()))]
    async fn replace_batch(
        &self,
        ctx: &AuthContext,
        rows: &[ContactRow],
        policy: UploadPolicy,
    ) -> AppResult<usize> {
        ctx.require(Permission::UploadContacts)?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to begin upload transaction: {}", e);
            AppError::Transaction(format!("Failed to begin transaction: {}", e))
        })?;

        if policy.truncates_existing() {
            debug!("Clearing previous batch");
            sqlx::query("TRUNCATE caller_contacts RESTART IDENTITY")
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    error!("Database error clearing contacts: {}", e);
                    AppError::Database(format!("Failed to clear contacts: {}", e))
                })?;
        }

        for row in rows {
            let [c1, c2, c3] = &row.contacts;
            sqlx::query(
                r#"
                INSERT INTO caller_contacts (
                    company_name, identification_code,
                    contact_person1, tel1, contact_person2, tel2, contact_person3, tel3,
                    caller_name, caller_number, receiver_name, receiver_number,
                    call_count, answered_calls, no_answer_calls, busy_calls,
                    call_date, call_date_backfilled, cdr_call_date, call_duration, call_status,
                    reconciliation, uploaded_by, department
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                        $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
                "#,
            )
            .bind(&row.company_name)
            .bind(&row.identification_code)
            .bind(&c1.person)
            .bind(&c1.phone)
            .bind(&c2.person)
            .bind(&c2.phone)
            .bind(&c3.person)
            .bind(&c3.phone)
            .bind(&row.caller_name)
            .bind(&row.caller_number)
            .bind(&row.receiver_name)
            .bind(&row.receiver_number)
            .bind(row.call_count)
            .bind(row.answered_calls)
            .bind(row.no_answer_calls)
            .bind(row.busy_calls)
            .bind(&row.call_date)
            .bind(row.call_date_backfilled)
            .bind(row.cdr_call_date)
            .bind(&row.call_duration)
            .bind(&row.call_status)
            .bind(row.reconciliation.as_str())
            .bind(&ctx.username)
            .bind(&ctx.department)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Database error inserting contact: {}", e);
                AppError::Database(format!("Failed to insert contact: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit upload: {}", e);
            AppError::Transaction(format!("Failed to commit upload: {}", e))
        })?;

        info!(policy = ?policy, "Stored {} contact rows", rows.len());
        Ok(rows.len())
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<ContactRow>, i64)> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let count_query = format!("SELECT COUNT(*) FROM caller_contacts WHERE {}", SEARCH_CONDITION);
        let total: (i64,) = sqlx::query_as(&count_query)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting contacts: {}", e);
                AppError::Database(format!("Failed to count contacts: {}", e))
            })?;

        let data_query = format!(
            "SELECT {} FROM caller_contacts WHERE {} ORDER BY id LIMIT $2 OFFSET $3",
            CONTACT_SELECT_COLUMNS, SEARCH_CONDITION
        );
        let rows = sqlx::query_as::<sqlx::Postgres, ContactRecord>(&data_query)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing contacts: {}", e);
                AppError::Database(format!("Failed to fetch contacts: {}", e))
            })?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> AppResult<Vec<ContactRow>> {
        let query = format!(
            "SELECT {} FROM caller_contacts ORDER BY id",
            CONTACT_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, ContactRecord>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error loading contacts: {}", e);
                AppError::Database(format!("Failed to fetch contacts: {}", e))
            })?;

        debug!("Loaded {} contact rows", rows.len());
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn save_reconciled(&self, rows: &[ContactRow]) -> AppResult<usize> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to begin save transaction: {}", e);
            AppError::Transaction(format!("Failed to begin transaction: {}", e))
        })?;

        let mut updated = 0usize;
        for row in rows {
            let Some(id) = row.id else { continue };

            let result = sqlx::query(
                r#"
                UPDATE caller_contacts
                SET receiver_name = $2,
                    receiver_number = $3,
                    call_count = $4,
                    answered_calls = $5,
                    no_answer_calls = $6,
                    busy_calls = $7,
                    call_date = $8,
                    call_date_backfilled = $9,
                    cdr_call_date = $10,
                    call_duration = $11,
                    call_status = $12,
                    reconciliation = $13,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(&row.receiver_name)
            .bind(&row.receiver_number)
            .bind(row.call_count)
            .bind(row.answered_calls)
            .bind(row.no_answer_calls)
            .bind(row.busy_calls)
            .bind(&row.call_date)
            .bind(row.call_date_backfilled)
            .bind(row.cdr_call_date)
            .bind(&row.call_duration)
            .bind(&row.call_status)
            .bind(row.reconciliation.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Database error saving contact {}: {}", id, e);
                AppError::Database(format!("Failed to save contact: {}", e))
            })?;

            updated += result.rows_affected() as usize;
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit reconciled rows: {}", e);
            AppError::Transaction(format!("Failed to commit: {}", e))
        })?;

        info!("Saved {} reconciled rows", updated);
        Ok(updated)
    }
}

/// Helper struct for mapping database rows to domain model
#[derive(Debug, sqlx::FromRow)]
struct ContactRecord {
    id: i64,
    company_name: String,
    identification_code: String,
    contact_person1: Option<String>,
    tel1: Option<String>,
    contact_person2: Option<String>,
    tel2: Option<String>,
    contact_person3: Option<String>,
    tel3: Option<String>,
    caller_name: Option<String>,
    caller_number: Option<String>,
    receiver_name: Option<String>,
    receiver_number: Option<String>,
    call_count: Option<i64>,
    answered_calls: Option<i64>,
    no_answer_calls: Option<i64>,
    busy_calls: Option<i64>,
    call_date: Option<String>,
    call_date_backfilled: bool,
    cdr_call_date: Option<NaiveDateTime>,
    call_duration: Option<String>,
    call_status: Option<String>,
    reconciliation: String,
}

impl From<ContactRecord> for ContactRow {
    fn from(row: ContactRecord) -> Self {
        Self {
            id: Some(row.id),
            company_name: row.company_name,
            identification_code: row.identification_code,
            contacts: [
                ContactPhone {
                    person: row.contact_person1,
                    phone: row.tel1,
                },
                ContactPhone {
                    person: row.contact_person2,
                    phone: row.tel2,
                },
                ContactPhone {
                    person: row.contact_person3,
                    phone: row.tel3,
                },
            ],
            caller_name: row.caller_name,
            caller_number: row.caller_number,
            receiver_name: row.receiver_name,
            receiver_number: row.receiver_number,
            call_count: row.call_count,
            answered_calls: row.answered_calls,
            no_answer_calls: row.no_answer_calls,
            busy_calls: row.busy_calls,
            call_date: row.call_date,
            call_date_backfilled: row.call_date_backfilled,
            cdr_call_date: row.cdr_call_date,
            call_duration: row.call_duration,
            call_status: row.call_status,
            reconciliation: ReconciliationStatus::parse(&row.reconciliation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callmatch_core::models::UserRole;

    fn record() -> ContactRecord {
        ContactRecord {
            id: 7,
            company_name: "Acme LLC".to_string(),
            identification_code: "404000111".to_string(),
            contact_person1: Some("Levan".to_string()),
            tel1: Some("555987654".to_string()),
            contact_person2: None,
            tel2: None,
            contact_person3: None,
            tel3: Some("".to_string()),
            caller_name: Some("Nino".to_string()),
            caller_number: Some("555123456".to_string()),
            receiver_name: None,
            receiver_number: None,
            call_count: None,
            answered_calls: None,
            no_answer_calls: None,
            busy_calls: None,
            call_date: Some("2024-01-02".to_string()),
            call_date_backfilled: false,
            cdr_call_date: None,
            call_duration: None,
            call_status: None,
            reconciliation: "pending".to_string(),
        }
    }

    #[test]
    fn test_contact_record_conversion() {
        let row: ContactRow = record().into();
        assert_eq!(row.id, Some(7));
        assert_eq!(row.contacts[0].phone_str(), "555987654");
        assert_eq!(row.contacts[1].phone_str(), "");
        assert_eq!(row.caller_str(), "555123456");
        assert!(row.call_count.is_none());
        assert!(!row.call_date_backfilled);
        assert_eq!(row.reconciliation, ReconciliationStatus::Pending);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("acme"), "%acme%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_replace_then_append() {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/callmatch".to_string());
        let pool = crate::create_pool(&database_url, Some(2)).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        let repo = PgContactRepository::new(pool);
        let ctx = AuthContext::new("tester", UserRole::Operator, None);
        let row: ContactRow = ContactRow {
            id: None,
            ..record().into()
        };

        repo.replace_batch(&ctx, &[row.clone(), row.clone()], UploadPolicy::Replace)
            .await
            .unwrap();
        repo.replace_batch(&ctx, &[row], UploadPolicy::Append)
            .await
            .unwrap();

        let (rows, total) = repo.list(Some("acme"), 10, 0).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_save_reconciled_keeps_backfill_flag() {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/callmatch".to_string());
        let pool = crate::create_pool(&database_url, Some(2)).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        let repo = PgContactRepository::new(pool);
        let ctx = AuthContext::new("tester", UserRole::Operator, None);
        let row = ContactRow {
            id: None,
            call_date: None,
            ..record().into()
        };
        repo.replace_batch(&ctx, &[row], UploadPolicy::Replace)
            .await
            .unwrap();

        let mut stored = repo.find_all().await.unwrap();
        stored[0].call_date = Some("2024-01-12 14:00:00".to_string());
        stored[0].call_date_backfilled = true;
        assert_eq!(repo.save_reconciled(&stored).await.unwrap(), 1);

        let reloaded = repo.find_all().await.unwrap();
        assert!(reloaded[0].call_date_backfilled);
        assert!(!reloaded[0].has_call_date());
    }
}
