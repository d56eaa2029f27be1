//! Repository for the `document_emails` table.

use doccheck_core::types::Timestamp;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::email_log::{
    CreateEmailLog, EmailLog, EmailLogQuery, EmailStats, DEFAULT_LOG_LIMIT, MAX_LOG_LIMIT,
};

/// Column list for `document_emails` SELECT queries.
const COLUMNS: &str = "\
    id, user_id, item_id, email_type, subject, status, sent_date, error_message";

/// Provides the append and reporting operations for the email log.
pub struct EmailLogRepo;

impl EmailLogRepo {
    pub async fn insert(pool: &SqlitePool, input: &CreateEmailLog) -> Result<EmailLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO document_emails \
                (user_id, item_id, email_type, subject, status, sent_date, error_message) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailLog>(&query)
            .bind(input.user_id)
            .bind(input.item_id)
            .bind(input.email_type)
            .bind(&input.subject)
            .bind(input.status)
            .bind(input.sent_date)
            .bind(&input.error_message)
            .fetch_one(pool)
            .await
    }

    /// List log entries, newest first, with optional filters.
    pub async fn list(
        pool: &SqlitePool,
        params: &EmailLogQuery,
    ) -> Result<Vec<EmailLog>, sqlx::Error> {
        let limit = params
            .limit
            .unwrap_or(DEFAULT_LOG_LIMIT)
            .clamp(1, MAX_LOG_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM document_emails WHERE 1 = 1"));

        if let Some(user_id) = params.user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(item_id) = params.item_id {
            qb.push(" AND item_id = ").push_bind(item_id);
        }
        if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND status = ").push_bind(status.to_string());
        }

        qb.push(" ORDER BY sent_date DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        qb.build_query_as::<EmailLog>().fetch_all(pool).await
    }

    /// Counters for attempts made at or after `since`.
    pub async fn stats_since(
        pool: &SqlitePool,
        since: Timestamp,
    ) -> Result<EmailStats, sqlx::Error> {
        sqlx::query_as::<_, EmailStats>(
            "SELECT \
                COUNT(*) AS total_emails, \
                COALESCE(SUM(CASE WHEN status = 'sent' THEN 1 ELSE 0 END), 0) AS sent_emails, \
                COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0) AS failed_emails, \
                COALESCE(SUM(CASE WHEN email_type = 'single' THEN 1 ELSE 0 END), 0) AS single_emails, \
                COALESCE(SUM(CASE WHEN email_type = 'batch' THEN 1 ELSE 0 END), 0) AS batch_emails \
             FROM document_emails \
             WHERE sent_date >= ?",
        )
        .bind(since)
        .fetch_one(pool)
        .await
    }
}
