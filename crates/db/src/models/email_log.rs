//! Email audit trail models (append-only).

use doccheck_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const EMAIL_TYPE_SINGLE: &str = "single";
pub const EMAIL_TYPE_BATCH: &str = "batch";

pub const EMAIL_STATUS_SENT: &str = "sent";
pub const EMAIL_STATUS_FAILED: &str = "failed";

/// Default page size for email log listings.
pub const DEFAULT_LOG_LIMIT: i64 = 50;

/// Largest page size accepted for email log listings.
pub const MAX_LOG_LIMIT: i64 = 500;

/// One send attempt. Never updated after insert.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmailLog {
    pub id: DbId,
    pub user_id: DbId,
    /// `0` for grouped batch messages.
    pub item_id: DbId,
    pub email_type: String,
    pub subject: String,
    pub status: String,
    pub sent_date: Timestamp,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateEmailLog {
    pub user_id: DbId,
    pub item_id: DbId,
    pub email_type: &'static str,
    pub subject: String,
    pub status: &'static str,
    pub sent_date: Timestamp,
    pub error_message: Option<String>,
}

/// Filter parameters for listing email logs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailLogQuery {
    pub user_id: Option<DbId>,
    pub item_id: Option<DbId>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Aggregate counters over a time window.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct EmailStats {
    pub total_emails: i64,
    pub sent_emails: i64,
    pub failed_emails: i64,
    pub single_emails: i64,
    pub batch_emails: i64,
}
