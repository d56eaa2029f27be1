//! Repository for the `document_checks` table.

use doccheck_core::types::DbId;
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::models::document_check::{CreateDocumentCheck, DocumentCheck};

/// Column list for `document_checks` SELECT queries.
const COLUMNS: &str = "\
    id, item_id, collection_id, check_type, status, \
    missing_documents, found_documents, invalid_documents, check_date";

/// Default number of history rows returned for an item.
pub const DEFAULT_HISTORY_LIMIT: i64 = 10;

/// Provides insert and history queries for check results.
pub struct CheckRepo;

impl CheckRepo {
    /// Append a history row, returning it as stored.
    pub async fn insert(
        pool: &SqlitePool,
        input: &CreateDocumentCheck,
    ) -> Result<DocumentCheck, sqlx::Error> {
        let query = format!(
            "INSERT INTO document_checks \
                (item_id, collection_id, check_type, status, \
                 missing_documents, found_documents, invalid_documents, check_date) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocumentCheck>(&query)
            .bind(input.item_id)
            .bind(input.collection_id)
            .bind(input.check_type)
            .bind(input.status.as_str())
            .bind(Json(&input.missing_documents))
            .bind(Json(&input.found_documents))
            .bind(Json(&input.invalid_documents))
            .bind(input.check_date)
            .fetch_one(pool)
            .await
    }

    /// Most recent checks for an item, newest first.
    pub async fn history_for_item(
        pool: &SqlitePool,
        item_id: DbId,
        limit: i64,
    ) -> Result<Vec<DocumentCheck>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM document_checks \
             WHERE item_id = ? \
             ORDER BY check_date DESC, id DESC \
             LIMIT ?"
        );
        sqlx::query_as::<_, DocumentCheck>(&query)
            .bind(item_id)
            .bind(limit.max(1))
            .fetch_all(pool)
            .await
    }

    /// The latest recorded check for an item, if any.
    pub async fn latest_for_item(
        pool: &SqlitePool,
        item_id: DbId,
    ) -> Result<Option<DocumentCheck>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM document_checks \
             WHERE item_id = ? \
             ORDER BY check_date DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, DocumentCheck>(&query)
            .bind(item_id)
            .fetch_optional(pool)
            .await
    }

    /// Number of history rows for an item.
    pub async fn count_for_item(pool: &SqlitePool, item_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM document_checks WHERE item_id = ?")
            .bind(item_id)
            .fetch_one(pool)
            .await
    }
}
