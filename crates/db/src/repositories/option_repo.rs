//! Repository for the `options` key/value table.

use doccheck_core::types::Timestamp;
use sqlx::SqlitePool;

pub struct OptionRepo;

impl OptionRepo {
    pub async fn get(pool: &SqlitePool, name: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT value FROM options WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Insert or overwrite an option value.
    pub async fn set(
        pool: &SqlitePool,
        name: &str,
        value: &str,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO options (name, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT (name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(name)
        .bind(value)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &SqlitePool, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM options WHERE name = ?")
            .bind(name)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
