//! Repository for the `cache_entries` TTL table.
//!
//! Prefix matching uses `substr` rather than `LIKE` because cache keys
//! contain underscores, which `LIKE` treats as wildcards. `expires_at` is
//! stored in Unix milliseconds.

use doccheck_core::types::Timestamp;
use sqlx::SqlitePool;

use crate::models::cache_entry::CacheStats;

pub struct CacheRepo;

impl CacheRepo {
    /// Stored value for `key` if it has not expired at `now`.
    pub async fn get_fresh(
        pool: &SqlitePool,
        key: &str,
        now: Timestamp,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT value FROM cache_entries WHERE key = ? AND expires_at > ?",
        )
        .bind(key)
        .bind(now.timestamp_millis())
        .fetch_optional(pool)
        .await
    }

    /// Insert or overwrite `key`, valid until `now + ttl_secs`.
    pub async fn put(
        pool: &SqlitePool,
        key: &str,
        value: &str,
        now: Timestamp,
        ttl_secs: u64,
    ) -> Result<(), sqlx::Error> {
        let ttl_ms = i64::try_from(ttl_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        let expires_at = now.timestamp_millis().saturating_add(ttl_ms);
        sqlx::query(
            "INSERT INTO cache_entries (key, value, expires_at) VALUES (?, ?, ?) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Returns `true` if the key existed.
    pub async fn delete_key(pool: &SqlitePool, key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every entry whose key starts with `prefix`, expired or not.
    pub async fn delete_prefix(pool: &SqlitePool, prefix: &str) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM cache_entries WHERE substr(key, 1, length(?1)) = ?1")
                .bind(prefix)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Drop entries that expired before `now`.
    pub async fn purge_expired(pool: &SqlitePool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= ?")
            .bind(now.timestamp_millis())
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Counters over live entries under `prefix`; `batch_prefix` selects the
    /// batch subset.
    pub async fn stats(
        pool: &SqlitePool,
        prefix: &str,
        batch_prefix: &str,
        now: Timestamp,
    ) -> Result<CacheStats, sqlx::Error> {
        sqlx::query_as::<_, CacheStats>(
            "SELECT \
                COALESCE(SUM(CASE WHEN substr(key, 1, length(?2)) = ?2 THEN 1 ELSE 0 END), 0) \
                    AS batch_caches, \
                COUNT(*) AS total_caches, \
                COALESCE(SUM(length(value)), 0) AS cache_size \
             FROM cache_entries \
             WHERE substr(key, 1, length(?1)) = ?1 AND expires_at > ?3",
        )
        .bind(prefix)
        .bind(batch_prefix)
        .bind(now.timestamp_millis())
        .fetch_one(pool)
        .await
    }
}
