use serde::Serialize;
use sqlx::FromRow;

/// Counters over the live entries of the cache table.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct CacheStats {
    pub batch_caches: i64,
    pub total_caches: i64,
    /// Sum of stored value lengths.
    pub cache_size: i64,
}
