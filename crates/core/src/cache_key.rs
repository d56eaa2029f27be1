//! Cache key scheme for batch results.
//!
//! Every key the checker writes starts with [`CACHE_PREFIX`], so a full
//! clear is a single prefix delete.

use crate::types::DbId;

/// Prefix shared by every cache entry owned by the checker.
pub const CACHE_PREFIX: &str = "tcd_";

/// Prefix shared by every cached batch page.
pub const BATCH_PREFIX: &str = "tcd_batch_";

/// Key for one cached page of a collection check.
pub fn batch_cache_key(collection_id: DbId, page: u32, per_page: u32) -> String {
    format!("{BATCH_PREFIX}{collection_id}_{page}_{per_page}")
}

/// Prefix matching every cached page of one collection, whatever the paging.
pub fn batch_collection_prefix(collection_id: DbId) -> String {
    format!("{BATCH_PREFIX}{collection_id}_")
}
