use std::sync::Arc;

use chrono::Utc;
use doccheck_core::attachment::attachments_from_values;
use doccheck_core::cache_key::{
    batch_cache_key, batch_collection_prefix, BATCH_PREFIX, CACHE_PREFIX,
};
use doccheck_core::check::{
    clamp_page, clamp_per_page, evaluate_attachments, BatchItem, BatchResult, BatchSummary,
    CheckResult, CheckStatus, CHECK_TYPE_BATCH, CHECK_TYPE_INDIVIDUAL,
};
use doccheck_core::settings::CheckerSettings;
use doccheck_core::types::DbId;
use doccheck_db::models::cache_entry::CacheStats;
use doccheck_db::models::document_check::{CreateDocumentCheck, DocumentCheck};
use doccheck_db::repositories::{CacheRepo, CheckRepo};
use doccheck_db::DbPool;
use doccheck_tainacan::ItemSource;
use serde_json::{json, Value};

use crate::error::CheckerError;

pub use doccheck_db::repositories::check_repo::DEFAULT_HISTORY_LIMIT;

/// Runs document checks and owns the history and batch cache.
///
/// Stateless between calls apart from the database; settings are passed in
/// per call so changes apply to the next request.
#[derive(Clone)]
pub struct DocumentChecker {
    pool: DbPool,
    source: Arc<dyn ItemSource>,
}

impl DocumentChecker {
    pub fn new(pool: DbPool, source: Arc<dyn ItemSource>) -> Self {
        Self { pool, source }
    }

    // -----------------------------------------------------------------------
    // Single item
    // -----------------------------------------------------------------------

    /// Check one item and record the result as an individual check.
    ///
    /// A failed fetch yields an `error` result that is returned but never
    /// persisted.
    pub async fn check_item(
        &self,
        item_id: DbId,
        settings: &CheckerSettings,
    ) -> Result<CheckResult, CheckerError> {
        if item_id <= 0 {
            return Err(CheckerError::InvalidItem(item_id));
        }
        Ok(self
            .run_check(item_id, None, CHECK_TYPE_INDIVIDUAL, settings)
            .await)
    }

    async fn run_check(
        &self,
        item_id: DbId,
        collection_id: Option<DbId>,
        check_type: &'static str,
        settings: &CheckerSettings,
    ) -> CheckResult {
        let debug = settings.debug_mode;
        let api_url = self.source.attachments_url(item_id);
        diag!(debug, item_id, url = %api_url, "Checking item documents");

        let raw = match self.source.item_attachments(item_id).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(item_id, error = %e, "Attachment fetch failed");
                let mut result = CheckResult::error(item_id, e.to_string(), Utc::now());
                if debug {
                    result.debug = Some(json!({
                        "api_url": api_url,
                        "error_code": e.code(),
                    }));
                }
                return result;
            }
        };

        let attachments = attachments_from_values(&raw);
        let mut result = evaluate_attachments(
            item_id,
            &settings.required_documents,
            &attachments,
            Utc::now(),
        );
        result.total_attachments = raw.len();

        diag!(
            debug,
            item_id,
            status = %result.status,
            found = ?result.found_documents,
            missing = ?result.missing_documents,
            invalid = ?result.invalid_documents,
            "Item check evaluated"
        );

        let row = CreateDocumentCheck::from_result(&result, collection_id, check_type);
        if let Err(e) = CheckRepo::insert(&self.pool, &row).await {
            if debug {
                tracing::warn!(item_id, error = %e, "Failed to record check history");
            } else {
                tracing::debug!(item_id, error = %e, "Failed to record check history");
            }
        }

        if debug {
            let details: Vec<Value> = attachments
                .iter()
                .map(|a| {
                    json!({
                        "name": a.primary_name(),
                        "candidates": a.name_candidates(),
                    })
                })
                .collect();
            result.debug = Some(json!({
                "api_url": api_url,
                "required_documents": settings.required_documents,
                "attachment_details": details,
                "raw_attachments": raw,
            }));
        }

        result
    }

    // -----------------------------------------------------------------------
    // Batch
    // -----------------------------------------------------------------------

    /// Check one page of a collection.
    ///
    /// `collection_id` falls back to the configured default collection. With
    /// caching enabled a fresh cached page is returned as stored, without
    /// touching the remote site. A failed page fetch is an error; failed item
    /// fetches are counted in the summary.
    pub async fn check_collection(
        &self,
        collection_id: Option<DbId>,
        page: Option<i64>,
        per_page: Option<i64>,
        settings: &CheckerSettings,
    ) -> Result<BatchResult, CheckerError> {
        let collection_id = collection_id
            .filter(|&c| c > 0)
            .or(settings.collection_id.filter(|&c| c > 0))
            .ok_or(CheckerError::InvalidCollection)?;
        let page = clamp_page(page);
        let per_page = clamp_per_page(per_page);
        let debug = settings.debug_mode;
        let key = batch_cache_key(collection_id, page, per_page);

        if settings.caching_enabled() {
            if let Some(cached) = self.cached_page(&key).await {
                diag!(debug, collection_id, page, per_page, "Serving batch page from cache");
                return Ok(cached);
            }
        }

        diag!(debug, collection_id, page, per_page, "Fetching collection page");
        let listing = self
            .source
            .collection_items(collection_id, page, per_page)
            .await?;

        let mut summary = BatchSummary::default();
        let mut items_checked = Vec::with_capacity(listing.items.len());
        for item in listing.items {
            let result = self
                .run_check(item.id, Some(collection_id), CHECK_TYPE_BATCH, settings)
                .await;
            summary.record(result.status);
            items_checked.push(BatchItem::from_result(item.title, result));
        }
        for _ in 0..listing.unidentified {
            summary.record(CheckStatus::Error);
        }

        let result = BatchResult {
            collection_id,
            page,
            per_page,
            total_items: listing.total,
            total_pages: listing.total_pages,
            items_checked,
            summary,
            check_date: Utc::now(),
        };

        tracing::info!(
            collection_id,
            page,
            total_pages = result.total_pages,
            complete = result.summary.complete,
            incomplete = result.summary.incomplete,
            error = result.summary.error,
            "Batch page checked"
        );

        if settings.caching_enabled() && !result.items_checked.is_empty() {
            self.store_page(&key, &result, settings.cache_duration_secs)
                .await;
        }

        Ok(result)
    }

    /// Check every page of a collection in order, starting from page one.
    pub async fn check_whole_collection(
        &self,
        collection_id: Option<DbId>,
        per_page: Option<i64>,
        settings: &CheckerSettings,
    ) -> Result<Vec<BatchResult>, CheckerError> {
        let mut pages = Vec::new();
        let mut page = 1_i64;
        loop {
            let result = self
                .check_collection(collection_id, Some(page), per_page, settings)
                .await?;
            let more = result.has_more();
            pages.push(result);
            if !more {
                break;
            }
            page += 1;
        }
        Ok(pages)
    }

    async fn cached_page(&self, key: &str) -> Option<BatchResult> {
        let raw = match CacheRepo::get_fresh(&self.pool, key, Utc::now()).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding malformed cache entry");
                None
            }
        }
    }

    /// Write a page, sweeping expired entries first.
    async fn store_page(&self, key: &str, result: &BatchResult, ttl_secs: u64) {
        let value = match serde_json::to_string(result) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to serialize batch result");
                return;
            }
        };
        let now = Utc::now();
        match CacheRepo::purge_expired(&self.pool, now).await {
            Ok(0) => {}
            Ok(purged) => tracing::debug!(purged, "Purged expired cache entries"),
            Err(e) => tracing::warn!(error = %e, "Cache purge failed"),
        }
        if let Err(e) = CacheRepo::put(&self.pool, key, &value, now, ttl_secs).await {
            tracing::warn!(key, error = %e, "Cache write failed");
        }
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Recent checks for an item, newest first.
    pub async fn item_history(
        &self,
        item_id: DbId,
        limit: Option<i64>,
    ) -> Result<Vec<DocumentCheck>, CheckerError> {
        if item_id <= 0 {
            return Err(CheckerError::InvalidItem(item_id));
        }
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        Ok(CheckRepo::history_for_item(&self.pool, item_id, limit).await?)
    }

    pub async fn latest_check(&self, item_id: DbId) -> Result<Option<DocumentCheck>, CheckerError> {
        if item_id <= 0 {
            return Err(CheckerError::InvalidItem(item_id));
        }
        Ok(CheckRepo::latest_for_item(&self.pool, item_id).await?)
    }

    // -----------------------------------------------------------------------
    // Cache management
    // -----------------------------------------------------------------------

    /// Remove every cache entry the checker owns. Returns the rows removed.
    pub async fn clear_all_caches(&self) -> Result<u64, CheckerError> {
        let removed = CacheRepo::delete_prefix(&self.pool, CACHE_PREFIX).await?;
        tracing::info!(removed, "Cleared all caches");
        Ok(removed)
    }

    /// Drop the cached batch pages that may contain `item_id`.
    ///
    /// When the item's collection cannot be resolved every batch page is
    /// dropped instead.
    pub async fn clear_item_cache(&self, item_id: DbId) -> Result<u64, CheckerError> {
        if item_id <= 0 {
            return Err(CheckerError::InvalidItem(item_id));
        }

        let collection_id = match self.source.item_info(item_id).await {
            Ok(info) => info.collection_id,
            Err(e) => {
                tracing::debug!(item_id, error = %e, "Could not resolve item collection");
                None
            }
        };

        let prefix = match collection_id {
            Some(c) => batch_collection_prefix(c),
            None => BATCH_PREFIX.to_string(),
        };
        let removed = CacheRepo::delete_prefix(&self.pool, &prefix).await?;
        tracing::debug!(item_id, prefix = %prefix, removed, "Cleared item caches");
        Ok(removed)
    }

    pub async fn cache_stats(&self) -> Result<CacheStats, CheckerError> {
        Ok(CacheRepo::stats(&self.pool, CACHE_PREFIX, BATCH_PREFIX, Utc::now()).await?)
    }
}
