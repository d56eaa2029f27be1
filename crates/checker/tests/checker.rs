use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use doccheck_checker::{CheckerError, DocumentChecker, SettingsStore};
use doccheck_core::check::CheckStatus;
use doccheck_core::settings::{CheckerSettings, SettingsUpdate};
use doccheck_core::types::DbId;
use doccheck_db::repositories::{CacheRepo, CheckRepo};
use doccheck_db::{create_memory_pool, DbPool};
use doccheck_tainacan::{ItemInfo, ItemPage, ItemRef, ItemSource, Owner, TainacanError};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Fake remote site
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeSite {
    attachments: HashMap<DbId, Vec<Value>>,
    /// Collection id to the ordered item ids it contains.
    collections: HashMap<DbId, Vec<DbId>>,
    page_fetches: AtomicUsize,
}

impl FakeSite {
    fn item(mut self, id: DbId, names: &[&str]) -> Self {
        let list = names
            .iter()
            .enumerate()
            .map(|(i, n)| json!({ "id": i + 1, "filename": n }))
            .collect();
        self.attachments.insert(id, list);
        self
    }

    fn collection(mut self, id: DbId, items: &[DbId]) -> Self {
        self.collections.insert(id, items.to_vec());
        self
    }

    fn fetches(&self) -> usize {
        self.page_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ItemSource for FakeSite {
    async fn item_attachments(&self, item_id: DbId) -> Result<Vec<Value>, TainacanError> {
        if item_id == 99 {
            return Err(TainacanError::Api {
                code: "http_request_failed".into(),
                message: "Operation timed out after 30000 milliseconds".into(),
            });
        }
        Ok(self.attachments.get(&item_id).cloned().unwrap_or_default())
    }

    async fn collection_items(
        &self,
        collection_id: DbId,
        page: u32,
        per_page: u32,
    ) -> Result<ItemPage, TainacanError> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);
        let ids = self
            .collections
            .get(&collection_id)
            .ok_or(TainacanError::InvalidResponse)?;

        let start = ((page - 1) * per_page) as usize;
        let items = ids
            .iter()
            .skip(start)
            .take(per_page as usize)
            .map(|&id| ItemRef {
                id,
                title: format!("Item {id}"),
            })
            .collect();
        let total = ids.len() as u64;
        Ok(ItemPage {
            items,
            unidentified: 0,
            total,
            total_pages: total.div_ceil(u64::from(per_page)) as u32,
        })
    }

    async fn item_info(&self, item_id: DbId) -> Result<ItemInfo, TainacanError> {
        let collection_id = self
            .collections
            .iter()
            .find(|(_, ids)| ids.contains(&item_id))
            .map(|(c, _)| *c);
        Ok(ItemInfo {
            id: item_id,
            title: format!("Item {item_id}"),
            collection_id,
            ..ItemInfo::default()
        })
    }

    async fn user(&self, _user_id: DbId) -> Result<Option<Owner>, TainacanError> {
        Ok(None)
    }

    fn attachments_url(&self, item_id: DbId) -> String {
        format!("http://fake/tainacan/v2/items/{item_id}/attachments")
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn settings() -> CheckerSettings {
    CheckerSettings {
        required_documents: vec!["documento_identidade".into(), "comprovante_endereco".into()],
        ..CheckerSettings::default()
    }
}

async fn setup(site: FakeSite) -> (DbPool, Arc<FakeSite>, DocumentChecker) {
    let pool = create_memory_pool().await.unwrap();
    let site = Arc::new(site);
    let checker = DocumentChecker::new(pool.clone(), site.clone());
    (pool, site, checker)
}

fn sample_site() -> FakeSite {
    FakeSite::default()
        .item(42, &["DOC_IDENTIDADE.pdf", "recibo.pdf"])
        .item(43, &["documento_identidade.pdf", "comprovante-endereco.jpg"])
        .collection(7, &[42, 43, 44])
}

// ---------------------------------------------------------------------------
// Single item
// ---------------------------------------------------------------------------

#[tokio::test]
async fn item_42_is_incomplete_and_recorded() {
    let (pool, _site, checker) = setup(sample_site()).await;

    let result = checker.check_item(42, &settings()).await.unwrap();
    assert_eq!(result.status, CheckStatus::Incomplete);
    assert_eq!(result.found_documents, vec!["documento_identidade"]);
    assert_eq!(result.missing_documents, vec!["comprovante_endereco"]);
    assert_eq!(result.invalid_documents, vec!["recibo.pdf"]);
    assert_eq!(result.total_attachments, 2);
    assert!(result.debug.is_none());

    let row = CheckRepo::latest_for_item(&pool, 42).await.unwrap().unwrap();
    assert_eq!(row.status, "incomplete");
    assert_eq!(row.check_type, "individual");
    assert_eq!(row.collection_id, None);
    assert_eq!(row.missing_documents.0, vec!["comprovante_endereco"]);
}

#[tokio::test]
async fn fetch_failure_is_returned_but_not_recorded() {
    let (pool, _site, checker) = setup(sample_site()).await;

    let result = checker.check_item(99, &settings()).await.unwrap();
    assert_eq!(result.status, CheckStatus::Error);
    assert!(result.message.as_deref().unwrap_or("").contains("timed out"));
    assert_eq!(CheckRepo::count_for_item(&pool, 99).await.unwrap(), 0);
}

#[tokio::test]
async fn non_positive_ids_are_rejected() {
    let (_pool, _site, checker) = setup(sample_site()).await;
    assert_matches!(
        checker.check_item(0, &settings()).await,
        Err(CheckerError::InvalidItem(0))
    );
    assert_matches!(
        checker.item_history(-3, None).await,
        Err(CheckerError::InvalidItem(-3))
    );
}

#[tokio::test]
async fn repeated_checks_agree() {
    let (pool, _site, checker) = setup(sample_site()).await;

    let first = checker.check_item(42, &settings()).await.unwrap();
    let second = checker.check_item(42, &settings()).await.unwrap();
    assert_eq!(first.status, second.status);
    assert_eq!(first.found_documents, second.found_documents);
    assert_eq!(first.missing_documents, second.missing_documents);
    assert_eq!(first.invalid_documents, second.invalid_documents);

    let history = checker.item_history(42, None).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(CheckRepo::count_for_item(&pool, 42).await.unwrap(), 2);
}

#[tokio::test]
async fn item_without_attachments_misses_everything() {
    let (_pool, _site, checker) = setup(sample_site()).await;

    let result = checker.check_item(500, &settings()).await.unwrap();
    assert_eq!(result.status, CheckStatus::Incomplete);
    assert_eq!(result.missing_documents, settings().required_documents);
    assert!(result.found_documents.is_empty());
    assert!(result.invalid_documents.is_empty());
}

#[tokio::test]
async fn debug_mode_attaches_diagnostics() {
    let (_pool, _site, checker) = setup(sample_site()).await;
    let settings = CheckerSettings {
        debug_mode: true,
        ..settings()
    };

    let result = checker.check_item(42, &settings).await.unwrap();
    let debug = result.debug.unwrap();
    assert_eq!(
        debug["api_url"],
        "http://fake/tainacan/v2/items/42/attachments"
    );
    assert_eq!(debug["raw_attachments"].as_array().unwrap().len(), 2);
    assert_eq!(debug["attachment_details"][1]["name"], "recibo.pdf");
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn collection_page_aggregates_statuses() {
    let site = sample_site().item(44, &[]).collection(8, &[42, 99]);
    let (pool, _site, checker) = setup(site).await;

    let settings = CheckerSettings {
        cache_duration_secs: 0,
        ..settings()
    };
    let result = checker
        .check_collection(Some(7), Some(1), Some(20), &settings)
        .await
        .unwrap();

    assert_eq!(result.total_items, 3);
    assert_eq!(result.total_pages, 1);
    assert!(!result.has_more());
    assert_eq!(result.progress(), 100);
    assert_eq!(result.summary.complete, 1);
    assert_eq!(result.summary.incomplete, 2);
    assert_eq!(
        result.items_checked.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![42, 43, 44]
    );

    let row = CheckRepo::latest_for_item(&pool, 43).await.unwrap().unwrap();
    assert_eq!(row.check_type, "batch");
    assert_eq!(row.collection_id, Some(7));

    let with_error = checker
        .check_collection(Some(8), None, None, &settings)
        .await
        .unwrap();
    assert_eq!(with_error.summary.error, 1);
    assert_eq!(with_error.summary.incomplete, 1);
}

#[tokio::test]
async fn paging_is_clamped_and_reports_more() {
    let (_pool, _site, checker) = setup(sample_site()).await;
    let settings = CheckerSettings {
        cache_duration_secs: 0,
        ..settings()
    };

    let first = checker
        .check_collection(Some(7), Some(0), Some(2), &settings)
        .await
        .unwrap();
    assert_eq!(first.page, 1);
    assert_eq!(first.total_pages, 2);
    assert!(first.has_more());
    assert_eq!(first.progress(), 50);

    let clamped = checker
        .check_collection(Some(7), Some(1), Some(1_000), &settings)
        .await
        .unwrap();
    assert_eq!(clamped.per_page, 100);

    let all = checker
        .check_whole_collection(Some(7), Some(2), &settings)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].items_checked.len(), 1);
}

#[tokio::test]
async fn collection_defaults_to_configured_one() {
    let (_pool, _site, checker) = setup(sample_site()).await;

    assert_matches!(
        checker.check_collection(None, None, None, &settings()).await,
        Err(CheckerError::InvalidCollection)
    );

    let configured = CheckerSettings {
        collection_id: Some(7),
        ..settings()
    };
    let result = checker
        .check_collection(None, None, None, &configured)
        .await
        .unwrap();
    assert_eq!(result.collection_id, 7);
}

#[tokio::test]
async fn page_fetch_failure_is_an_error() {
    let (_pool, _site, checker) = setup(sample_site()).await;
    assert_matches!(
        checker.check_collection(Some(404), None, None, &settings()).await,
        Err(CheckerError::Source(TainacanError::InvalidResponse))
    );
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cached_pages_are_served_verbatim() {
    let (_pool, site, checker) = setup(sample_site()).await;
    let settings = settings();

    let first = checker
        .check_collection(Some(7), Some(1), Some(20), &settings)
        .await
        .unwrap();
    let second = checker
        .check_collection(Some(7), Some(1), Some(20), &settings)
        .await
        .unwrap();

    assert_eq!(site.fetches(), 1);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    let stats = checker.cache_stats().await.unwrap();
    assert_eq!(stats.batch_caches, 1);
    assert_eq!(stats.total_caches, 1);
    assert!(stats.cache_size > 0);

    assert_eq!(checker.clear_all_caches().await.unwrap(), 1);
    checker
        .check_collection(Some(7), Some(1), Some(20), &settings)
        .await
        .unwrap();
    assert_eq!(site.fetches(), 2);
}

#[tokio::test]
async fn cache_expires_after_ttl() {
    let (_pool, site, checker) = setup(sample_site()).await;
    let settings = CheckerSettings {
        cache_duration_secs: 1,
        ..settings()
    };

    checker
        .check_collection(Some(7), None, None, &settings)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2_100)).await;
    checker
        .check_collection(Some(7), None, None, &settings)
        .await
        .unwrap();

    assert_eq!(site.fetches(), 2);
}

#[tokio::test]
async fn storing_a_page_sweeps_expired_entries() {
    let (pool, _site, checker) = setup(sample_site()).await;
    let long_ago = chrono::Utc::now() - chrono::Duration::hours(1);
    CacheRepo::put(&pool, "tcd_batch_99_1_20", "stale", long_ago, 60)
        .await
        .unwrap();

    checker
        .check_collection(Some(7), None, None, &settings())
        .await
        .unwrap();

    let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM cache_entries")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(keys, vec!["tcd_batch_7_1_20".to_string()]);
}

#[tokio::test]
async fn item_cache_clear_targets_its_collection() {
    let site = sample_site().item(70, &[]).collection(70, &[70]);
    let (_pool, site, checker) = setup(site).await;
    let settings = settings();

    checker.check_collection(Some(7), None, None, &settings).await.unwrap();
    checker.check_collection(Some(70), None, None, &settings).await.unwrap();
    assert_eq!(site.fetches(), 2);

    assert_eq!(checker.clear_item_cache(42).await.unwrap(), 1);
    assert_eq!(checker.cache_stats().await.unwrap().batch_caches, 1);

    // An item in no known collection drops every batch page.
    assert_eq!(checker.clear_item_cache(1234).await.unwrap(), 1);
    assert_eq!(checker.cache_stats().await.unwrap().total_caches, 0);
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn settings_round_trip_through_options() {
    let pool = create_memory_pool().await.unwrap();
    let store = SettingsStore::new(pool, settings());

    assert_eq!(store.load().await.unwrap(), settings());
    assert!(store.seed().await.unwrap());
    assert!(!store.seed().await.unwrap());

    let updated = store
        .update(SettingsUpdate {
            required_documents: Some(vec![" rg ".into(), "".into(), "rg".into(), "cpf".into()]),
            cache_duration_secs: Some(0),
            smtp_password: Some("secret".into()),
            ..SettingsUpdate::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.required_documents, vec!["rg", "cpf"]);
    assert!(!updated.caching_enabled());

    let kept = store
        .update(SettingsUpdate {
            smtp_password: Some(String::new()),
            ..SettingsUpdate::default()
        })
        .await
        .unwrap();
    assert_eq!(kept.smtp.password, "secret");
    assert_eq!(store.load().await.unwrap(), kept);
}
