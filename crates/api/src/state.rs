use std::sync::Arc;

use doccheck_checker::{DocumentChecker, SettingsStore};
use doccheck_core::settings::CheckerSettings;
use doccheck_db::DbPool;
use doccheck_notify::{Mailer, Notifier};
use doccheck_tainacan::ItemSource;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; the services hold the pool and `Arc`s internally.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<ServerConfig>,
    pub checker: DocumentChecker,
    pub notifier: Notifier,
    pub settings: SettingsStore,
}

impl AppState {
    /// Wire the services over one pool, item source and mailer.
    pub fn new(
        pool: DbPool,
        config: ServerConfig,
        source: Arc<dyn ItemSource>,
        mailer: Arc<dyn Mailer>,
        default_settings: CheckerSettings,
    ) -> Self {
        let checker = DocumentChecker::new(pool.clone(), Arc::clone(&source));
        let notifier = Notifier::new(pool.clone(), source, mailer, config.site.clone());
        let settings = SettingsStore::new(pool.clone(), default_settings);
        Self {
            pool,
            config: Arc::new(config),
            checker,
            notifier,
            settings,
        }
    }
}
