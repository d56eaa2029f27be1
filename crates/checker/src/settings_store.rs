//! Runtime settings persisted as one JSON option row.

use chrono::Utc;
use doccheck_core::settings::{
    normalize_required_documents, CheckerSettings, SettingsUpdate, SETTINGS_OPTION_KEY,
};
use doccheck_db::repositories::OptionRepo;
use doccheck_db::DbPool;

use crate::error::CheckerError;

/// Loads and saves [`CheckerSettings`].
///
/// Until settings are first saved, reads return the startup defaults.
#[derive(Clone)]
pub struct SettingsStore {
    pool: DbPool,
    defaults: CheckerSettings,
}

impl SettingsStore {
    pub fn new(pool: DbPool, defaults: CheckerSettings) -> Self {
        Self { pool, defaults }
    }

    /// Current settings. Fields missing from the stored JSON take their
    /// built-in defaults.
    pub async fn load(&self) -> Result<CheckerSettings, CheckerError> {
        match OptionRepo::get(&self.pool, SETTINGS_OPTION_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(self.defaults.clone()),
        }
    }

    pub async fn save(&self, settings: &CheckerSettings) -> Result<(), CheckerError> {
        let mut settings = settings.clone();
        settings.required_documents =
            normalize_required_documents(&settings.required_documents);
        let raw = serde_json::to_string(&settings)?;
        OptionRepo::set(&self.pool, SETTINGS_OPTION_KEY, &raw, Utc::now()).await?;
        tracing::info!("Settings saved");
        Ok(())
    }

    /// Apply a validated partial update and persist the result.
    pub async fn update(&self, update: SettingsUpdate) -> Result<CheckerSettings, CheckerError> {
        let mut settings = self.load().await?;
        update.apply(&mut settings);
        self.save(&settings).await?;
        Ok(settings)
    }

    /// Write the startup defaults if nothing has been saved yet.
    pub async fn seed(&self) -> Result<bool, CheckerError> {
        if OptionRepo::get(&self.pool, SETTINGS_OPTION_KEY).await?.is_some() {
            return Ok(false);
        }
        self.save(&self.defaults).await?;
        Ok(true)
    }
}
