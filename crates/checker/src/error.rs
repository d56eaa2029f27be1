use doccheck_core::types::DbId;
use doccheck_tainacan::TainacanError;

#[derive(Debug, thiserror::Error)]
pub enum CheckerError {
    #[error("Invalid item ID: {0}")]
    InvalidItem(DbId),

    #[error("Invalid collection ID.")]
    InvalidCollection,

    /// The collection listing could not be fetched.
    #[error(transparent)]
    Source(#[from] TainacanError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored settings are malformed: {0}")]
    Settings(#[from] serde_json::Error),
}
