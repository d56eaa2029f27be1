//! Single-item and batch document checks over a remote [`ItemSource`].
//!
//! [`ItemSource`]: doccheck_tainacan::ItemSource

/// Emit at `info` when debug mode is on, otherwise at `debug`.
macro_rules! diag {
    ($debug:expr, $($arg:tt)+) => {
        if $debug {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

pub mod checker;
pub mod error;
pub mod settings_store;

pub use checker::{DocumentChecker, DEFAULT_HISTORY_LIMIT};
pub use error::CheckerError;
pub use settings_store::SettingsStore;
