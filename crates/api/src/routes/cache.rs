//! Route definitions for the `/cache` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::cache;
use crate::state::AppState;

/// Routes mounted at `/cache`.
///
/// ```text
/// POST /clear       -> clear
/// GET  /stats       -> stats
/// POST /item-saved  -> item_saved
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clear", post(cache::clear))
        .route("/stats", get(cache::stats))
        .route("/item-saved", post(cache::item_saved))
}
