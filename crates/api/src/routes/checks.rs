//! Route definitions for the `/checks` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::checks;
use crate::state::AppState;

/// Routes mounted at `/checks`, all admin-only and nonce-guarded.
///
/// ```text
/// POST /item        -> check_item
/// POST /collection  -> check_collection
/// POST /history     -> history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/item", post(checks::check_item))
        .route("/collection", post(checks::check_collection))
        .route("/history", post(checks::history))
}
