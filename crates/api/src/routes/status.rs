use axum::routing::get;
use axum::Router;

use crate::handlers::status;
use crate::state::AppState;

/// Public routes mounted at `/status`.
///
/// ```text
/// GET /{item_id}  -> item_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{item_id}", get(status::item_status))
}
