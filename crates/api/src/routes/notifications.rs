//! Route definitions for the `/notifications` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notifications;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// POST /send   -> send
/// POST /test   -> test_email
/// POST /logs   -> logs
/// GET  /stats  -> stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send", post(notifications::send))
        .route("/test", post(notifications::test_email))
        .route("/logs", post(notifications::logs))
        .route("/stats", get(notifications::stats))
}
