pub mod auth;
pub mod cache;
pub mod checks;
pub mod health;
pub mod notifications;
pub mod settings;
pub mod status;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                      login (public)
/// /auth/nonce                      issue anti-forgery token
///
/// /checks/item                     check one item (POST)
/// /checks/collection               check one collection page (POST)
/// /checks/history                  item check history (POST)
///
/// /cache/clear                     drop every cached entry (POST)
/// /cache/stats                     cache counters
/// /cache/item-saved                drop an item's batch pages (POST)
///
/// /notifications/send              notify owners (POST)
/// /notifications/test              send a test email (POST)
/// /notifications/logs              email log listing (POST)
/// /notifications/stats             email counters
///
/// /settings                        get, update
///
/// /status/{item_id}                latest recorded check (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/checks", checks::router())
        .nest("/cache", cache::router())
        .nest("/notifications", notifications::router())
        .nest("/settings", settings::router())
        .nest("/status", status::router())
}
