//! Handlers for the batch result cache.

use axum::extract::State;
use axum::{Form, Json};
use doccheck_db::models::cache_entry::CacheStats;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::form::absint;
use crate::middleware::nonce::require_nonce;
use crate::middleware::rbac::RequireAdmin;
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NonceForm {
    pub nonce: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemSavedForm {
    pub nonce: Option<String>,
    pub item_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub cleared: u64,
}

/// POST /api/v1/cache/clear
pub async fn clear(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<NonceForm>,
) -> AppResult<Json<ApiResponse<ClearResponse>>> {
    require_nonce(&state, &user, form.nonce.as_deref())?;

    let cleared = state.checker.clear_all_caches().await?;
    Ok(ok(ClearResponse {
        message: format!("Cache cleared successfully. {cleared} entries removed."),
        cleared,
    }))
}

/// GET /api/v1/cache/stats
pub async fn stats(
    RequireAdmin(_user): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CacheStats>>> {
    Ok(ok(state.checker.cache_stats().await?))
}

/// POST /api/v1/cache/item-saved
///
/// Called by the site when an item is saved. Drops the cached pages of
/// the item's collection unless clearing on save is switched off.
pub async fn item_saved(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<ItemSavedForm>,
) -> AppResult<Json<ApiResponse<ClearResponse>>> {
    require_nonce(&state, &user, form.nonce.as_deref())?;

    let item_id = absint(form.item_id.as_deref());
    let settings = state.settings.load().await?;
    let cleared = if settings.clear_cache_on_save && item_id > 0 {
        state.checker.clear_item_cache(item_id).await?
    } else {
        0
    };

    Ok(ok(ClearResponse {
        message: format!("Cache cleared successfully. {cleared} entries removed."),
        cleared,
    }))
}
