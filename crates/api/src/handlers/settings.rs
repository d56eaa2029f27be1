//! Handlers for runtime settings.

use axum::extract::State;
use axum::Json;
use doccheck_core::settings::{CheckerSettings, SettingsUpdate};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::nonce::require_nonce;
use crate::middleware::rbac::RequireAdmin;
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

/// Request body for `POST /settings`: the nonce next to the changed fields.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub nonce: Option<String>,
    #[serde(flatten)]
    pub update: SettingsUpdate,
}

/// GET /api/v1/settings
///
/// The SMTP password is never returned.
pub async fn get_settings(
    RequireAdmin(_user): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CheckerSettings>>> {
    let settings = state.settings.load().await?;
    Ok(ok(settings.redacted()))
}

/// POST /api/v1/settings
///
/// Partial update; absent fields keep their stored value.
pub async fn update_settings(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<UpdateSettingsRequest>,
) -> AppResult<Json<ApiResponse<CheckerSettings>>> {
    require_nonce(&state, &user, input.nonce.as_deref())?;
    input.update.validate()?;

    let settings = state.settings.update(input.update).await?;
    tracing::info!(user = %user.username, "Settings updated");
    Ok(ok(settings.redacted()))
}
