//! Capability checks.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use doccheck_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

pub const ROLE_ADMIN: &str = "admin";

/// Capability every admin action requires.
pub const CAP_MANAGE_OPTIONS: &str = "manage_options";

/// Capabilities granted to a role.
pub fn role_capabilities(role: &str) -> &'static [&'static str] {
    match role {
        ROLE_ADMIN => &[CAP_MANAGE_OPTIONS],
        _ => &[],
    }
}

/// Requires the `manage_options` capability. Rejects with 403 otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !role_capabilities(&user.role).contains(&CAP_MANAGE_OPTIONS) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Insufficient permissions.".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}
