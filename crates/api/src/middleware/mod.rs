//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated operator from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `manage_options` capability.
//! - [`nonce::require_nonce`] -- Checks the anti-forgery token of mutating actions.

pub mod auth;
pub mod nonce;
pub mod rbac;
