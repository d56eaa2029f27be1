//! Pure domain logic for the document checker.
//!
//! Nothing in this crate touches the network or the database; callers load
//! attachments, settings and history elsewhere and pass them in.

pub mod attachment;
pub mod cache_key;
pub mod check;
pub mod error;
pub mod matcher;
pub mod nonce;
pub mod settings;
pub mod template;
pub mod types;
