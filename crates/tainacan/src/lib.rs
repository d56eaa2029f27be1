//! Client for the Tainacan and WordPress REST APIs.
//!
//! [`ItemSource`] is the seam the checker and notifier depend on;
//! [`TainacanClient`] is its HTTP implementation. Response bodies are parsed
//! leniently by the functions in [`parse`], since different Tainacan
//! versions and site plugins shape them differently.

pub mod client;
pub mod error;
pub mod parse;
pub mod source;

pub use client::{TainacanClient, TainacanConfig};
pub use error::TainacanError;
pub use source::{ItemInfo, ItemPage, ItemRef, ItemSource, Owner};
