//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the table row, plus the DTOs used for inserts and filtered reads.

pub mod cache_entry;
pub mod document_check;
pub mod email_log;
