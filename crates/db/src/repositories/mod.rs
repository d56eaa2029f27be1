//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&SqlitePool` as the first argument.

pub mod cache_repo;
pub mod check_repo;
pub mod email_log_repo;
pub mod option_repo;

pub use cache_repo::CacheRepo;
pub use check_repo::CheckRepo;
pub use email_log_repo::EmailLogRepo;
pub use option_repo::OptionRepo;
