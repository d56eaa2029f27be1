pub mod auth;
pub mod cache;
pub mod checks;
pub mod notifications;
pub mod settings;
pub mod status;
