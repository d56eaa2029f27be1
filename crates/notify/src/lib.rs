//! Owner notifications for incomplete items.
//!
//! [`Notifier`] decides whether and whom to email, renders the configured
//! templates and records every attempt in the email log. The actual
//! delivery goes through the [`Mailer`] seam; [`LettreMailer`] is the SMTP /
//! sendmail implementation.

pub mod error;
pub mod mailer;
pub mod notifier;

pub use error::EmailError;
pub use mailer::{is_valid_email, LettreMailer, Mailer, OutgoingEmail};
pub use notifier::{BatchNotifyStats, Notifier, NotifyOutcome};
