/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The local sendmail binary failed.
    #[error("Sendmail error: {0}")]
    Sendmail(#[from] lettre::transport::sendmail::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// SMTP is enabled but not usable as configured.
    #[error("SMTP configuration error: {0}")]
    Config(String),
}
