/// Errors from the remote item/attachment fetcher.
///
/// Display strings are shown to operators as-is in check results.
#[derive(Debug, thiserror::Error)]
pub enum TainacanError {
    /// The request failed or timed out before a body was read.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The body is not JSON (or is JSON `null`).
    #[error("Failed to decode API response")]
    Decode,

    /// The API answered with the bare `"rest_forbidden"` string.
    #[error("Access forbidden. The attachments may be private or restricted.")]
    Forbidden,

    /// The body is JSON but not of any accepted shape.
    #[error("Invalid API response format")]
    InvalidResponse,

    /// WordPress REST error object `{ "code": .., "message": .. }`.
    #[error("{message}")]
    Api { code: String, message: String },
}

impl TainacanError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Short machine-readable code, for logs and response envelopes.
    pub fn code(&self) -> &str {
        match self {
            Self::Transport(_) => "http_request_failed",
            Self::Decode => "json_decode_error",
            Self::Forbidden => "rest_forbidden",
            Self::InvalidResponse => "invalid_response",
            Self::Api { code, .. } => code,
        }
    }
}
