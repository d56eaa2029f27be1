//! Runtime settings for checks and notifications.
//!
//! Settings live as one JSON document in the option store (key
//! [`SETTINGS_OPTION_KEY`]) and are re-read at the start of every check or
//! send. Partial updates arrive as [`SettingsUpdate`] and are validated
//! before being applied.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::template::{
    DEFAULT_BATCH_BODY, DEFAULT_BATCH_SUBJECT, DEFAULT_SINGLE_BODY, DEFAULT_SINGLE_SUBJECT,
};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Option-store key holding the serialized [`CheckerSettings`].
pub const SETTINGS_OPTION_KEY: &str = "tcd_settings";

/// Tokens configured on a fresh install.
pub const DEFAULT_REQUIRED_DOCUMENTS: &[&str] = &[
    "comprovante_endereco",
    "documento_identidade",
    "documento_responsavel",
];

/// Default batch cache lifetime in seconds.
pub const DEFAULT_CACHE_DURATION_SECS: u64 = 300;

/// Longest accepted batch cache lifetime (one week).
pub const MAX_CACHE_DURATION_SECS: u64 = 604_800;

/// Default SMTP submission port.
pub const DEFAULT_SMTP_PORT: u16 = 587;

// ---------------------------------------------------------------------------
// SMTP
// ---------------------------------------------------------------------------

/// Transport security for the SMTP relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpEncryption {
    /// Plain connection, no TLS.
    None,
    /// Implicit TLS (usually port 465).
    Ssl,
    /// STARTTLS upgrade (usually port 587).
    #[default]
    Tls,
}

impl SmtpEncryption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Ssl => "ssl",
            Self::Tls => "tls",
        }
    }

    /// Parse a setting value. Unknown or empty values mean no encryption.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "ssl" => Self::Ssl,
            "tls" | "starttls" => Self::Tls,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    /// When off, mail goes through the local sendmail binary.
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub encryption: SmtpEncryption,
    pub auth: bool,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: String::new(),
            port: DEFAULT_SMTP_PORT,
            encryption: SmtpEncryption::Tls,
            auth: true,
            username: String::new(),
            password: String::new(),
            from_email: String::new(),
            from_name: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Email templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailTemplates {
    pub single_subject: String,
    pub single_body: String,
    pub batch_subject: String,
    pub batch_body: String,
}

impl Default for EmailTemplates {
    fn default() -> Self {
        Self {
            single_subject: DEFAULT_SINGLE_SUBJECT.to_string(),
            single_body: DEFAULT_SINGLE_BODY.to_string(),
            batch_subject: DEFAULT_BATCH_SUBJECT.to_string(),
            batch_body: DEFAULT_BATCH_BODY.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Checker settings
// ---------------------------------------------------------------------------

/// Everything an operator can change at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerSettings {
    /// Collection used when a batch request names none.
    pub collection_id: Option<DbId>,
    pub required_documents: Vec<String>,
    /// Batch cache lifetime. `0` disables batch caching.
    pub cache_duration_secs: u64,
    pub debug_mode: bool,
    /// Clear an item's cached batch pages when the site reports a save.
    pub clear_cache_on_save: bool,
    pub email_enabled: bool,
    pub email_html: bool,
    pub templates: EmailTemplates,
    pub smtp: SmtpSettings,
}

impl Default for CheckerSettings {
    fn default() -> Self {
        Self {
            collection_id: None,
            required_documents: DEFAULT_REQUIRED_DOCUMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cache_duration_secs: DEFAULT_CACHE_DURATION_SECS,
            debug_mode: false,
            clear_cache_on_save: true,
            email_enabled: false,
            email_html: false,
            templates: EmailTemplates::default(),
            smtp: SmtpSettings::default(),
        }
    }
}

impl CheckerSettings {
    pub fn caching_enabled(&self) -> bool {
        self.cache_duration_secs > 0
    }

    /// Copy safe to return to clients: the SMTP password is blanked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.smtp.password = String::new();
        copy
    }
}

/// Trim tokens, drop empty ones and de-duplicate keeping the first occurrence.
pub fn normalize_required_documents<I, S>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for token in tokens {
        let token = token.as_ref().trim();
        if !token.is_empty() && !out.iter().any(|t| t == token) {
            out.push(token.to_string());
        }
    }
    out
}

/// Split a comma or newline separated token list, then normalize it.
pub fn parse_required_documents(raw: &str) -> Vec<String> {
    normalize_required_documents(raw.split([',', '\n']))
}

// ---------------------------------------------------------------------------
// Partial update
// ---------------------------------------------------------------------------

/// Partial settings update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SettingsUpdate {
    #[validate(range(min = 1))]
    pub collection_id: Option<DbId>,
    pub required_documents: Option<Vec<String>>,
    #[validate(range(max = 604_800))]
    pub cache_duration_secs: Option<u64>,
    pub debug_mode: Option<bool>,
    pub clear_cache_on_save: Option<bool>,
    pub email_enabled: Option<bool>,
    pub email_html: Option<bool>,
    #[validate(length(min = 1, max = 500))]
    pub email_subject: Option<String>,
    #[validate(length(min = 1, max = 20_000))]
    pub email_template: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub batch_email_subject: Option<String>,
    #[validate(length(min = 1, max = 20_000))]
    pub batch_email_template: Option<String>,
    pub smtp_enabled: Option<bool>,
    #[validate(length(max = 255))]
    pub smtp_host: Option<String>,
    #[validate(range(min = 1))]
    pub smtp_port: Option<u16>,
    pub smtp_encryption: Option<SmtpEncryption>,
    pub smtp_auth: Option<bool>,
    #[validate(length(max = 255))]
    pub smtp_username: Option<String>,
    /// Empty means "keep the stored password".
    pub smtp_password: Option<String>,
    #[validate(email)]
    pub smtp_from_email: Option<String>,
    #[validate(length(max = 255))]
    pub smtp_from_name: Option<String>,
}

impl SettingsUpdate {
    /// Apply every present field onto `settings`.
    pub fn apply(self, settings: &mut CheckerSettings) {
        if let Some(v) = self.collection_id {
            settings.collection_id = Some(v);
        }
        if let Some(v) = self.required_documents {
            settings.required_documents = normalize_required_documents(v);
        }
        if let Some(v) = self.cache_duration_secs {
            settings.cache_duration_secs = v.min(MAX_CACHE_DURATION_SECS);
        }
        if let Some(v) = self.debug_mode {
            settings.debug_mode = v;
        }
        if let Some(v) = self.clear_cache_on_save {
            settings.clear_cache_on_save = v;
        }
        if let Some(v) = self.email_enabled {
            settings.email_enabled = v;
        }
        if let Some(v) = self.email_html {
            settings.email_html = v;
        }
        if let Some(v) = self.email_subject {
            settings.templates.single_subject = v;
        }
        if let Some(v) = self.email_template {
            settings.templates.single_body = v;
        }
        if let Some(v) = self.batch_email_subject {
            settings.templates.batch_subject = v;
        }
        if let Some(v) = self.batch_email_template {
            settings.templates.batch_body = v;
        }

        let smtp = &mut settings.smtp;
        if let Some(v) = self.smtp_enabled {
            smtp.enabled = v;
        }
        if let Some(v) = self.smtp_host {
            smtp.host = v.trim().to_string();
        }
        if let Some(v) = self.smtp_port {
            smtp.port = v;
        }
        if let Some(v) = self.smtp_encryption {
            smtp.encryption = v;
        }
        if let Some(v) = self.smtp_auth {
            smtp.auth = v;
        }
        if let Some(v) = self.smtp_username {
            smtp.username = v.trim().to_string();
        }
        if let Some(v) = self.smtp_password.filter(|p| !p.is_empty()) {
            smtp.password = v;
        }
        if let Some(v) = self.smtp_from_email {
            smtp.from_email = v.trim().to_string();
        }
        if let Some(v) = self.smtp_from_name {
            smtp.from_name = v;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
