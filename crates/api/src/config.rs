use doccheck_core::nonce::DEFAULT_NONCE_LIFETIME_SECS;
use doccheck_core::settings::{
    parse_required_documents, CheckerSettings, SmtpEncryption, DEFAULT_CACHE_DURATION_SECS,
    MAX_CACHE_DURATION_SECS,
};
use doccheck_core::template::SiteInfo;
use doccheck_tainacan::client::DEFAULT_TIMEOUT_SECS;
use doccheck_tainacan::TainacanConfig;

use crate::auth::jwt::JwtConfig;

/// The single operator account allowed into the admin API.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub username: String,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`, batch pages are slow).
    pub request_timeout_secs: u64,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    /// Secret for anti-forgery nonces.
    pub nonce_secret: String,
    pub nonce_lifetime_secs: i64,
    /// Remote Tainacan / WordPress endpoints.
    pub tainacan: TainacanConfig,
    /// Site identity used in notification placeholders.
    pub site: SiteInfo,
    /// Sender used when the runtime settings name none.
    pub mail_from: String,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(name: &str) -> Option<bool> {
    env_opt(name).map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                            |
    /// |------------------------|------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                          |
    /// | `PORT`                 | `3000`                             |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`            |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                              |
    /// | `DATABASE_URL`         | `sqlite://doccheck.db?mode=rwc`    |
    /// | `ADMIN_USERNAME`       | `admin`                            |
    /// | `ADMIN_PASSWORD_HASH`  | **required**                       |
    /// | `NONCE_SECRET`         | value of `JWT_SECRET`              |
    /// | `NONCE_LIFETIME_SECS`  | `86400`                            |
    /// | `TAINACAN_API_URL`     | `{SITE_URL}/wp-json/tainacan/v2`   |
    /// | `WP_USERS_API_URL`     | `{SITE_URL}/wp-json/wp/v2`         |
    /// | `WP_API_USER`          | unset                              |
    /// | `WP_API_PASSWORD`      | unset                              |
    /// | `HTTP_TIMEOUT_SECS`    | `30`                               |
    /// | `SITE_NAME`            | `Tainacan`                         |
    /// | `SITE_URL`             | `http://localhost`                 |
    /// | `MAIL_FROM`            | `wordpress@localhost`              |
    ///
    /// # Panics
    ///
    /// Panics on unparsable numbers or a missing `ADMIN_PASSWORD_HASH`, so
    /// misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = env_or("HOST", "0.0.0.0");

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "300")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let database_url = env_or("DATABASE_URL", "sqlite://doccheck.db?mode=rwc");

        let jwt = JwtConfig::from_env();

        let admin = AdminConfig {
            username: env_or("ADMIN_USERNAME", "admin"),
            password_hash: std::env::var("ADMIN_PASSWORD_HASH")
                .expect("ADMIN_PASSWORD_HASH must be set (argon2 PHC string)"),
        };

        let nonce_secret = env_opt("NONCE_SECRET").unwrap_or_else(|| jwt.secret.clone());
        let nonce_lifetime_secs: i64 = env_or(
            "NONCE_LIFETIME_SECS",
            &DEFAULT_NONCE_LIFETIME_SECS.to_string(),
        )
        .parse()
        .expect("NONCE_LIFETIME_SECS must be a valid i64");

        let site_url = env_or("SITE_URL", "http://localhost")
            .trim_end_matches('/')
            .to_string();
        let site = SiteInfo {
            name: env_or("SITE_NAME", "Tainacan"),
            url: site_url.clone(),
        };

        let tainacan = TainacanConfig {
            api_url: env_opt("TAINACAN_API_URL")
                .unwrap_or_else(|| format!("{site_url}/wp-json/tainacan/v2")),
            users_api_url: env_opt("WP_USERS_API_URL")
                .unwrap_or_else(|| format!("{site_url}/wp-json/wp/v2")),
            username: env_opt("WP_API_USER"),
            password: env_opt("WP_API_PASSWORD"),
            timeout_secs: env_or("HTTP_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
                .parse()
                .expect("HTTP_TIMEOUT_SECS must be a valid u64"),
        };

        let mail_from = env_or("MAIL_FROM", "wordpress@localhost");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            jwt,
            admin,
            nonce_secret,
            nonce_lifetime_secs,
            tainacan,
            site,
            mail_from,
        }
    }
}

/// Runtime settings used until an operator saves their own.
///
/// | Env Var               | Default                     |
/// |-----------------------|-----------------------------|
/// | `COLLECTION_ID`       | unset                       |
/// | `REQUIRED_DOCUMENTS`  | the three built-in tokens   |
/// | `CACHE_DURATION_SECS` | `300`                       |
/// | `DEBUG_MODE`          | `false`                     |
/// | `EMAIL_ENABLED`       | `false`                     |
/// | `SMTP_ENABLED`        | `false`                     |
/// | `SMTP_HOST`           | empty                       |
/// | `SMTP_PORT`           | `587`                       |
/// | `SMTP_ENCRYPTION`     | `tls`                       |
/// | `SMTP_USERNAME`       | empty                       |
/// | `SMTP_PASSWORD`       | empty                       |
/// | `SMTP_FROM_EMAIL`     | empty                       |
/// | `SMTP_FROM_NAME`      | empty                       |
pub fn settings_from_env() -> CheckerSettings {
    let mut settings = CheckerSettings::default();

    settings.collection_id = env_opt("COLLECTION_ID").and_then(|v| v.trim().parse().ok());
    if let Some(raw) = env_opt("REQUIRED_DOCUMENTS") {
        settings.required_documents = parse_required_documents(&raw);
    }
    settings.cache_duration_secs = env_opt("CACHE_DURATION_SECS")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_CACHE_DURATION_SECS)
        .min(MAX_CACHE_DURATION_SECS);
    if let Some(v) = env_flag("DEBUG_MODE") {
        settings.debug_mode = v;
    }
    if let Some(v) = env_flag("EMAIL_ENABLED") {
        settings.email_enabled = v;
    }

    let smtp = &mut settings.smtp;
    if let Some(v) = env_flag("SMTP_ENABLED") {
        smtp.enabled = v;
    }
    if let Some(v) = env_opt("SMTP_HOST") {
        smtp.host = v.trim().to_string();
    }
    if let Some(port) = env_opt("SMTP_PORT").and_then(|v| v.trim().parse().ok()) {
        smtp.port = port;
    }
    if let Some(v) = env_opt("SMTP_ENCRYPTION") {
        smtp.encryption = SmtpEncryption::parse(&v);
    }
    if let Some(v) = env_opt("SMTP_USERNAME") {
        smtp.username = v;
    }
    if let Some(v) = env_opt("SMTP_PASSWORD") {
        smtp.password = v;
    }
    if let Some(v) = env_opt("SMTP_FROM_EMAIL") {
        smtp.from_email = v;
    }
    if let Some(v) = env_opt("SMTP_FROM_NAME") {
        smtp.from_name = v;
    }

    settings
}
