//! HTTP implementation of [`ItemSource`] using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use doccheck_core::types::DbId;
use reqwest::header::{HeaderMap, ACCEPT};
use serde_json::Value;

use crate::error::TainacanError;
use crate::parse::{self, PageHeaders};
use crate::source::{ItemInfo, ItemPage, ItemSource, Owner};

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the remote site.
#[derive(Debug, Clone)]
pub struct TainacanConfig {
    /// Tainacan REST base, e.g. `https://site/wp-json/tainacan/v2`.
    pub api_url: String,
    /// WordPress core REST base, e.g. `https://site/wp-json/wp/v2`.
    pub users_api_url: String,
    /// Application-password credentials for user lookups.
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

/// HTTP client for one Tainacan site.
pub struct TainacanClient {
    client: reqwest::Client,
    api_url: String,
    users_api_url: String,
    credentials: Option<(String, String)>,
}

impl TainacanClient {
    pub fn new(config: TainacanConfig) -> Result<Self, TainacanError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        let credentials = match (config.username, config.password) {
            (Some(user), Some(pass)) if !user.is_empty() => Some((user, pass)),
            _ => None,
        };

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            users_api_url: config.users_api_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    // ---- private helpers ----

    /// Single GET returning the body text and headers. Non-2xx statuses are
    /// not errors here: WordPress puts its error objects in the body.
    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        authenticated: bool,
    ) -> Result<(HeaderMap, String), TainacanError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .query(query);

        if authenticated {
            if let Some((user, pass)) = &self.credentials {
                request = request.basic_auth(user, Some(pass));
            }
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(url, status = status.as_u16(), "Remote API returned non-success status");
        }

        Ok((headers, body))
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

#[async_trait]
impl ItemSource for TainacanClient {
    async fn item_attachments(&self, item_id: DbId) -> Result<Vec<Value>, TainacanError> {
        let url = self.attachments_url(item_id);
        tracing::debug!(item_id, url = %url, "Fetching attachments");

        let (_, body) = self.get(&url, &[], false).await?;
        let attachments = parse::parse_attachments(&body)?;

        tracing::debug!(item_id, count = attachments.len(), "Received attachments");
        Ok(attachments)
    }

    async fn collection_items(
        &self,
        collection_id: DbId,
        page: u32,
        per_page: u32,
    ) -> Result<ItemPage, TainacanError> {
        let url = format!("{}/collection/{collection_id}/items", self.api_url);
        let query = [
            ("paged", page.to_string()),
            ("perpage", per_page.to_string()),
            ("fetch_only", "title,id".to_string()),
            ("orderby", "id".to_string()),
            ("order", "ASC".to_string()),
        ];
        tracing::debug!(collection_id, page, per_page, url = %url, "Fetching collection items");

        let (headers, body) = self.get(&url, &query, false).await?;
        let page_headers = PageHeaders {
            total: header_number(&headers, "X-WP-Total"),
            total_pages: header_number(&headers, "X-WP-TotalPages"),
        };

        parse::parse_item_page(&body, page_headers, per_page)
    }

    async fn item_info(&self, item_id: DbId) -> Result<ItemInfo, TainacanError> {
        let url = format!("{}/items/{item_id}", self.api_url);
        let (_, body) = self.get(&url, &[], false).await?;
        parse::parse_item_info(item_id, &body)
    }

    async fn user(&self, user_id: DbId) -> Result<Option<Owner>, TainacanError> {
        let url = format!("{}/users/{user_id}", self.users_api_url);
        let query = [("context", "edit".to_string())];
        let (_, body) = self.get(&url, &query, true).await?;
        parse::parse_owner(&body)
    }

    fn attachments_url(&self, item_id: DbId) -> String {
        format!("{}/items/{item_id}/attachments", self.api_url)
    }
}
