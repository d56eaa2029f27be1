#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use doccheck_api::auth::jwt::{generate_access_token, JwtConfig};
use doccheck_api::auth::password::hash_password;
use doccheck_api::config::{AdminConfig, ServerConfig};
use doccheck_api::router::build_app_router;
use doccheck_api::state::AppState;
use doccheck_core::nonce::{create_nonce, NONCE_ACTION};
use doccheck_core::settings::{CheckerSettings, SmtpSettings};
use doccheck_core::template::SiteInfo;
use doccheck_core::types::DbId;
use doccheck_db::{create_memory_pool, DbPool};
use doccheck_notify::{EmailError, Mailer, OutgoingEmail};
use doccheck_tainacan::{ItemInfo, ItemPage, ItemRef, ItemSource, Owner, TainacanConfig, TainacanError};

pub const ADMIN_USERNAME: &str = "operator";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Remote site with two items in collection 7, both owned by user 12.
///
/// Item 42 is missing a document and carries an invalid one, item 43 is
/// complete, and fetching item 99 fails with a timeout.
pub struct FakeSite {
    attachments: HashMap<DbId, Vec<Value>>,
    collections: HashMap<DbId, Vec<DbId>>,
}

impl FakeSite {
    pub fn sample() -> Self {
        let files = |names: &[&str]| -> Vec<Value> {
            names
                .iter()
                .enumerate()
                .map(|(i, n)| json!({ "id": i + 1, "filename": n }))
                .collect()
        };
        let mut attachments = HashMap::new();
        attachments.insert(42, files(&["DOC_IDENTIDADE.pdf", "recibo.pdf"]));
        attachments.insert(
            43,
            files(&["documento_identidade.pdf", "comprovante-endereco.jpg"]),
        );
        let mut collections = HashMap::new();
        collections.insert(7, vec![42, 43]);
        Self {
            attachments,
            collections,
        }
    }
}

#[async_trait]
impl ItemSource for FakeSite {
    async fn item_attachments(&self, item_id: DbId) -> Result<Vec<Value>, TainacanError> {
        if item_id == 99 {
            return Err(TainacanError::Api {
                code: "http_request_failed".into(),
                message: "Operation timed out after 30000 milliseconds".into(),
            });
        }
        Ok(self.attachments.get(&item_id).cloned().unwrap_or_default())
    }

    async fn collection_items(
        &self,
        collection_id: DbId,
        page: u32,
        per_page: u32,
    ) -> Result<ItemPage, TainacanError> {
        let ids = self
            .collections
            .get(&collection_id)
            .ok_or(TainacanError::InvalidResponse)?;
        let items = ids
            .iter()
            .skip(((page - 1) * per_page) as usize)
            .take(per_page as usize)
            .map(|&id| ItemRef {
                id,
                title: format!("Item {id}"),
            })
            .collect();
        let total = ids.len() as u64;
        Ok(ItemPage {
            items,
            unidentified: 0,
            total,
            total_pages: total.div_ceil(u64::from(per_page)) as u32,
        })
    }

    async fn item_info(&self, item_id: DbId) -> Result<ItemInfo, TainacanError> {
        Ok(ItemInfo {
            id: item_id,
            title: format!("Item {item_id}"),
            url: None,
            collection_id: Some(7),
            owner_id: Some(12),
        })
    }

    async fn user(&self, user_id: DbId) -> Result<Option<Owner>, TainacanError> {
        Ok((user_id == 12).then(|| Owner {
            id: 12,
            display_name: "Maria".into(),
            login: "maria".into(),
            email: "maria@example.org".into(),
        }))
    }

    fn attachments_url(&self, item_id: DbId) -> String {
        format!("http://fake/wp-json/tainacan/v2/items/{item_id}/attachments")
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, _smtp: &SmtpSettings, email: &OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: "sqlite::memory:".to_string(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        admin: AdminConfig {
            username: ADMIN_USERNAME.to_string(),
            password_hash: hash_password(ADMIN_PASSWORD).expect("hashing should succeed"),
        },
        nonce_secret: "test-nonce-secret".to_string(),
        nonce_lifetime_secs: 86_400,
        tainacan: TainacanConfig {
            api_url: "http://fake/wp-json/tainacan/v2".to_string(),
            users_api_url: "http://fake/wp-json/wp/v2".to_string(),
            username: None,
            password: None,
            timeout_secs: 5,
        },
        site: SiteInfo {
            name: "Acervo".to_string(),
            url: "https://acervo.test".to_string(),
        },
        mail_from: "acervo@example.org".to_string(),
    }
}

pub fn test_settings(email_enabled: bool) -> CheckerSettings {
    CheckerSettings {
        required_documents: vec!["documento_identidade".into(), "comprovante_endereco".into()],
        email_enabled,
        ..CheckerSettings::default()
    }
}

pub struct TestApp {
    pub app: Router,
    pub pool: DbPool,
    pub config: ServerConfig,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn token(&self) -> String {
        generate_access_token(ADMIN_USERNAME, "admin", &self.config.jwt).unwrap()
    }

    pub fn token_with_role(&self, role: &str) -> String {
        generate_access_token(ADMIN_USERNAME, role, &self.config.jwt).unwrap()
    }

    pub fn nonce(&self) -> String {
        create_nonce(
            self.config.nonce_secret.as_bytes(),
            ADMIN_USERNAME,
            NONCE_ACTION,
            Utc::now(),
            self.config.nonce_lifetime_secs,
        )
    }

    /// Form POST as the operator with a valid nonce added.
    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let nonce = self.nonce();
        let mut all = vec![("nonce", nonce.as_str())];
        all.extend_from_slice(fields);
        post_form_auth(self.app.clone(), uri, &self.token(), &all).await
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        get_auth(self.app.clone(), uri, &self.token()).await
    }
}

/// Build the full application router over an in-memory database.
pub async fn build_test_app(email_enabled: bool) -> TestApp {
    let pool = create_memory_pool().await.expect("memory pool should open");
    let config = test_config();
    let mailer = Arc::new(RecordingMailer::default());

    let state = AppState::new(
        pool.clone(),
        config.clone(),
        Arc::new(FakeSite::sample()),
        mailer.clone(),
        test_settings(email_enabled),
    );
    let app = build_app_router(state, &config);

    TestApp {
        app,
        pool,
        config,
        mailer,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_form_auth(
    app: Router,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(encode_form(fields)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

fn encode_form(fields: &[(&str, &str)]) -> String {
    let encode = |s: &str| -> String {
        s.bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    (b as char).to_string()
                }
                _ => format!("%{b:02X}"),
            })
            .collect()
    };
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected HTTP status");
}
