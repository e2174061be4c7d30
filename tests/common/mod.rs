//! Shared harness: a real router over a temp-file database, with the
//! outbound capabilities replaced by in-memory fakes.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use marketbook::config::Config;
use marketbook::services::clock::FixedClock;
use marketbook::services::delivery::{DeliveryError, Mailer, OutgoingEmail};
use marketbook::services::invoice::{InvoiceDocument, InvoiceRenderer, RenderError};
use marketbook::services::upload::{ObjectStorage, StorageError, StoredObject, UploadFile};
use marketbook::state::{Collaborators, SharedState};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[derive(Default)]
pub struct FakeRenderer {
    pub documents: Mutex<Vec<InvoiceDocument>>,
    pub fail: AtomicBool,
}

impl FakeRenderer {
    pub fn calls(&self) -> usize {
        self.documents.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl InvoiceRenderer for FakeRenderer {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn render(&self, document: &InvoiceDocument) -> Result<Vec<u8>, RenderError> {
        self.documents.lock().unwrap().push(document.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(RenderError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(format!("%PDF-1.4 {} {}", document.invoice_number, document.total).into_bytes())
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: AtomicBool,
}

impl FakeMailer {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), DeliveryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeStorage {
    pub uploads: Mutex<Vec<(String, UploadFile)>>,
}

#[async_trait::async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(&self, folder: &str, file: UploadFile) -> Result<StoredObject, StorageError> {
        let url = format!("https://cdn.test/{folder}/{}", file.file_name);
        let public_id = format!("{folder}/{}", file.file_name);
        self.uploads.lock().unwrap().push((folder.to_string(), file));
        Ok(StoredObject { url, public_id })
    }
}

pub struct TestApp {
    pub state: Arc<marketbook::api::AppState>,
    pub router: Router,
    pub renderer: Arc<FakeRenderer>,
    pub mailer: Arc<FakeMailer>,
    pub storage: Arc<FakeStorage>,
}

pub async fn spawn_app() -> TestApp {
    let db_path =
        std::env::temp_dir().join(format!("marketbook-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.maintenance.enabled = false;

    let renderer = Arc::new(FakeRenderer::default());
    let mailer = Arc::new(FakeMailer::default());
    let storage = Arc::new(FakeStorage::default());

    let collaborators = Collaborators {
        renderer: renderer.clone(),
        mailer: mailer.clone(),
        storage: storage.clone(),
        clock: Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        )),
    };

    let shared = SharedState::with_collaborators(config, collaborators)
        .await
        .expect("failed to create shared state");
    let state = marketbook::api::create_app_state(Arc::new(shared), None);
    let router = marketbook::api::router(state.clone());

    TestApp {
        state,
        router,
        renderer,
        mailer,
        storage,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.call_with_headers(method, uri, token, &[], body).await
    }

    pub async fn call_with_headers(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("user-agent", "marketbook-tests");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    pub async fn admin_call(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        grant: &str,
    ) -> (StatusCode, Value) {
        self.call_with_headers(method, uri, Some(token), &[("x-admin-token", grant)], None)
            .await
    }

    /// Registers an account and returns its bearer token.
    pub async fn register(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": "secret123" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    /// Registers admin access for `token` and exchanges the secret for a grant.
    pub async fn admin_grant(&self, token: &str) -> String {
        let (status, body) = self
            .call("POST", "/api/auth/admin/register", Some(token), None)
            .await;
        assert_eq!(status, StatusCode::CREATED, "admin register failed: {body}");
        let secret = body["data"]["adminSecret"].as_str().unwrap().to_string();

        let (status, body) = self
            .call(
                "POST",
                "/api/auth/admin/login",
                Some(token),
                Some(json!({ "adminSecret": secret })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        body["data"]["adminToken"].as_str().unwrap().to_string()
    }

    pub async fn create_item(&self, token: &str, body: Value) -> Value {
        let (status, body) = self.call("POST", "/api/items", Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body["data"].clone()
    }

    /// Audit actions for the account behind `token`, newest first.
    pub async fn audit_actions(&self, token: &str) -> Vec<String> {
        let user = self.state.shared.auth.authenticate(token).await.unwrap();
        self.state
            .store()
            .audit_repo()
            .recent_for_user(user.id, 1000)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect()
    }
}
