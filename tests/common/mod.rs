#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use medtap_api::audit::{AuditSink, MemoryAuditSink};
use medtap_api::auth::AccountStatus;
use medtap_api::config::AppConfig;
use medtap_api::database::{MemoryPetStore, MemoryUserStore};
use medtap_api::{router, AppState, Stores};

pub const PASSWORD: &str = "correct horse battery";

/// App served in-process on a free port, backed by in-memory stores.
///
/// Each test owns its server; the task dies with the test's runtime.
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub users: Arc<MemoryUserStore>,
    pub audit: Arc<MemoryAuditSink>,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let users = Arc::new(MemoryUserStore::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let sink: Arc<dyn AuditSink> = audit.clone();
        let state = AppState::new(
            AppConfig::for_tests("integration-secret"),
            Stores::with_memory(users.clone(), Arc::new(MemoryPetStore::new())),
            sink,
        )?;

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            base_url,
            client: reqwest::Client::new(),
            users,
            audit,
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register through the API; returns (status, body)
    pub async fn register(&self, email: &str, user_type: &str) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({
                "email": email,
                "password": PASSWORD,
                "userType": user_type,
                "firstName": "Test",
            }))
            .send()
            .await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Ok((res.status(), res.json().await?))
    }

    /// Register, activate in the store, and return a bearer token with the user id
    pub async fn active_account(&self, email: &str, user_type: &str) -> Result<(String, String)> {
        let (status, body) = self.register(email, user_type).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);

        let token = body["data"]["token"].as_str().context("no token")?.to_string();
        let id = body["data"]["user"]["id"].as_str().context("no user id")?.to_string();
        self.users
            .set_status(id.parse()?, AccountStatus::Active)
            .await;
        Ok((token, id))
    }
}
