use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};

use edenmind_api::clock::ManualClock;
use edenmind_api::config::AppConfig;
use edenmind_api::database::MemoryStore;
use edenmind_api::services::{AskError, AskService};
use edenmind_api::{app, AppState};

/// Answers every query the same way so transcripts are predictable.
pub struct ScriptedAsk;

#[async_trait]
impl AskService for ScriptedAsk {
    async fn ask(&self, query: &str, _user_context: &str) -> Result<String, AskError> {
        Ok(format!("Let's breathe together. You said: {}", query))
    }
}

/// Fails every query the way an overloaded upstream would.
pub struct FailingAsk;

#[async_trait]
impl AskService for FailingAsk {
    async fn ask(&self, _query: &str, _user_context: &str) -> Result<String, AskError> {
        Err(AskError::Upstream {
            status: 503,
            body: "model is overloaded".to_string(),
        })
    }
}

pub struct TestServer {
    pub base_url: String,
    pub clock: Arc<ManualClock>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register a fresh account and return its token.
    pub async fn register(&self, email: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "email": email,
                "password": "correct horse battery staple",
                "firstName": "Test",
                "lastName": "User"
            }))
            .send()
            .await?;
        anyhow::ensure!(
            res.status() == StatusCode::OK,
            "register {} returned {}",
            email,
            res.status()
        );
        token_from(res).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?)
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self.client.get(self.url(path)).bearer_auth(token).send().await?)
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?)
    }

    pub async fn put(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self.client.put(self.url(path)).bearer_auth(token).send().await?)
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self.client.delete(self.url(path)).bearer_auth(token).send().await?)
    }
}

pub async fn token_from(res: reqwest::Response) -> Result<String> {
    let body: Value = res.json().await?;
    body["token"]
        .as_str()
        .map(str::to_string)
        .with_context(|| format!("no token in {}", body))
}

/// Start the full router on an ephemeral port, backed by the in-memory
/// store and a clock the test controls.
pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(Arc::new(ScriptedAsk)).await
}

pub async fn spawn_server_with(ask: Arc<dyn AskService>) -> Result<TestServer> {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap(),
    ));
    let state = AppState::new(
        AppConfig::development(),
        Arc::new(MemoryStore::new()),
        clock.clone(),
        ask,
    )?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        clock,
        client: reqwest::Client::new(),
    })
}
