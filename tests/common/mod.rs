#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tower::ServiceExt;

use blog_api::auth::{hash_password, issue_access};
use blog_api::config::{AppConfig, Environment};
use blog_api::database::models::{NewUser, User};
use blog_api::database::MemoryStore;
use blog_api::observer::{AuditEvent, Observer, ObserverError, ObserverPipeline};
use blog_api::{build_router, AppState};

/// Forwards every audit event to the test over a channel
pub struct RecordingObserver {
    tx: mpsc::UnboundedSender<AuditEvent>,
}

#[async_trait]
impl Observer for RecordingObserver {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn execute(&self, event: &AuditEvent) -> Result<(), ObserverError> {
        self.tx
            .send(event.clone())
            .map_err(|e| ObserverError::failed("recording", e.to_string()))
    }
}

/// In-process application over the memory store
pub struct TestApp {
    pub state: AppState,
    router: Router,
    audit: Mutex<mpsc::UnboundedReceiver<AuditEvent>>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_observers(Vec::new())
    }

    /// Recording observer first, then `extra` in order
    pub fn with_observers(extra: Vec<Arc<dyn Observer>>) -> Self {
        Self::build(AppConfig::for_environment(Environment::Development), extra)
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::build(config, Vec::new())
    }

    fn build(config: AppConfig, extra: Vec<Arc<dyn Observer>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut observers = ObserverPipeline::new(Duration::from_millis(500));
        observers.register_observer(Arc::new(RecordingObserver { tx }));
        for observer in extra {
            observers.register_observer(observer);
        }

        let state = AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            observers,
        );

        Self {
            router: build_router(state.clone()),
            state,
            audit: Mutex::new(rx),
        }
    }

    /// Account with an unusable password; use [`TestApp::token`] to act as it
    pub async fn user(&self, username: &str) -> Result<User> {
        self.insert_user(username, "!".to_string()).await
    }

    pub async fn user_with_password(&self, username: &str, password: &str) -> Result<User> {
        self.insert_user(username, hash_password(password)?).await
    }

    async fn insert_user(&self, username: &str, password_hash: String) -> Result<User> {
        Ok(self
            .state
            .users
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash,
                is_superuser: false,
            })
            .await?)
    }

    pub fn token(&self, user: &User) -> Result<String> {
        Ok(issue_access(user, &self.state.config.security)?)
    }

    /// Send one request; the body is `Value::Null` when the response is empty
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };
        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response body is not JSON")?
        };
        Ok((status, body))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Create a category and return its id
    pub async fn category(&self, token: &str, name: &str) -> Result<i64> {
        let (status, body) = self
            .post("/api/categories/", Some(token), serde_json::json!({ "name": name }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "category create failed: {} {}", status, body);
        body["id"].as_i64().context("category id missing")
    }

    /// Create a post and return its id
    pub async fn post_in(&self, token: &str, category: i64, title: &str, published: bool) -> Result<i64> {
        let (status, body) = self
            .post(
                "/api/posts/",
                Some(token),
                serde_json::json!({
                    "title": title,
                    "content": format!("{} body", title),
                    "category": category,
                    "published": published,
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "post create failed: {} {}", status, body);
        body["id"].as_i64().context("post id missing")
    }

    /// Next audit event, waiting briefly for the background dispatch
    pub async fn next_audit(&self) -> Result<AuditEvent> {
        let mut rx = self.audit.lock().await;
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .context("no audit event within 2s")?
            .context("audit channel closed")
    }

    /// Wait for `count` events, then fail if any more arrive
    pub async fn drain_audit(&self, count: usize) -> Result<Vec<AuditEvent>> {
        let mut events = Vec::with_capacity(count);
        for _ in 0..count {
            events.push(self.next_audit().await?);
        }
        let mut rx = self.audit.lock().await;
        if let Ok(Some(extra)) = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
            anyhow::bail!("unexpected extra audit event: {:?}", extra);
        }
        // Each mutation dispatches on its own task; restore request order
        events.sort_by_key(|event| event.at);
        Ok(events)
    }
}

/// Ids of a list response, in order
pub fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .map(|items| items.iter().filter_map(|item| item["id"].as_i64()).collect())
        .unwrap_or_default()
}
