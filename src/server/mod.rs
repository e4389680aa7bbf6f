//! HTTP server.
//!
//! # Endpoints
//!
//! - `POST /webhook`: GitHub webhook deliveries (202 Accepted)
//! - `GET /health`: liveness probe (200 OK)

use std::sync::Arc;

use axum::http::StatusCode;
use tokio_util::task::TaskTracker;

use crate::effects::{GitHubInterpreter, InterpreterFactory};
use crate::webhooks::Dispatcher;

pub mod webhook;

pub use webhook::{WebhookError, webhook_handler};

/// Shared application state, cloned into every request.
pub struct AppState<F> {
    inner: Arc<AppStateInner<F>>,
}

struct AppStateInner<F> {
    webhook_secret: Vec<u8>,
    dispatcher: Arc<Dispatcher<F>>,
    /// Background dispatches still running.
    tasks: TaskTracker,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F> AppState<F> {
    pub fn new(webhook_secret: impl Into<Vec<u8>>, dispatcher: Dispatcher<F>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                webhook_secret: webhook_secret.into(),
                dispatcher: Arc::new(dispatcher),
                tasks: TaskTracker::new(),
            }),
        }
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher<F>> {
        Arc::clone(&self.inner.dispatcher)
    }

    pub fn tasks(&self) -> &TaskTracker {
        &self.inner.tasks
    }

    /// Stops accepting background work and waits for running dispatches.
    pub async fn drain(&self) {
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
    }
}

pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

pub fn build_router<F>(app_state: AppState<F>) -> axum::Router
where
    F: InterpreterFactory,
    <F::Interpreter as GitHubInterpreter>::Error: std::error::Error + Send + Sync + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler::<F>))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
