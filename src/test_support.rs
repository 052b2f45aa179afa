//! Router harness shared by handler tests.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use crate::config::MetricsConfig;
use crate::db::memory::InMemoryItemStore;
use crate::db::ItemStore;
use crate::metrics::{Delivery, LogSink, MetricsEmitter};
use crate::{build_router, AppState};

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryItemStore>,
    pub metrics: MetricsEmitter,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryItemStore::new()))
    }

    pub fn with_store(store: Arc<InMemoryItemStore>) -> Self {
        let metrics = inline_metrics();
        let state = AppState {
            store: store.clone(),
            metrics: metrics.clone(),
        };

        Self {
            router: build_router(state),
            store,
            metrics,
        }
    }
}

/// Router over any store, for tests that need a real backend.
pub fn router_with(store: Arc<dyn ItemStore>) -> Router {
    build_router(AppState {
        store,
        metrics: inline_metrics(),
    })
}

fn inline_metrics() -> MetricsEmitter {
    MetricsEmitter::new(
        Arc::new(LogSink),
        &MetricsConfig {
            endpoint: None,
            namespace: "items-svc-metrics".to_string(),
            service_name: "items-svc".to_string(),
            delivery: Delivery::Inline,
            timeout: Duration::from_millis(100),
            history: 1_000,
        },
    )
}

/// Sends one request through the router; an empty body comes back as `Null`.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap_or_else(|err| panic!("failed to build request: {err}"));

    let response = router
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|err| panic!("router request failed: {err}"));

    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap_or_else(|err| panic!("failed to read response body: {err}"));
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|err| panic!("response body is not JSON: {err}"))
    };
    (status, value)
}
