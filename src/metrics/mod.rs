pub mod recorder;
pub mod sink;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::warn;

pub use recorder::{LatencyRecorder, LatencySample};
pub use sink::{HttpSink, LogSink, MetricsSink};

use crate::config::MetricsConfig;

pub const LATENCY_METRIC: &str = "DatabaseQueryLatency";

/// Kind of statement a latency sample was taken around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
}

impl QueryType {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::Select => "SELECT",
            QueryType::Insert => "INSERT",
            QueryType::Update => "UPDATE",
            QueryType::Delete => "DELETE",
        }
    }
}

/// Whether a handler waits for the sink before responding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Submitted on a spawned task.
    Background,
    /// Awaited before the response is sent, bounded by the metrics timeout.
    Inline,
}

impl FromStr for Delivery {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "background" => Ok(Delivery::Background),
            "inline" => Ok(Delivery::Inline),
            other => anyhow::bail!("METRICS_DELIVERY must be `background` or `inline`, got `{other}`"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub name: &'static str,
    pub value: String,
}

impl Dimension {
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// One data point as submitted to the monitoring sink.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDatum {
    pub metric_name: &'static str,
    pub value: f64,
    pub unit: &'static str,
    pub timestamp: DateTime<Utc>,
    pub dimensions: Vec<Dimension>,
}

/// Reports per-query latency. Never fails: sink errors and timeouts are
/// logged and dropped.
#[derive(Clone)]
pub struct MetricsEmitter {
    sink: Arc<dyn MetricsSink>,
    history: Arc<RwLock<LatencyRecorder>>,
    namespace: Arc<str>,
    service_name: Arc<str>,
    delivery: Delivery,
    timeout: Duration,
}

impl MetricsEmitter {
    pub fn new(sink: Arc<dyn MetricsSink>, config: &MetricsConfig) -> Self {
        Self {
            sink,
            history: Arc::new(RwLock::new(LatencyRecorder::new(config.history))),
            namespace: config.namespace.as_str().into(),
            service_name: config.service_name.as_str().into(),
            delivery: config.delivery,
            timeout: config.timeout,
        }
    }

    /// Picks the HTTP sink when an endpoint is configured, the log sink
    /// otherwise.
    pub fn from_config(config: &MetricsConfig) -> anyhow::Result<Self> {
        let sink: Arc<dyn MetricsSink> = match &config.endpoint {
            Some(endpoint) => Arc::new(HttpSink::new(endpoint.as_str(), config.timeout)?),
            None => Arc::new(LogSink),
        };
        Ok(Self::new(sink, config))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn history(&self) -> &RwLock<LatencyRecorder> {
        &self.history
    }

    pub async fn record(&self, query_type: QueryType, elapsed: Duration) {
        let now = Utc::now();
        self.history.write().await.record(LatencySample {
            query_type,
            duration_ns: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
        });

        let datum = MetricDatum {
            metric_name: LATENCY_METRIC,
            value: elapsed.as_secs_f64() * 1000.0,
            unit: "Milliseconds",
            timestamp: now,
            dimensions: vec![
                Dimension::new("ServiceName", &*self.service_name),
                Dimension::new("QueryType", query_type.as_str()),
            ],
        };

        match self.delivery {
            Delivery::Inline => self.submit(query_type, datum).await,
            Delivery::Background => {
                let emitter = self.clone();
                tokio::spawn(async move { emitter.submit(query_type, datum).await });
            }
        }
    }

    async fn submit(&self, query_type: QueryType, datum: MetricDatum) {
        let query_type = query_type.as_str();
        match tokio::time::timeout(self.timeout, self.sink.put(&self.namespace, &datum)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(error = %format!("{err:#}"), query_type, "Failed to send latency metric");
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    query_type, "Timed out sending latency metric"
                );
            }
        }
    }
}
