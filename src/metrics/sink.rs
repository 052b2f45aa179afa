use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::MetricDatum;

/// Destination for latency data points.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn put(&self, namespace: &str, datum: &MetricDatum) -> anyhow::Result<()>;
}

/// Wire shape of a `PutMetricData` call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutMetricData<'a> {
    namespace: &'a str,
    metric_data: [&'a MetricDatum; 1],
}

/// POSTs each datum as JSON to a monitoring endpoint. Non-2xx is an error.
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .context("failed to build metrics HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl MetricsSink for HttpSink {
    async fn put(&self, namespace: &str, datum: &MetricDatum) -> anyhow::Result<()> {
        self.client
            .post(&self.endpoint)
            .json(&PutMetricData {
                namespace,
                metric_data: [datum],
            })
            .send()
            .await
            .with_context(|| format!("POST {} failed", self.endpoint))?
            .error_for_status()?;
        Ok(())
    }
}

/// Used when no endpoint is configured.
pub struct LogSink;

#[async_trait]
impl MetricsSink for LogSink {
    async fn put(&self, namespace: &str, datum: &MetricDatum) -> anyhow::Result<()> {
        debug!(
            namespace,
            metric = datum.metric_name,
            value_ms = datum.value,
            dimensions = ?datum.dimensions,
            "Metric datum"
        );
        Ok(())
    }
}
