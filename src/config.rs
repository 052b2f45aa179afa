use std::time::Duration;

use anyhow::Context;

use crate::metrics::Delivery;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    /// Upper bound on checking out (or opening) a connection.
    pub connect_timeout: Duration,
    /// Upper bound on a single statement, checkout included.
    pub query_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// `None` means samples are only logged.
    pub endpoint: Option<String>,
    pub namespace: String,
    pub service_name: String,
    pub delivery: Delivery,
    pub timeout: Duration,
    pub history: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup so tests don't have to touch
    /// the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: var("HOST", "0.0.0.0"),
            port: var("PORT", "3000")
                .parse()
                .context("PORT must be a valid number")?,
            database: DatabaseConfig {
                host: var("DATABASE_HOST", "localhost"),
                port: var("DATABASE_PORT", "3306")
                    .parse()
                    .context("DATABASE_PORT must be a valid number")?,
                user: var("DATABASE_USER", "root"),
                password: var("DATABASE_PASSWORD", ""),
                name: var("DATABASE_NAME", "demo"),
                max_connections: var("DB_MAX_CONNECTIONS", "10")
                    .parse()
                    .context("DB_MAX_CONNECTIONS must be a valid number")?,
                connect_timeout: millis(&var("DB_CONNECT_TIMEOUT_MS", "5000"))
                    .context("DB_CONNECT_TIMEOUT_MS must be a number of milliseconds")?,
                query_timeout: millis(&var("DB_QUERY_TIMEOUT_MS", "5000"))
                    .context("DB_QUERY_TIMEOUT_MS must be a number of milliseconds")?,
            },
            metrics: MetricsConfig {
                endpoint: lookup("METRICS_ENDPOINT").filter(|url| !url.trim().is_empty()),
                namespace: var("METRICS_NAMESPACE", "items-svc-metrics"),
                service_name: var("METRICS_SERVICE_NAME", "items-svc"),
                delivery: var("METRICS_DELIVERY", "background").parse()?,
                timeout: millis(&var("METRICS_TIMEOUT_MS", "2000"))
                    .context("METRICS_TIMEOUT_MS must be a number of milliseconds")?,
                history: var("METRICS_HISTORY", "10000")
                    .parse()
                    .context("METRICS_HISTORY must be a valid number")?,
            },
        })
    }
}

fn millis(raw: &str) -> anyhow::Result<Duration> {
    let ms: u64 = raw.trim().parse()?;
    anyhow::ensure!(ms > 0, "timeout must be greater than zero");
    Ok(Duration::from_millis(ms))
}
