use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::Connection;

use super::ItemStore;
use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Item, NewItem};

const CREATE_ITEMS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS items (
        id          BIGINT AUTO_INCREMENT PRIMARY KEY,
        name        VARCHAR(255) NOT NULL,
        description TEXT,
        category    VARCHAR(100),
        price       DECIMAL(10,2) NOT NULL
    )
"#;

/// MySQL-backed store. The pool is built lazily, so nothing touches the
/// network until the first operation. Bootstrap and the health check use a
/// dedicated connection instead, so a failed connect reports its own cause
/// rather than a pool checkout timeout.
#[derive(Clone)]
pub struct MySqlItemStore {
    pool: MySqlPool,
    options: MySqlConnectOptions,
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl MySqlItemStore {
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_lazy_with(options.clone());

        Self {
            pool,
            options,
            connect_timeout: config.connect_timeout,
            query_timeout: config.query_timeout,
        }
    }

    /// Opens a connection outside the pool, bounded by the connect timeout.
    async fn connect(&self) -> AppResult<MySqlConnection> {
        match tokio::time::timeout(
            self.connect_timeout,
            MySqlConnection::connect_with(&self.options),
        )
        .await
        {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::Timeout {
                operation: "connect",
                after: self.connect_timeout,
            }),
        }
    }

    /// Runs one store round-trip under the configured deadline.
    async fn with_deadline<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::Timeout {
                operation,
                after: self.query_timeout,
            }),
        }
    }
}

#[async_trait]
impl ItemStore for MySqlItemStore {
    async fn bootstrap(&self) -> AppResult<()> {
        let mut conn = self.connect().await?;
        self.with_deadline("bootstrap schema", async move {
            sqlx::query(CREATE_ITEMS_TABLE).execute(&mut conn).await?;
            sqlx::query("TRUNCATE TABLE items").execute(&mut conn).await?;
            conn.close().await
        })
        .await
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connect().await?;
        self.with_deadline("ping", async move {
            conn.ping().await?;
            conn.close().await
        })
        .await
    }

    async fn list(&self) -> AppResult<Vec<Item>> {
        self.with_deadline(
            "list items",
            sqlx::query_as::<_, Item>("SELECT id, name, description, category, price FROM items")
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn insert(&self, item: &NewItem) -> AppResult<i64> {
        let result = self
            .with_deadline(
                "insert item",
                sqlx::query(
                    "INSERT INTO items (name, description, category, price) VALUES (?, ?, ?, ?)",
                )
                .bind(&item.name)
                .bind(&item.description)
                .bind(&item.category)
                .bind(item.price)
                .execute(&self.pool),
            )
            .await?;

        i64::try_from(result.last_insert_id())
            .map_err(|_| AppError::Internal(anyhow::anyhow!("generated id out of range")))
    }

    async fn update(&self, id: i64, item: &NewItem) -> AppResult<u64> {
        let result = self
            .with_deadline(
                "update item",
                sqlx::query(
                    r#"
                    UPDATE items
                    SET name        = ?,
                        description = ?,
                        category    = ?,
                        price       = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&item.name)
                .bind(&item.description)
                .bind(&item.category)
                .bind(item.price)
                .bind(id)
                .execute(&self.pool),
            )
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64) -> AppResult<u64> {
        let result = self
            .with_deadline(
                "delete item",
                sqlx::query("DELETE FROM items WHERE id = ?")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;

        Ok(result.rows_affected())
    }
}
