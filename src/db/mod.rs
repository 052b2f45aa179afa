use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Item, NewItem};

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub use mysql::MySqlItemStore;

/// One statement per call. Implementations must release whatever connection
/// they used before returning, on the error path too.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Creates the `items` table if absent and empties it.
    async fn bootstrap(&self) -> AppResult<()>;

    /// Liveness check: opens a dedicated connection and pings the server.
    async fn ping(&self) -> AppResult<()>;

    /// All rows, in whatever order the store returns them.
    async fn list(&self) -> AppResult<Vec<Item>>;

    /// Returns the generated id.
    async fn insert(&self, item: &NewItem) -> AppResult<i64>;

    /// Overwrites every mutable column. Returns the affected row count.
    async fn update(&self, id: i64, item: &NewItem) -> AppResult<u64>;

    /// Returns the affected row count.
    async fn delete(&self, id: i64) -> AppResult<u64>;
}
