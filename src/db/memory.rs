//! In-memory `ItemStore` for handler tests, with fault injection.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ItemStore;
use crate::error::{AppError, AppResult};
use crate::models::{Item, NewItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every call fails the way an unreachable server would.
    Unavailable,
    /// Every call panics.
    Panic,
}

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Item>,
}

#[derive(Default)]
pub struct InMemoryItemStore {
    table: RwLock<Table>,
    fault: Option<Fault>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(fault: Fault) -> Self {
        Self {
            fault: Some(fault),
            ..Self::default()
        }
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    fn check(&self) -> AppResult<()> {
        match self.fault {
            None => Ok(()),
            Some(Fault::Unavailable) => Err(AppError::Internal(anyhow::anyhow!(
                "connect ECONNREFUSED 127.0.0.1:3306"
            ))),
            Some(Fault::Panic) => panic!("store blew up"),
        }
    }
}

/// Row as MySQL would keep it; `price` is a `DECIMAL(10,2)` column.
fn stored_row(id: i64, item: &NewItem) -> Item {
    Item {
        id,
        name: item.name.clone(),
        description: item.description.clone(),
        category: item.category.clone(),
        price: item.price,
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn bootstrap(&self) -> AppResult<()> {
        self.check()?;
        // TRUNCATE resets AUTO_INCREMENT too.
        *self.table.write().await = Table::default();
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        self.check()
    }

    async fn list(&self) -> AppResult<Vec<Item>> {
        self.check()?;
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn insert(&self, item: &NewItem) -> AppResult<i64> {
        self.check()?;
        let mut table = self.table.write().await;
        table.last_id += 1;
        let id = table.last_id;
        table.rows.insert(id, stored_row(id, item));
        Ok(id)
    }

    async fn update(&self, id: i64, item: &NewItem) -> AppResult<u64> {
        self.check()?;
        let mut table = self.table.write().await;
        match table.rows.get_mut(&id) {
            Some(row) => {
                *row = stored_row(id, item);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: i64) -> AppResult<u64> {
        self.check()?;
        Ok(u64::from(self.table.write().await.rows.remove(&id).is_some()))
    }
}
