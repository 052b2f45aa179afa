use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const MISSING_FIELDS: &str = "Name and price are required";

/// Scale of the `price` column.
pub const PRICE_SCALE: u32 = 2;

/// Stored catalog row. `id` is always assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

// ── Request payloads ─────────────────────────────────────────────────────────

/// Body accepted by create and update. Everything is optional at the wire
/// level so presence can be reported with one message; any `id` is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ItemPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Accepts a JSON number or a numeric string.
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// A payload that passed validation; what gets written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
}

impl ItemPayload {
    /// `name` must be a non-empty string and `price` present and non-zero
    /// once rounded to the column scale. The rounded price is what gets stored.
    pub fn validate(self) -> AppResult<NewItem> {
        let price = self
            .price
            .map(|p| p.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero));
        match (self.name, price) {
            (Some(name), Some(price)) if !name.is_empty() && !price.is_zero() => Ok(NewItem {
                name,
                description: self.description,
                category: self.category,
                price,
            }),
            _ => Err(AppError::BadRequest(MISSING_FIELDS.to_string())),
        }
    }
}
