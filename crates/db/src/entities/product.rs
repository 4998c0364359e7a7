//! Product record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RatedTarget;

/// Whether a listing is a physical product or a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Service,
    Product,
}

/// A product or service published by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub provider_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ProductKind,
    #[serde(default)]
    pub category: String,
    pub price: f64,
    pub currency: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub is_available: bool,

    /// Units in stock; `None` means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,

    pub rating: f64,
    pub review_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

impl Product {
    /// Whether `quantity` units can be supplied.
    #[must_use]
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock.is_none_or(|stock| quantity <= stock)
    }
}

impl RatedTarget for Product {
    fn set_aggregate(&mut self, average: f64, count: usize) {
        self.rating = average;
        self.review_count = count;
    }
}
