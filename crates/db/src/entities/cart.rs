//! Cart lines and wishlist entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Product;

/// One line of a user's cart, holding a snapshot of the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub user_id: String,
    pub product: Product,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// A product saved to a user's wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub added_at: DateTime<Utc>,
}
