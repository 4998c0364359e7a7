//! Purchase record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product purchase. `has_rated` flips to true once, when the buyer rates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub provider_id: String,
    pub purchase_date: DateTime<Utc>,
    pub has_rated: bool,
}
