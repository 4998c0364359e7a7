//! Provider record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RatedTarget;

/// What a provider offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Service,
    Product,
    Both,
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A marketplace provider. Registered disabled until an admin enables it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    #[serde(default)]
    pub categories: Vec<String>,
    pub is_enabled: bool,
    pub registration_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,

    /// Mean of all provider ratings.
    pub rating: f64,
    pub review_count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl RatedTarget for Provider {
    fn set_aggregate(&mut self, average: f64, count: usize) {
        self.rating = average;
        self.review_count = count;
    }
}
