//! Vehicle record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of micromobility vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleKind {
    Scooter,
    Bicycle,
    Motorcycle,
}

/// A vehicle registered by its owner. Deletion only clears `is_active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: VehicleKind,
    pub brand: String,
    pub model: String,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    pub is_electric: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_capacity: Option<String>,
    /// Top speed in km/h.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
    /// Range in km.
    #[serde(default, rename = "range", skip_serializing_if = "Option::is_none")]
    pub range_km: Option<f64>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub registration_date: DateTime<Utc>,
    pub is_active: bool,
}
