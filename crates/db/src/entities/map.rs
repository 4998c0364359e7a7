//! Map points of interest and routes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of point of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiKind {
    ChargingStation,
    RepairShop,
    Parking,
    Store,
    RestArea,
    ScenicPoint,
    DangerZone,
}

/// Coordinates with an optional street address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A point of interest on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointOfInterest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: PoiKind,
    pub location: Location,
    #[serde(default)]
    pub icon: String,
    pub rating: f64,
    pub review_count: usize,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub is_verified: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Route difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Kind of terrain a route covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Urban,
    Suburban,
    Mixed,
}

/// One ordered point of a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
    pub order: u32,
}

/// A route shared by a rider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_by: String,
    /// Length in km.
    pub distance: f64,
    /// Expected duration in minutes.
    pub estimated_duration: u32,
    pub difficulty: Difficulty,
    #[serde(rename = "type")]
    pub kind: RouteKind,
    pub waypoints: Vec<Waypoint>,
    /// IDs of points of interest along the route.
    #[serde(default)]
    pub points_of_interest: Vec<String>,
    pub rating: f64,
    pub review_count: usize,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
