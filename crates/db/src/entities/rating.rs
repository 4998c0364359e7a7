//! Rating record.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of entity a rating refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetType {
    Product,
    Provider,
    PointOfInterest,
    Route,
}

impl TargetType {
    /// Wire name of the target type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Provider => "provider",
            Self::PointOfInterest => "pointOfInterest",
            Self::Route => "route",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 1-5 star rating. At most one per (user, target, target type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: String,
    pub user_id: String,
    pub target_id: String,
    pub target_type: TargetType,
    #[serde(rename = "rating")]
    pub value: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub dislikes: u32,
    /// Users who liked this rating; `likes` always equals its length.
    #[serde(default)]
    pub liked_by: BTreeSet<String>,
}

impl Rating {
    /// Whether this rating belongs to the given user and target.
    #[must_use]
    pub fn matches(&self, user_id: &str, target_id: &str, target_type: TargetType) -> bool {
        self.user_id == user_id && self.target_id == target_id && self.target_type == target_type
    }
}
