//! User record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Warning;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Provider,
    Admin,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Provider => "provider",
            Self::Admin => "admin",
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,

    /// Linked vehicle IDs.
    #[serde(default)]
    pub vehicles: Vec<String>,

    /// Warnings in the order they were issued.
    #[serde(default)]
    pub warnings: Vec<Warning>,

    pub is_of_age: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,

    /// Notarised consent reference, required for minors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_consent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl User {
    /// Whether the user holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
