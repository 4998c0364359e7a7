//! Warnings and the global warning log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issuer ID used for warnings raised by automated moderation.
pub const SYSTEM_ISSUER: &str = "system";

/// A warning issued to a user. Never edited once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub id: String,
    pub reason: String,
    pub description: String,
    pub date: DateTime<Utc>,
    /// Admin ID, or `system` for automated warnings.
    #[serde(alias = "adminId")]
    pub issued_by: String,
}

/// Entry of the global warning log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningLogEntry {
    #[serde(flatten)]
    pub warning: Warning,
    pub user_id: String,
    pub username: String,
}
