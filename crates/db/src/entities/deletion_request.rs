//! Account data deletion request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deletion request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletionStatus {
    Pending,
    Completed,
}

/// A user's request to have their data removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRequest {
    pub id: String,
    pub user_id: String,
    pub requested_at: DateTime<Utc>,
    pub status: DeletionStatus,
    pub scheduled_deletion_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}
