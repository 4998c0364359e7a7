//! Global warning log repository.

use rolapet_common::AppResult;

use crate::collections;
use crate::entities::WarningLogEntry;
use crate::store::{Store, Table};

/// Append-only audit log of every warning issued.
#[derive(Clone)]
pub struct WarningLogRepository {
    table: Table<WarningLogEntry>,
}

impl WarningLogRepository {
    /// Create a new warning log repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::WARNINGS),
        }
    }

    /// Append an entry.
    pub async fn append(&self, entry: WarningLogEntry) -> AppResult<WarningLogEntry> {
        self.table.insert(entry).await
    }

    /// Every entry, oldest first.
    pub async fn all(&self) -> AppResult<Vec<WarningLogEntry>> {
        self.table.all().await
    }

    /// Entries for one user, oldest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<WarningLogEntry>> {
        self.table.filter(|e| e.user_id == user_id).await
    }
}
