//! Data deletion request repository.

use rolapet_common::{AppError, AppResult};

use crate::collections;
use crate::entities::{DeletionRequest, DeletionStatus};
use crate::store::{Store, Table};

/// Deletion request repository.
#[derive(Clone)]
pub struct DeletionRequestRepository {
    table: Table<DeletionRequest>,
}

impl DeletionRequestRepository {
    /// Create a new deletion request repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::DELETION_REQUESTS),
        }
    }

    /// Get a request by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<DeletionRequest> {
        self.table
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Deletion request {id}")))
    }

    /// Insert a request unless the user already has one pending.
    pub async fn create(&self, request: DeletionRequest) -> AppResult<DeletionRequest> {
        self.table
            .mutate(move |rows| {
                let pending = rows
                    .find(|r| r.user_id == request.user_id && r.status == DeletionStatus::Pending)
                    .is_some();
                if pending {
                    return Err(AppError::Duplicate(
                        "a deletion request is already pending".to_string(),
                    ));
                }
                rows.push(request.clone())?;
                Ok(request)
            })
            .await
    }

    /// Apply `f` to a request, failing with `NotFound` if absent.
    pub async fn update<R, F>(&self, id: &str, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut DeletionRequest) -> AppResult<R>,
    {
        self.table
            .update(id, f)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Deletion request {id}")))
    }
}
