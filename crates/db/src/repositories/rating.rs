//! Rating repository.

use rolapet_common::{AppError, AppResult};

use crate::collections;
use crate::entities::{Rating, TargetType};
use crate::store::{Store, Table};

/// Rating repository.
#[derive(Clone)]
pub struct RatingRepository {
    table: Table<Rating>,
}

impl RatingRepository {
    /// Create a new rating repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::RATINGS),
        }
    }

    /// Find a rating by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Rating>> {
        self.table.find(id).await
    }

    /// Insert a rating unless the same user already rated the same target.
    pub async fn create(&self, rating: Rating) -> AppResult<Rating> {
        self.table
            .mutate(move |rows| {
                let taken = rows
                    .find(|r| r.matches(&rating.user_id, &rating.target_id, rating.target_type))
                    .is_some();
                if taken {
                    return Err(AppError::Duplicate(format!(
                        "rating by {} for {} {}",
                        rating.user_id, rating.target_type, rating.target_id
                    )));
                }
                rows.push(rating.clone())?;
                Ok(rating)
            })
            .await
    }

    /// Whether the user already rated the target.
    pub async fn exists_for(
        &self,
        user_id: &str,
        target_id: &str,
        target_type: TargetType,
    ) -> AppResult<bool> {
        Ok(self
            .table
            .all()
            .await?
            .iter()
            .any(|r| r.matches(user_id, target_id, target_type)))
    }

    /// Ratings for one target, oldest first.
    pub async fn find_by_target(
        &self,
        target_id: &str,
        target_type: TargetType,
    ) -> AppResult<Vec<Rating>> {
        self.table
            .filter(|r| r.target_id == target_id && r.target_type == target_type)
            .await
    }

    /// Apply `f` to a rating, failing with `NotFound` if absent.
    pub async fn update<R, F>(&self, id: &str, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut Rating) -> AppResult<R>,
    {
        self.table
            .update(id, f)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Rating {id}")))
    }
}
