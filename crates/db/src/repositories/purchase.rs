//! Purchase repository.

use rolapet_common::AppResult;

use crate::collections;
use crate::entities::Purchase;
use crate::store::{Store, Table};

/// Purchase repository.
#[derive(Clone)]
pub struct PurchaseRepository {
    table: Table<Purchase>,
}

impl PurchaseRepository {
    /// Create a new purchase repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::PURCHASES),
        }
    }

    /// Record a purchase.
    pub async fn create(&self, purchase: Purchase) -> AppResult<Purchase> {
        self.table.insert(purchase).await
    }

    /// Find a purchase by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Purchase>> {
        self.table.find(id).await
    }

    /// Purchases by a user, oldest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<Purchase>> {
        self.table.filter(|p| p.user_id == user_id).await
    }

    /// Purchases by a user that have not been rated yet.
    pub async fn find_unrated_by_user(&self, user_id: &str) -> AppResult<Vec<Purchase>> {
        self.table
            .filter(|p| p.user_id == user_id && !p.has_rated)
            .await
    }

    /// Flag the oldest unrated purchase of `product_id` by `user_id` as rated.
    ///
    /// Returns the flagged purchase, or `None` if there was nothing to flag.
    pub async fn mark_first_rated(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> AppResult<Option<Purchase>> {
        self.table
            .mutate(|rows| {
                Ok(rows
                    .find_mut(|p| {
                        p.user_id == user_id && p.product_id == product_id && !p.has_rated
                    })
                    .map(|p| {
                        p.has_rated = true;
                        p.clone()
                    }))
            })
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn purchase(id: &str, product_id: &str) -> Purchase {
        Purchase {
            id: id.to_string(),
            user_id: "u1".to_string(),
            product_id: product_id.to_string(),
            provider_id: "prov1".to_string(),
            purchase_date: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
            has_rated: false,
        }
    }

    #[tokio::test]
    async fn test_mark_first_rated_flags_one_purchase() {
        let repo = PurchaseRepository::new(&Store::in_memory());
        repo.create(purchase("p1", "prod1")).await.unwrap();
        repo.create(purchase("p2", "prod1")).await.unwrap();

        let flagged = repo.mark_first_rated("u1", "prod1").await.unwrap().unwrap();

        assert_eq!(flagged.id, "p1");
        let unrated = repo.find_unrated_by_user("u1").await.unwrap();
        assert_eq!(unrated.len(), 1);
        assert_eq!(unrated[0].id, "p2");
    }

    #[tokio::test]
    async fn test_mark_first_rated_nothing_to_flag() {
        let repo = PurchaseRepository::new(&Store::in_memory());
        repo.create(purchase("p1", "prod1")).await.unwrap();

        let flagged = repo.mark_first_rated("u1", "prod2").await.unwrap();

        assert!(flagged.is_none());
    }
}
