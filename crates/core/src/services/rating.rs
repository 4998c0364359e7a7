//! Rating aggregator: one rating per user and target, the purchase window,
//! target aggregates and rating likes.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rolapet_common::clock::days_between;
use rolapet_common::{AppError, AppResult, IdGenerator, SharedClock, config::RatingConfig};
use rolapet_db::entities::{Purchase, Rating, TargetType};
use rolapet_db::repositories::{
    ProductRepository, ProviderRepository, PurchaseRepository, RatingRepository,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use validator::Validate;

/// Input for creating a rating.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRatingInput {
    #[validate(length(min = 1, message = "Target is required"))]
    pub target_id: String,
    pub target_type: TargetType,
    #[serde(rename = "rating")]
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub value: i32,
    pub comment: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Mean rating and number of ratings of a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: usize,
}

impl RatingSummary {
    fn of(ratings: &[Rating]) -> Self {
        let count = ratings.len();
        if count == 0 {
            return Self {
                average: 0.0,
                count,
            };
        }
        let sum: u32 = ratings.iter().map(|r| u32::from(r.value)).sum();
        Self {
            average: f64::from(sum) / count as f64,
            count,
        }
    }
}

/// Rating service.
#[derive(Clone)]
pub struct RatingService {
    rating_repo: RatingRepository,
    purchase_repo: PurchaseRepository,
    product_repo: ProductRepository,
    provider_repo: ProviderRepository,
    clock: SharedClock,
    id_gen: IdGenerator,
    window_days: i64,
    /// Held across insert and aggregate recompute so aggregates never go stale.
    write_lock: Arc<Mutex<()>>,
}

impl RatingService {
    /// Create a new rating service.
    #[must_use]
    pub fn new(
        rating_repo: RatingRepository,
        purchase_repo: PurchaseRepository,
        product_repo: ProductRepository,
        provider_repo: ProviderRepository,
        clock: SharedClock,
        config: &RatingConfig,
    ) -> Self {
        Self {
            rating_repo,
            purchase_repo,
            product_repo,
            provider_repo,
            clock,
            id_gen: IdGenerator::new(),
            window_days: config.window_days,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create a rating.
    ///
    /// Checks the value range, then the purchase window (products with a
    /// purchase date only), then uniqueness of the (user, target, type) tuple.
    pub async fn create_rating(
        &self,
        user_id: &str,
        input: CreateRatingInput,
    ) -> AppResult<Rating> {
        input.validate()?;
        let value = u8::try_from(input.value)
            .map_err(|_| AppError::Validation("Rating must be between 1 and 5".to_string()))?;

        let now = self.clock.now();
        if input.target_type == TargetType::Product {
            if let Some(purchase_date) = input.purchase_date {
                if days_between(purchase_date, now) > self.window_days {
                    return Err(AppError::WindowExpired {
                        window_days: self.window_days,
                    });
                }
            }
        }

        let rating = Rating {
            id: self.id_gen.generate(),
            user_id: user_id.to_string(),
            target_id: input.target_id,
            target_type: input.target_type,
            value,
            comment: input.comment.filter(|c| !c.trim().is_empty()),
            created_at: now,
            purchase_date: input.purchase_date,
            images: input.images,
            likes: 0,
            dislikes: 0,
            liked_by: BTreeSet::new(),
        };

        let _guard = self.write_lock.lock().await;

        let rating = self.rating_repo.create(rating).await?;
        let summary = self.recompute(&rating.target_id, rating.target_type).await?;

        if rating.target_type == TargetType::Product && rating.purchase_date.is_some() {
            if let Some(purchase) = self
                .purchase_repo
                .mark_first_rated(user_id, &rating.target_id)
                .await?
            {
                debug!(purchase_id = %purchase.id, "Purchase marked as rated");
            }
        }

        info!(
            rating_id = %rating.id,
            user_id = %user_id,
            target_id = %rating.target_id,
            target_type = %rating.target_type,
            average = summary.average,
            count = summary.count,
            "Rating created"
        );

        Ok(rating)
    }

    /// Ratings of a target, oldest first.
    pub async fn get_ratings(
        &self,
        target_id: &str,
        target_type: TargetType,
    ) -> AppResult<Vec<Rating>> {
        self.rating_repo.find_by_target(target_id, target_type).await
    }

    /// Mean and count over all ratings of a target.
    pub async fn average(
        &self,
        target_id: &str,
        target_type: TargetType,
    ) -> AppResult<RatingSummary> {
        let ratings = self.get_ratings(target_id, target_type).await?;
        Ok(RatingSummary::of(&ratings))
    }

    /// Whether the user already rated the target.
    pub async fn has_rated(
        &self,
        user_id: &str,
        target_id: &str,
        target_type: TargetType,
    ) -> AppResult<bool> {
        self.rating_repo
            .exists_for(user_id, target_id, target_type)
            .await
    }

    /// Like a rating. Fails with `AlreadyLiked` on a second like by the same user.
    pub async fn like_rating(&self, rating_id: &str, user_id: &str) -> AppResult<Rating> {
        self.rating_repo
            .update(rating_id, |rating| {
                if !rating.liked_by.insert(user_id.to_string()) {
                    return Err(AppError::AlreadyLiked(format!("Rating {rating_id}")));
                }
                rating.likes += 1;
                Ok(rating.clone())
            })
            .await
    }

    /// Remove a like. Fails with `NotLiked` when the user never liked the rating.
    pub async fn unlike_rating(&self, rating_id: &str, user_id: &str) -> AppResult<Rating> {
        self.rating_repo
            .update(rating_id, |rating| {
                if !rating.liked_by.remove(user_id) {
                    return Err(AppError::NotLiked(format!("Rating {rating_id}")));
                }
                rating.likes = rating.likes.saturating_sub(1);
                Ok(rating.clone())
            })
            .await
    }

    /// Record a purchase that may later be rated.
    pub async fn register_purchase(
        &self,
        user_id: &str,
        product_id: &str,
        provider_id: &str,
    ) -> AppResult<Purchase> {
        let purchase = self
            .purchase_repo
            .create(Purchase {
                id: self.id_gen.generate(),
                user_id: user_id.to_string(),
                product_id: product_id.to_string(),
                provider_id: provider_id.to_string(),
                purchase_date: self.clock.now(),
                has_rated: false,
            })
            .await?;

        info!(
            purchase_id = %purchase.id,
            user_id = %user_id,
            product_id = %product_id,
            "Purchase registered"
        );
        Ok(purchase)
    }

    /// Purchases of a user.
    pub async fn purchases(&self, user_id: &str) -> AppResult<Vec<Purchase>> {
        self.purchase_repo.find_by_user(user_id).await
    }

    /// Unrated purchases still inside the rating window.
    pub async fn should_alert(&self, user_id: &str) -> AppResult<Vec<Purchase>> {
        let now = self.clock.now();
        let pending = self.purchase_repo.find_unrated_by_user(user_id).await?;
        Ok(pending
            .into_iter()
            .filter(|p| days_between(p.purchase_date, now) <= self.window_days)
            .collect())
    }

    /// Rewrite the aggregate on the rated product or provider.
    async fn recompute(
        &self,
        target_id: &str,
        target_type: TargetType,
    ) -> AppResult<RatingSummary> {
        let summary = self.average(target_id, target_type).await?;
        let written = match target_type {
            TargetType::Product => {
                self.product_repo
                    .set_aggregate(target_id, summary.average, summary.count)
                    .await?
            }
            TargetType::Provider => {
                self.provider_repo
                    .set_aggregate(target_id, summary.average, summary.count)
                    .await?
            }
            TargetType::PointOfInterest | TargetType::Route => false,
        };
        if !written {
            debug!(target_id = %target_id, target_type = %target_type, "No aggregate to update");
        }
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rolapet_common::FixedClock;
    use rolapet_db::Store;
    use rolapet_db::entities::{Product, ProductKind};
    use std::collections::BTreeMap;

    struct Fixture {
        service: RatingService,
        products: ProductRepository,
        clock: Arc<FixedClock>,
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            provider_id: "prov1".to_string(),
            name: "Llanta".to_string(),
            description: String::new(),
            kind: ProductKind::Product,
            category: "Repuestos".to_string(),
            price: 50_000.0,
            currency: "COP".to_string(),
            images: vec![],
            is_available: true,
            stock: Some(10),
            rating: 0.0,
            review_count: 0,
            created_at: now(),
            updated_at: now(),
            features: vec![],
            specifications: BTreeMap::new(),
        }
    }

    async fn setup() -> Fixture {
        let store = Store::in_memory();
        let products = ProductRepository::new(&store);
        products.create(product("prod1")).await.unwrap();
        let clock = Arc::new(FixedClock::new(now()));
        let service = RatingService::new(
            RatingRepository::new(&store),
            PurchaseRepository::new(&store),
            products.clone(),
            ProviderRepository::new(&store),
            clock.clone(),
            &RatingConfig::default(),
        );
        Fixture {
            service,
            products,
            clock,
        }
    }

    fn input(value: i32, purchase_date: Option<DateTime<Utc>>) -> CreateRatingInput {
        CreateRatingInput {
            target_id: "prod1".to_string(),
            target_type: TargetType::Product,
            value,
            comment: Some("Buena".to_string()),
            purchase_date,
            images: vec![],
        }
    }

    #[tokio::test]
    async fn test_value_out_of_range() {
        let f = setup().await;

        for value in [0, 6, -1] {
            let result = f.service.create_rating("u1", input(value, None)).await;
            assert!(matches!(result, Err(AppError::Validation(_))), "value {value}");
        }
    }

    #[tokio::test]
    async fn test_window_boundary() {
        let f = setup().await;

        let ok = f
            .service
            .create_rating("u1", input(5, Some(now() - Duration::days(60))))
            .await;
        assert!(ok.is_ok());

        let expired = f
            .service
            .create_rating("u2", input(5, Some(now() - Duration::days(61))))
            .await;
        assert!(matches!(expired, Err(AppError::WindowExpired { window_days: 60 })));
    }

    #[tokio::test]
    async fn test_partial_day_rounds_up() {
        let f = setup().await;
        let date = now() - Duration::days(60) - Duration::hours(1);

        let result = f.service.create_rating("u1", input(4, Some(date))).await;

        assert!(matches!(result, Err(AppError::WindowExpired { .. })));
    }

    #[tokio::test]
    async fn test_window_ignored_for_providers() {
        let f = setup().await;
        let old = CreateRatingInput {
            target_id: "prov1".to_string(),
            target_type: TargetType::Provider,
            ..input(3, Some(now() - Duration::days(400)))
        };

        assert!(f.service.create_rating("u1", old).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_rating_rejected() {
        let f = setup().await;
        f.service.create_rating("u1", input(5, None)).await.unwrap();

        let again = f.service.create_rating("u1", input(1, None)).await;

        assert!(matches!(again, Err(AppError::Duplicate(_))));
        assert_eq!(f.service.average("prod1", TargetType::Product).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_aggregate_is_mean_of_all_ratings() {
        let f = setup().await;
        for (user, value) in [("u1", 5), ("u2", 4), ("u3", 3)] {
            f.service.create_rating(user, input(value, None)).await.unwrap();
        }

        let stored = f.products.get_by_id("prod1").await.unwrap();

        assert!((stored.rating - 4.0).abs() < f64::EPSILON);
        assert_eq!(stored.review_count, 3);
    }

    #[tokio::test]
    async fn test_average_without_ratings() {
        let f = setup().await;

        let summary = f.service.average("nothing", TargetType::Route).await.unwrap();

        assert_eq!(summary, RatingSummary { average: 0.0, count: 0 });
    }

    #[tokio::test]
    async fn test_like_guards() {
        let f = setup().await;
        let rating = f.service.create_rating("u1", input(5, None)).await.unwrap();

        let liked = f.service.like_rating(&rating.id, "u2").await.unwrap();
        assert_eq!(liked.likes, 1);

        let twice = f.service.like_rating(&rating.id, "u2").await;
        assert!(matches!(twice, Err(AppError::AlreadyLiked(_))));

        let unliked = f.service.unlike_rating(&rating.id, "u2").await.unwrap();
        assert_eq!(unliked.likes, 0);

        let again = f.service.unlike_rating(&rating.id, "u2").await;
        assert!(matches!(again, Err(AppError::NotLiked(_))));

        let missing = f.service.like_rating("ghost", "u2").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rating_marks_purchase_and_clears_alert() {
        let f = setup().await;
        let purchase = f.service.register_purchase("u1", "prod1", "prov1").await.unwrap();
        assert_eq!(f.service.should_alert("u1").await.unwrap().len(), 1);

        f.clock.advance(Duration::days(3));
        f.service
            .create_rating("u1", input(5, Some(purchase.purchase_date)))
            .await
            .unwrap();

        assert!(f.service.should_alert("u1").await.unwrap().is_empty());
        assert!(f.service.purchases("u1").await.unwrap()[0].has_rated);
    }

    #[tokio::test]
    async fn test_alert_drops_expired_purchases() {
        let f = setup().await;
        f.service.register_purchase("u1", "prod1", "prov1").await.unwrap();

        f.clock.advance(Duration::days(61));

        assert!(f.service.should_alert("u1").await.unwrap().is_empty());
    }
}
