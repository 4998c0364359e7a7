//! Application context: every service, built once over one store.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rolapet_common::{AppResult, Config, SharedClock, SystemClock};
use rolapet_db::Store;
use rolapet_db::entities::{Category, ProductKind, Role, User};
use rolapet_db::repositories::{
    BannedWordRepository, CartRepository, CategoryRepository, CommentRepository,
    DeletionRequestRepository, PointOfInterestRepository, PostRepository, ProductRepository,
    ProviderRepository, PurchaseRepository, RatingRepository, RouteRepository, UserRepository,
    VehicleRepository, WarningLogRepository, WishlistRepository,
};
use tracing::info;

use crate::services::{
    CartService, CatalogService, ContentService, MapService, ModerationService, RatingService,
    UserService, VehicleService, WarningService,
};

/// ID of the administrator account present in a fresh install.
pub const ADMIN_USER_ID: &str = "1";

/// Services sharing one store, clock and configuration.
#[derive(Clone)]
pub struct AppContext {
    pub store: Store,
    pub config: Config,
    pub clock: SharedClock,
    pub warnings: WarningService,
    pub moderation: ModerationService,
    pub ratings: RatingService,
    pub content: ContentService,
    pub catalog: CatalogService,
    pub cart: CartService,
    pub vehicles: VehicleService,
    pub map: MapService,
    pub users: UserService,
    user_repo: UserRepository,
    banned_word_repo: BannedWordRepository,
    category_repo: CategoryRepository,
}

impl AppContext {
    /// Build every service over `store`.
    #[must_use]
    pub fn new(store: Store, config: Config, clock: SharedClock) -> Self {
        let user_repo = UserRepository::new(&store);
        let banned_word_repo = BannedWordRepository::new(&store);
        let category_repo = CategoryRepository::new(&store);
        let product_repo = ProductRepository::new(&store);
        let provider_repo = ProviderRepository::new(&store);
        let post_repo = PostRepository::new(&store);
        let comment_repo = CommentRepository::new(&store);
        let vehicle_repo = VehicleRepository::new(&store);

        let warnings = WarningService::new(
            user_repo.clone(),
            WarningLogRepository::new(&store),
            Arc::clone(&clock),
            &config.moderation,
        );
        let moderation = ModerationService::new(banned_word_repo.clone(), warnings.clone());
        let ratings = RatingService::new(
            RatingRepository::new(&store),
            PurchaseRepository::new(&store),
            product_repo.clone(),
            provider_repo.clone(),
            Arc::clone(&clock),
            &config.rating,
        );
        let content = ContentService::new(
            post_repo.clone(),
            comment_repo.clone(),
            user_repo.clone(),
            moderation.clone(),
            Arc::clone(&clock),
        );
        let catalog = CatalogService::new(
            provider_repo,
            product_repo.clone(),
            category_repo.clone(),
            Arc::clone(&clock),
        );
        let cart = CartService::new(
            CartRepository::new(&store),
            WishlistRepository::new(&store),
            product_repo,
            ratings.clone(),
            Arc::clone(&clock),
        );
        let vehicles =
            VehicleService::new(vehicle_repo.clone(), user_repo.clone(), Arc::clone(&clock));
        let map = MapService::new(
            PointOfInterestRepository::new(&store),
            RouteRepository::new(&store),
            Arc::clone(&clock),
            &config.map,
        );
        let users = UserService::new(
            user_repo.clone(),
            DeletionRequestRepository::new(&store),
            vehicle_repo,
            post_repo,
            comment_repo,
            Arc::clone(&clock),
        );

        Self {
            store,
            config,
            clock,
            warnings,
            moderation,
            ratings,
            content,
            catalog,
            cart,
            vehicles,
            map,
            users,
            user_repo,
            banned_word_repo,
            category_repo,
        }
    }

    /// Open the configured store backend and build the context on the wall clock.
    pub async fn open(config: Config) -> AppResult<Self> {
        let store = rolapet_db::open_store(&config.store).await?;
        info!(backend = ?config.store.backend, namespace = %config.store.namespace, "Store opened");
        Ok(Self::new(store, config, Arc::new(SystemClock)))
    }

    /// Seed collections that have never been written: the admin account,
    /// the banned words, the categories and the default points of interest.
    pub async fn seed_defaults(&self) -> AppResult<()> {
        let admin = self.user_repo.init_if_absent(vec![default_admin()]).await?;
        let words = self
            .banned_word_repo
            .init_if_absent(&self.config.moderation.default_banned_words)
            .await?;
        let categories = self.category_repo.init_if_absent(default_categories()).await?;
        let pois = self.map.seed_defaults().await?;

        info!(admin, words, categories, pois, "Defaults seeded");
        Ok(())
    }

    /// Delete everything in the namespace and seed the defaults again.
    pub async fn reset(&self) -> AppResult<()> {
        self.store.clear().await?;
        info!("Store cleared");
        self.seed_defaults().await
    }
}

fn default_admin() -> User {
    User {
        id: ADMIN_USER_ID.to_string(),
        email: "admin@rolapet.com".to_string(),
        username: "admin".to_string(),
        name: "Administrador Rola PET".to_string(),
        role: Role::Admin,
        is_active: true,
        created_at: epoch(),
        vehicles: vec![],
        warnings: vec![],
        is_of_age: true,
        document_id: None,
        legal_consent: None,
        phone: None,
        address: None,
        profile_image: None,
    }
}

fn default_categories() -> Vec<Category> {
    [
        ("1", "Repuestos", ProductKind::Product),
        ("2", "Accesorios", ProductKind::Product),
        ("3", "Mantenimiento", ProductKind::Service),
        ("4", "Reparación", ProductKind::Service),
        ("5", "Seguridad", ProductKind::Product),
    ]
    .into_iter()
    .map(|(id, name, kind)| Category {
        id: id.to_string(),
        name: name.to_string(),
        kind,
    })
    .collect()
}

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().unwrap_or_default()
}
