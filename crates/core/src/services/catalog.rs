//! Marketplace catalog: providers, their products and categories.

use std::collections::BTreeMap;

use rolapet_common::{AppError, AppResult, IdGenerator, SharedClock};
use rolapet_db::entities::{Category, GeoPoint, Product, ProductKind, Provider, ProviderKind};
use rolapet_db::repositories::{CategoryRepository, ProductRepository, ProviderRepository};
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;

use crate::geo::Radius;

/// Input for registering a provider.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProviderInput {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    #[serde(default)]
    pub categories: Vec<String>,
    pub user_id: Option<String>,
    pub logo: Option<String>,
    pub location: Option<GeoPoint>,
}

/// Provider search. Only enabled providers are ever returned.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFilter {
    #[serde(rename = "type")]
    pub kind: Option<ProviderKind>,
    pub category: Option<String>,
    pub min_rating: Option<f64>,
    pub search: Option<String>,
    pub near: Option<Radius>,
}

impl ProviderFilter {
    fn matches(&self, provider: &Provider) -> bool {
        if let Some(kind) = self.kind {
            if provider.kind != kind && provider.kind != ProviderKind::Both {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !provider.categories.iter().any(|c| c == category) {
                return false;
            }
        }
        if self.min_rating.is_some_and(|min| provider.rating < min) {
            return false;
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = provider.name.to_lowercase().contains(&term)
                || provider.description.to_lowercase().contains(&term)
                || provider
                    .categories
                    .iter()
                    .any(|c| c.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        if let Some(near) = &self.near {
            return provider.location.is_some_and(|at| near.contains(at));
        }
        true
    }
}

/// Input for publishing a product or service.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PublishProductInput {
    pub provider_id: String,
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ProductKind,
    #[serde(default)]
    pub category: String,
    #[validate(range(exclusive_min = 0.0, message = "Price must be positive"))]
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub stock: Option<u32>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

fn default_currency() -> String {
    "COP".to_string()
}

/// Changes to a product. Rating aggregates are not patchable.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "Price must be positive"))]
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub is_available: Option<bool>,
    pub stock: Option<u32>,
    pub features: Option<Vec<String>>,
    pub specifications: Option<BTreeMap<String, String>>,
}

/// Product search. Empty fields do not filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    #[serde(rename = "type")]
    pub kind: Option<ProductKind>,
    pub category: Option<String>,
    pub provider_id: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    pub search: Option<String>,
    #[serde(default)]
    pub only_available: bool,
}

impl ProductFilter {
    fn matches(&self, product: &Product) -> bool {
        if self.kind.is_some_and(|kind| product.kind != kind) {
            return false;
        }
        if self.category.as_ref().is_some_and(|c| *c != product.category) {
            return false;
        }
        if self.provider_id.as_ref().is_some_and(|p| *p != product.provider_id) {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min)
            || self.max_price.is_some_and(|max| product.price > max)
        {
            return false;
        }
        if self.min_rating.is_some_and(|min| product.rating < min) {
            return false;
        }
        if self.only_available && !product.is_available {
            return false;
        }
        self.search.as_ref().is_none_or(|term| {
            let term = term.to_lowercase();
            product.name.to_lowercase().contains(&term)
                || product.description.to_lowercase().contains(&term)
        })
    }
}

/// Catalog service.
#[derive(Clone)]
pub struct CatalogService {
    provider_repo: ProviderRepository,
    product_repo: ProductRepository,
    category_repo: CategoryRepository,
    clock: SharedClock,
    id_gen: IdGenerator,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(
        provider_repo: ProviderRepository,
        product_repo: ProductRepository,
        category_repo: CategoryRepository,
        clock: SharedClock,
    ) -> Self {
        Self {
            provider_repo,
            product_repo,
            category_repo,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a provider. It starts disabled until an admin enables it.
    pub async fn register_provider(&self, input: RegisterProviderInput) -> AppResult<Provider> {
        input.validate()?;

        let provider = self
            .provider_repo
            .create(Provider {
                id: self.id_gen.generate(),
                name: input.name,
                email: input.email.to_lowercase(),
                phone: input.phone,
                address: input.address,
                description: input.description,
                kind: input.kind,
                categories: input.categories,
                is_enabled: false,
                registration_date: self.clock.now(),
                user_id: input.user_id,
                logo: input.logo,
                photos: vec![],
                rating: 0.0,
                review_count: 0,
                location: input.location,
            })
            .await?;

        info!(provider_id = %provider.id, email = %provider.email, "Provider registered");
        Ok(provider)
    }

    /// Enable a provider.
    pub async fn enable_provider(&self, provider_id: &str) -> AppResult<Provider> {
        self.set_enabled(provider_id, true).await
    }

    /// Disable a provider.
    pub async fn disable_provider(&self, provider_id: &str) -> AppResult<Provider> {
        self.set_enabled(provider_id, false).await
    }

    async fn set_enabled(&self, provider_id: &str, enabled: bool) -> AppResult<Provider> {
        let provider = self
            .provider_repo
            .update(provider_id, |p| {
                p.is_enabled = enabled;
                Ok(p.clone())
            })
            .await?;

        info!(provider_id = %provider_id, enabled, "Provider availability changed");
        Ok(provider)
    }

    /// Change what a provider offers.
    pub async fn update_provider_kind(
        &self,
        provider_id: &str,
        kind: ProviderKind,
    ) -> AppResult<Provider> {
        self.provider_repo
            .update(provider_id, |p| {
                p.kind = kind;
                Ok(p.clone())
            })
            .await
    }

    /// Look up a provider by ID.
    pub async fn get_provider(&self, provider_id: &str) -> AppResult<Provider> {
        self.provider_repo.get_by_id(provider_id).await
    }

    /// All providers, or only the enabled ones.
    pub async fn list_providers(&self, only_enabled: bool) -> AppResult<Vec<Provider>> {
        let providers = self.provider_repo.all().await?;
        Ok(providers
            .into_iter()
            .filter(|p| !only_enabled || p.is_enabled)
            .collect())
    }

    /// Enabled providers matching `filter`.
    pub async fn filter_providers(&self, filter: &ProviderFilter) -> AppResult<Vec<Provider>> {
        let providers = self.list_providers(true).await?;
        let found: Vec<Provider> = providers.into_iter().filter(|p| filter.matches(p)).collect();
        debug!(count = found.len(), "Providers filtered");
        Ok(found)
    }

    /// Publish a product for an enabled provider.
    pub async fn publish_product(&self, input: PublishProductInput) -> AppResult<Product> {
        input.validate()?;
        let provider = self.provider_repo.get_by_id(&input.provider_id).await?;
        if !provider.is_enabled {
            return Err(AppError::Forbidden(
                "Provider is not enabled".to_string(),
            ));
        }

        let now = self.clock.now();
        let product = self
            .product_repo
            .create(Product {
                id: self.id_gen.generate(),
                provider_id: provider.id,
                name: input.name,
                description: input.description,
                kind: input.kind,
                category: input.category,
                price: input.price,
                currency: input.currency,
                images: input.images,
                is_available: true,
                stock: input.stock,
                rating: 0.0,
                review_count: 0,
                created_at: now,
                updated_at: now,
                features: input.features,
                specifications: input.specifications,
            })
            .await?;

        info!(product_id = %product.id, provider_id = %product.provider_id, "Product published");
        Ok(product)
    }

    /// Edit a product owned by `provider_id`.
    pub async fn update_product(
        &self,
        product_id: &str,
        provider_id: &str,
        update: ProductUpdate,
    ) -> AppResult<Product> {
        update.validate()?;
        let now = self.clock.now();

        let product = self
            .product_repo
            .update(product_id, |product| {
                if product.provider_id != provider_id {
                    return Err(AppError::Forbidden(
                        "Product belongs to another provider".to_string(),
                    ));
                }
                if let Some(name) = update.name {
                    product.name = name;
                }
                if let Some(description) = update.description {
                    product.description = description;
                }
                if let Some(category) = update.category {
                    product.category = category;
                }
                if let Some(price) = update.price {
                    product.price = price;
                }
                if let Some(images) = update.images {
                    product.images = images;
                }
                if let Some(is_available) = update.is_available {
                    product.is_available = is_available;
                }
                if let Some(stock) = update.stock {
                    product.stock = Some(stock);
                }
                if let Some(features) = update.features {
                    product.features = features;
                }
                if let Some(specifications) = update.specifications {
                    product.specifications = specifications;
                }
                product.updated_at = now;
                Ok(product.clone())
            })
            .await?;

        info!(product_id = %product_id, provider_id = %provider_id, "Product updated");
        Ok(product)
    }

    /// Look up a product by ID.
    pub async fn get_product(&self, product_id: &str) -> AppResult<Product> {
        self.product_repo.get_by_id(product_id).await
    }

    /// Products published by one provider.
    pub async fn provider_products(&self, provider_id: &str) -> AppResult<Vec<Product>> {
        self.product_repo.find_by_provider(provider_id).await
    }

    /// Products matching `filter`.
    pub async fn products(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        let products = self.product_repo.all().await?;
        Ok(products.into_iter().filter(|p| filter.matches(p)).collect())
    }

    /// Product and service categories.
    pub async fn categories(&self) -> AppResult<Vec<Category>> {
        self.category_repo.all().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rolapet_common::FixedClock;
    use rolapet_db::Store;
    use std::sync::Arc;

    fn service() -> CatalogService {
        let store = Store::in_memory();
        CatalogService::new(
            ProviderRepository::new(&store),
            ProductRepository::new(&store),
            CategoryRepository::new(&store),
            Arc::new(FixedClock::new(
                Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            )),
        )
    }

    fn provider_input(name: &str, email: &str, kind: ProviderKind) -> RegisterProviderInput {
        RegisterProviderInput {
            name: name.to_string(),
            email: email.to_string(),
            phone: String::new(),
            address: String::new(),
            description: "Motos y patinetas".to_string(),
            kind,
            categories: vec!["Mantenimiento".to_string()],
            user_id: None,
            logo: None,
            location: None,
        }
    }

    fn product_input(provider_id: &str, price: f64) -> PublishProductInput {
        PublishProductInput {
            provider_id: provider_id.to_string(),
            name: "Casco".to_string(),
            description: "Casco certificado".to_string(),
            kind: ProductKind::Product,
            category: "Seguridad".to_string(),
            price,
            currency: default_currency(),
            images: vec![],
            stock: Some(3),
            features: vec![],
            specifications: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_register_provider_validation_and_duplicates() {
        let service = service();

        let bad = service
            .register_provider(provider_input("", "taller@rolapet.com", ProviderKind::Service))
            .await;
        assert!(matches!(bad, Err(AppError::Validation(_))));

        let provider = service
            .register_provider(provider_input(
                "Taller",
                "taller@rolapet.com",
                ProviderKind::Service,
            ))
            .await
            .unwrap();
        assert!(!provider.is_enabled);
        assert_eq!(provider.review_count, 0);

        let dup = service
            .register_provider(provider_input("Otro", "taller@rolapet.com", ProviderKind::Product))
            .await;
        assert!(matches!(dup, Err(AppError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_filter_providers_kind_both_matches_any() {
        let service = service();
        for (name, email, kind) in [
            ("A", "a@rolapet.com", ProviderKind::Service),
            ("B", "b@rolapet.com", ProviderKind::Product),
            ("C", "c@rolapet.com", ProviderKind::Both),
            ("D", "d@rolapet.com", ProviderKind::Both),
        ] {
            let p = service.register_provider(provider_input(name, email, kind)).await.unwrap();
            if name != "D" {
                service.enable_provider(&p.id).await.unwrap();
            }
        }

        let filter = ProviderFilter {
            kind: Some(ProviderKind::Service),
            ..ProviderFilter::default()
        };
        let names: Vec<String> = service
            .filter_providers(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();

        assert_eq!(names, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_filter_providers_by_radius() {
        let service = service();
        let mut near = provider_input("Cerca", "near@rolapet.com", ProviderKind::Service);
        near.location = Some(GeoPoint { lat: 4.6333, lng: -74.0640 });
        let mut far = provider_input("Lejos", "far@rolapet.com", ProviderKind::Service);
        far.location = Some(GeoPoint { lat: 6.2442, lng: -75.5812 });
        for input in [near, far] {
            let p = service.register_provider(input).await.unwrap();
            service.enable_provider(&p.id).await.unwrap();
        }

        let filter = ProviderFilter {
            near: Some(Radius {
                center: GeoPoint { lat: 4.6097, lng: -74.0817 },
                radius_km: 10.0,
            }),
            ..ProviderFilter::default()
        };
        let found = service.filter_providers(&filter).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Cerca");
    }

    #[tokio::test]
    async fn test_publish_requires_enabled_provider_and_price() {
        let service = service();
        let provider = service
            .register_provider(provider_input("Taller", "t@rolapet.com", ProviderKind::Product))
            .await
            .unwrap();

        let disabled = service.publish_product(product_input(&provider.id, 10.0)).await;
        assert!(matches!(disabled, Err(AppError::Forbidden(_))));

        service.enable_provider(&provider.id).await.unwrap();
        let free = service.publish_product(product_input(&provider.id, 0.0)).await;
        assert!(matches!(free, Err(AppError::Validation(_))));

        let missing = service.publish_product(product_input("ghost", 10.0)).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let product = service.publish_product(product_input(&provider.id, 10.0)).await.unwrap();
        assert_eq!(service.provider_products(&provider.id).await.unwrap(), vec![product]);
    }

    #[tokio::test]
    async fn test_update_product_owner_only() {
        let service = service();
        let provider = service
            .register_provider(provider_input("Taller", "t@rolapet.com", ProviderKind::Product))
            .await
            .unwrap();
        service.enable_provider(&provider.id).await.unwrap();
        let product = service.publish_product(product_input(&provider.id, 10.0)).await.unwrap();

        let update = ProductUpdate {
            price: Some(12.5),
            ..ProductUpdate::default()
        };
        let other = service.update_product(&product.id, "other", update.clone()).await;
        assert!(matches!(other, Err(AppError::Forbidden(_))));

        let updated = service.update_product(&product.id, &provider.id, update).await.unwrap();
        assert!((updated.price - 12.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_product_filter() {
        let service = service();
        let provider = service
            .register_provider(provider_input("Taller", "t@rolapet.com", ProviderKind::Product))
            .await
            .unwrap();
        service.enable_provider(&provider.id).await.unwrap();
        service.publish_product(product_input(&provider.id, 10.0)).await.unwrap();
        service.publish_product(product_input(&provider.id, 90.0)).await.unwrap();

        let filter = ProductFilter {
            max_price: Some(50.0),
            search: Some("CASCO".to_string()),
            ..ProductFilter::default()
        };

        assert_eq!(service.products(&filter).await.unwrap().len(), 1);
    }
}
