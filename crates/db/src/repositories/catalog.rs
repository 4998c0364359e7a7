//! Provider, product and category repositories.

use rolapet_common::{AppError, AppResult};

use crate::collections;
use crate::entities::{Category, Product, Provider, RatedTarget};
use crate::store::{Store, Table};

/// Provider repository.
#[derive(Clone)]
pub struct ProviderRepository {
    table: Table<Provider>,
}

impl ProviderRepository {
    /// Create a new provider repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::PROVIDERS),
        }
    }

    /// Find a provider by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Provider>> {
        self.table.find(id).await
    }

    /// Get a provider by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<Provider> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Provider {id}")))
    }

    /// All providers in registration order.
    pub async fn all(&self) -> AppResult<Vec<Provider>> {
        self.table.all().await
    }

    /// Insert a provider. The email must be unused.
    pub async fn create(&self, provider: Provider) -> AppResult<Provider> {
        self.table
            .mutate(move |rows| {
                if rows.find(|p| p.email == provider.email).is_some() {
                    return Err(AppError::Duplicate(format!(
                        "provider email {}",
                        provider.email
                    )));
                }
                rows.push(provider.clone())?;
                Ok(provider)
            })
            .await
    }

    /// Apply `f` to a provider, failing with `NotFound` if absent.
    pub async fn update<R, F>(&self, id: &str, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut Provider) -> AppResult<R>,
    {
        self.table
            .update(id, f)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Provider {id}")))
    }

    /// Write a recomputed rating aggregate. Returns whether the provider exists.
    pub async fn set_aggregate(&self, id: &str, average: f64, count: usize) -> AppResult<bool> {
        let updated = self
            .table
            .update(id, |p| {
                p.set_aggregate(average, count);
                Ok(())
            })
            .await?;
        Ok(updated.is_some())
    }
}

/// Product repository.
#[derive(Clone)]
pub struct ProductRepository {
    table: Table<Product>,
}

impl ProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::PRODUCTS),
        }
    }

    /// Find a product by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Product>> {
        self.table.find(id).await
    }

    /// Get a product by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<Product> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {id}")))
    }

    /// All products in publication order.
    pub async fn all(&self) -> AppResult<Vec<Product>> {
        self.table.all().await
    }

    /// Products published by one provider.
    pub async fn find_by_provider(&self, provider_id: &str) -> AppResult<Vec<Product>> {
        self.table.filter(|p| p.provider_id == provider_id).await
    }

    /// Insert a product.
    pub async fn create(&self, product: Product) -> AppResult<Product> {
        self.table.insert(product).await
    }

    /// Apply `f` to a product, failing with `NotFound` if absent.
    pub async fn update<R, F>(&self, id: &str, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut Product) -> AppResult<R>,
    {
        self.table
            .update(id, f)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {id}")))
    }

    /// Write a recomputed rating aggregate. Returns whether the product exists.
    pub async fn set_aggregate(&self, id: &str, average: f64, count: usize) -> AppResult<bool> {
        let updated = self
            .table
            .update(id, |p| {
                p.set_aggregate(average, count);
                Ok(())
            })
            .await?;
        Ok(updated.is_some())
    }
}

/// Category repository.
#[derive(Clone)]
pub struct CategoryRepository {
    table: Table<Category>,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::CATEGORIES),
        }
    }

    /// All categories.
    pub async fn all(&self) -> AppResult<Vec<Category>> {
        self.table.all().await
    }

    /// Seed categories if the collection has never been written.
    pub async fn init_if_absent(&self, categories: Vec<Category>) -> AppResult<bool> {
        self.table.init_if_absent(categories).await
    }
}
