//! Point of interest and route repositories.

use rolapet_common::{AppError, AppResult};

use crate::collections;
use crate::entities::{PointOfInterest, Route};
use crate::store::{Store, Table};

/// Point of interest repository.
#[derive(Clone)]
pub struct PointOfInterestRepository {
    table: Table<PointOfInterest>,
}

impl PointOfInterestRepository {
    /// Create a new point of interest repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::POINTS_OF_INTEREST),
        }
    }

    /// Find a point of interest by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<PointOfInterest>> {
        self.table.find(id).await
    }

    /// Get a point of interest by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<PointOfInterest> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Point of interest {id}")))
    }

    /// All points of interest.
    pub async fn all(&self) -> AppResult<Vec<PointOfInterest>> {
        self.table.all().await
    }

    /// Insert a point of interest.
    pub async fn create(&self, poi: PointOfInterest) -> AppResult<PointOfInterest> {
        self.table.insert(poi).await
    }

    /// Seed points unless the collection already holds some.
    pub async fn seed_if_empty(&self, pois: Vec<PointOfInterest>) -> AppResult<bool> {
        self.table
            .mutate(move |rows| {
                if !rows.is_empty() {
                    return Ok(false);
                }
                for poi in pois {
                    rows.push(poi)?;
                }
                Ok(true)
            })
            .await
    }
}

/// Route repository.
#[derive(Clone)]
pub struct RouteRepository {
    table: Table<Route>,
}

impl RouteRepository {
    /// Create a new route repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::ROUTES),
        }
    }

    /// Find a route by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Route>> {
        self.table.find(id).await
    }

    /// Get a route by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<Route> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Route {id}")))
    }

    /// All routes.
    pub async fn all(&self) -> AppResult<Vec<Route>> {
        self.table.all().await
    }

    /// Insert a route.
    pub async fn create(&self, route: Route) -> AppResult<Route> {
        self.table.insert(route).await
    }
}
