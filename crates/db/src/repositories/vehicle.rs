//! Vehicle repository.

use rolapet_common::{AppError, AppResult};

use crate::collections;
use crate::entities::Vehicle;
use crate::store::{Store, Table};

/// Vehicle repository.
#[derive(Clone)]
pub struct VehicleRepository {
    table: Table<Vehicle>,
}

impl VehicleRepository {
    /// Create a new vehicle repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::VEHICLES),
        }
    }

    /// Find a vehicle by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Vehicle>> {
        self.table.find(id).await
    }

    /// Get a vehicle by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<Vehicle> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {id}")))
    }

    /// Active vehicles owned by a user.
    pub async fn find_active_by_user(&self, user_id: &str) -> AppResult<Vec<Vehicle>> {
        self.table
            .filter(|v| v.user_id == user_id && v.is_active)
            .await
    }

    /// Insert a vehicle.
    pub async fn create(&self, vehicle: Vehicle) -> AppResult<Vehicle> {
        self.table.insert(vehicle).await
    }

    /// Apply `f` to a vehicle, failing with `NotFound` if absent.
    pub async fn update<R, F>(&self, id: &str, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut Vehicle) -> AppResult<R>,
    {
        self.table
            .update(id, f)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {id}")))
    }

    /// Delete every vehicle of a user. Returns how many were removed.
    pub async fn delete_by_user(&self, user_id: &str) -> AppResult<usize> {
        self.table
            .mutate(|rows| Ok(rows.retain(|v| v.user_id != user_id)))
            .await
    }
}
