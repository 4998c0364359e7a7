//! Vehicle registration and ownership.

use chrono::Datelike;
use rolapet_common::{AppError, AppResult, IdGenerator, SharedClock};
use rolapet_db::entities::{Vehicle, VehicleKind};
use rolapet_db::repositories::{UserRepository, VehicleRepository};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

const MIN_YEAR: i32 = 1900;

/// Input for registering a vehicle.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVehicleInput {
    #[serde(rename = "type")]
    pub kind: VehicleKind,
    #[validate(length(min = 1, max = 100, message = "Brand is required"))]
    pub brand: String,
    #[validate(length(min = 1, max = 100, message = "Model is required"))]
    pub model: String,
    pub year: i32,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub serial_number: Option<String>,
    #[serde(default = "default_electric")]
    pub is_electric: bool,
    pub battery_capacity: Option<String>,
    #[validate(range(min = 0.0))]
    pub max_speed: Option<f64>,
    #[serde(rename = "range")]
    #[validate(range(min = 0.0))]
    pub range_km: Option<f64>,
    #[serde(default)]
    pub photos: Vec<String>,
}

const fn default_electric() -> bool {
    true
}

/// Changes to a vehicle. `None` leaves the field as is.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdate {
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub battery_capacity: Option<String>,
    #[validate(range(min = 0.0))]
    pub max_speed: Option<f64>,
    #[serde(rename = "range")]
    #[validate(range(min = 0.0))]
    pub range_km: Option<f64>,
    pub photos: Option<Vec<String>>,
}

/// Vehicle service.
#[derive(Clone)]
pub struct VehicleService {
    vehicle_repo: VehicleRepository,
    user_repo: UserRepository,
    clock: SharedClock,
    id_gen: IdGenerator,
}

impl VehicleService {
    /// Create a new vehicle service.
    #[must_use]
    pub const fn new(
        vehicle_repo: VehicleRepository,
        user_repo: UserRepository,
        clock: SharedClock,
    ) -> Self {
        Self {
            vehicle_repo,
            user_repo,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a vehicle and link it to its owner.
    pub async fn register_vehicle(
        &self,
        user_id: &str,
        input: RegisterVehicleInput,
    ) -> AppResult<Vehicle> {
        input.validate()?;
        let now = self.clock.now();
        let max_year = now.year() + 1;
        if !(MIN_YEAR..=max_year).contains(&input.year) {
            return Err(AppError::Validation(format!(
                "Year must be between {MIN_YEAR} and {max_year}"
            )));
        }
        self.user_repo.get_by_id(user_id).await?;

        let vehicle = self
            .vehicle_repo
            .create(Vehicle {
                id: self.id_gen.generate(),
                user_id: user_id.to_string(),
                kind: input.kind,
                brand: input.brand.trim().to_string(),
                model: input.model.trim().to_string(),
                year: input.year,
                color: input.color,
                license_plate: input.license_plate,
                serial_number: input.serial_number,
                is_electric: input.is_electric,
                battery_capacity: input.battery_capacity,
                max_speed: input.max_speed,
                range_km: input.range_km,
                photos: input.photos,
                registration_date: now,
                is_active: true,
            })
            .await?;

        self.link(user_id, &vehicle.id).await?;

        info!(vehicle_id = %vehicle.id, user_id = %user_id, "Vehicle registered");
        Ok(vehicle)
    }

    /// Link an owned vehicle to the user's profile. Linking twice is a no-op.
    pub async fn link_vehicle(&self, user_id: &str, vehicle_id: &str) -> AppResult<()> {
        let vehicle = self.vehicle_repo.get_by_id(vehicle_id).await?;
        if vehicle.user_id != user_id {
            return Err(AppError::Forbidden(
                "Vehicle belongs to another user".to_string(),
            ));
        }
        self.link(user_id, vehicle_id).await
    }

    /// Active vehicles of a user.
    pub async fn user_vehicles(&self, user_id: &str) -> AppResult<Vec<Vehicle>> {
        self.vehicle_repo.find_active_by_user(user_id).await
    }

    /// Look up a vehicle by ID.
    pub async fn get_vehicle(&self, vehicle_id: &str) -> AppResult<Vehicle> {
        self.vehicle_repo.get_by_id(vehicle_id).await
    }

    /// Patch a vehicle owned by `user_id`.
    pub async fn update_vehicle(
        &self,
        vehicle_id: &str,
        user_id: &str,
        update: VehicleUpdate,
    ) -> AppResult<Vehicle> {
        update.validate()?;
        self.vehicle_repo
            .update(vehicle_id, |vehicle| {
                if vehicle.user_id != user_id {
                    return Err(AppError::Forbidden(
                        "Vehicle belongs to another user".to_string(),
                    ));
                }
                if let Some(color) = update.color {
                    vehicle.color = Some(color);
                }
                if let Some(plate) = update.license_plate {
                    vehicle.license_plate = Some(plate);
                }
                if let Some(battery) = update.battery_capacity {
                    vehicle.battery_capacity = Some(battery);
                }
                if let Some(speed) = update.max_speed {
                    vehicle.max_speed = Some(speed);
                }
                if let Some(range) = update.range_km {
                    vehicle.range_km = Some(range);
                }
                if let Some(photos) = update.photos {
                    vehicle.photos = photos;
                }
                Ok(vehicle.clone())
            })
            .await
    }

    /// Deactivate a vehicle and unlink it from its owner.
    pub async fn delete_vehicle(&self, vehicle_id: &str, user_id: &str) -> AppResult<()> {
        self.vehicle_repo
            .update(vehicle_id, |vehicle| {
                if vehicle.user_id != user_id {
                    return Err(AppError::Forbidden(
                        "Vehicle belongs to another user".to_string(),
                    ));
                }
                vehicle.is_active = false;
                Ok(())
            })
            .await?;

        self.user_repo
            .update(user_id, |user| {
                user.vehicles.retain(|id| id != vehicle_id);
                Ok(())
            })
            .await?;

        info!(vehicle_id = %vehicle_id, user_id = %user_id, "Vehicle deleted");
        Ok(())
    }

    async fn link(&self, user_id: &str, vehicle_id: &str) -> AppResult<()> {
        self.user_repo
            .update(user_id, |user| {
                if !user.vehicles.iter().any(|id| id == vehicle_id) {
                    user.vehicles.push(vehicle_id.to_string());
                }
                Ok(())
            })
            .await
    }
}
