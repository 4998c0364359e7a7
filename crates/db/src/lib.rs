//! Persistence layer for rolapet-rs.
//!
//! Every collection is a JSON document held by a [`store::KeyValueStore`]
//! (in memory, or a `PostgreSQL` key/value table through sea-orm). The
//! [`store::Store`] hands out locked [`store::Table`] handles so each
//! read-modify-write cycle on a collection is atomic.

pub mod collections;
pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod store;
pub mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use rolapet_common::{AppError, config::StoreBackend, config::StoreConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::log::LevelFilter;

pub use store::{DatabaseStore, KeyValueStore, MemoryStore, Store};

/// Initialize database connection.
pub async fn init(config: &StoreConfig) -> Result<DatabaseConnection, AppError> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("store.database_url is required".to_string()))?;

    let mut opt = ConnectOptions::new(url);

    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))
}

/// Open the configured store backend.
///
/// The database backend connects and runs migrations before returning.
pub async fn open_store(config: &StoreConfig) -> Result<Store, AppError> {
    let kv: Arc<dyn KeyValueStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new(&config.namespace)),
        StoreBackend::Database => {
            let db = init(config).await?;
            migrate(&db).await?;
            tracing::info!("Database store ready");
            Arc::new(DatabaseStore::new(Arc::new(db), &config.namespace))
        }
    };

    Ok(Store::new(kv))
}
