//! `PostgreSQL` key-value backend.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rolapet_common::{AppError, AppResult};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    sea_query::{LikeExpr, OnConflict},
};
use serde_json::Value;

use super::KeyValueStore;
use crate::entities::kv_entry;

const LIKE_ESCAPE: char = '!';

/// `LIKE` pattern matching keys that start with `prefix` literally.
fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Key-value store backed by the `kv_entry` table.
#[derive(Clone)]
pub struct DatabaseStore {
    db: Arc<DatabaseConnection>,
    namespace: String,
}

impl DatabaseStore {
    /// Create a store over an open connection.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, namespace: &str) -> Self {
        Self {
            db,
            namespace: namespace.to_string(),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.namespace)
    }
}

#[async_trait]
impl KeyValueStore for DatabaseStore {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        let entry = kv_entry::Entity::find_by_id(self.full_key(key))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(entry.map(|e| e.value))
    }

    async fn set(&self, key: &str, value: Value) -> AppResult<()> {
        let model = kv_entry::ActiveModel {
            key: Set(self.full_key(key)),
            value: Set(value),
            updated_at: Set(Utc::now().into()),
        };

        kv_entry::Entity::insert(model)
            .on_conflict(
                OnConflict::column(kv_entry::Column::Key)
                    .update_columns([kv_entry::Column::Value, kv_entry::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        kv_entry::Entity::delete_by_id(self.full_key(key))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        let result = kv_entry::Entity::delete_many()
            .filter(kv_entry::Column::Key.like(
                LikeExpr::new(prefix_pattern(&self.namespace)).escape(LIKE_ESCAPE),
            ))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        tracing::debug!(
            namespace = %self.namespace,
            removed = result.rows_affected,
            "Cleared store namespace"
        );
        Ok(())
    }
}
