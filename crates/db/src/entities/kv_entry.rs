//! Key-value entry entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One namespaced collection stored as JSON.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "kv_entry")]
pub struct Model {
    /// Namespaced key, e.g. `rolapet_users`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub value: Json,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
