//! Catalog category.

use serde::{Deserialize, Serialize};

use super::ProductKind;

/// A product or service category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProductKind,
}
