//! Stored records.
//!
//! `kv_entry` is the only sea-orm entity; everything else is a serde
//! record kept inside a JSON collection.

pub mod cart;
pub mod category;
pub mod comment;
pub mod deletion_request;
pub mod kv_entry;
pub mod map;
pub mod post;
pub mod product;
pub mod provider;
pub mod purchase;
pub mod rating;
pub mod user;
pub mod vehicle;
pub mod warning;

pub use cart::{CartItem, WishlistEntry};
pub use category::Category;
pub use comment::{Comment, CommentNode};
pub use deletion_request::{DeletionRequest, DeletionStatus};
pub use map::{Difficulty, Location, PoiKind, PointOfInterest, Route, RouteKind, Waypoint};
pub use post::{MediaType, Post, PostKind};
pub use product::{Product, ProductKind};
pub use provider::{GeoPoint, Provider, ProviderKind};
pub use purchase::Purchase;
pub use rating::{Rating, TargetType};
pub use user::{Role, User};
pub use vehicle::{Vehicle, VehicleKind};
pub use warning::{Warning, WarningLogEntry};

/// A record carrying a derived rating aggregate.
pub trait RatedTarget {
    /// Overwrite the aggregate with a fresh average and count.
    fn set_aggregate(&mut self, average: f64, count: usize);
}

/// Implements [`crate::store::Record`] for records keyed by an `id` field.
macro_rules! impl_record {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::store::Record for $ty {
                fn id(&self) -> &str {
                    &self.id
                }
            }
        )*
    };
}

impl_record!(
    CartItem,
    WishlistEntry,
    Category,
    Comment,
    DeletionRequest,
    PointOfInterest,
    Route,
    Post,
    Product,
    Provider,
    Purchase,
    Rating,
    User,
    Vehicle,
);

impl crate::store::Record for WarningLogEntry {
    fn id(&self) -> &str {
        &self.warning.id
    }
}
