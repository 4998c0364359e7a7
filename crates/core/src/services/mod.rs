//! Business logic services.

#![allow(missing_docs)]

pub mod cart;
pub mod catalog;
pub mod content;
pub mod map;
pub mod moderation;
pub mod rating;
pub mod user;
pub mod vehicle;
pub mod warning;

pub use cart::{CartService, CartTotal, CartUpdate};
pub use catalog::{
    CatalogService, ProductFilter, ProductUpdate, ProviderFilter, PublishProductInput,
    RegisterProviderInput,
};
pub use content::{ContentService, CreatePostInput, PostCreated, PostFilter, PostUpdate};
pub use map::{CreatePoiInput, CreateRouteInput, MapService, PoiFilter, RouteFilter};
pub use moderation::{
    BannedWordMatcher, ModerationAction, ModerationResult, ModerationService, Severity,
};
pub use rating::{CreateRatingInput, RatingService, RatingSummary};
pub use user::{RegisterUserInput, UserFilter, UserService, UserStats, UserUpdate};
pub use vehicle::{RegisterVehicleInput, VehicleService, VehicleUpdate};
pub use warning::{WarningOutcome, WarningService};
