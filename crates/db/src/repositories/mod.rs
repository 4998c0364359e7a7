//! Repositories over the store's collections.
//!
//! Each repository owns a [`Table`](crate::store::Table) handle; every
//! method runs under that collection's lock.

mod banned_word;
mod cart;
mod catalog;
mod content;
mod deletion_request;
mod map;
mod purchase;
mod rating;
mod user;
mod vehicle;
mod warning;

pub use banned_word::BannedWordRepository;
pub use cart::{CartRepository, WishlistRepository};
pub use catalog::{CategoryRepository, ProductRepository, ProviderRepository};
pub use content::{CommentRepository, DELETED_AUTHOR_ID, PostRepository};
pub use deletion_request::DeletionRequestRepository;
pub use map::{PointOfInterestRepository, RouteRepository};
pub use purchase::PurchaseRepository;
pub use rating::RatingRepository;
pub use user::UserRepository;
pub use vehicle::VehicleRepository;
pub use warning::WarningLogRepository;
