//! Logical collection names used as store keys.

#![allow(missing_docs)]

pub const USERS: &str = "users";
pub const WARNINGS: &str = "warnings";
pub const BANNED_WORDS: &str = "bannedWords";
pub const RATINGS: &str = "ratings";
pub const PURCHASES: &str = "purchases";
pub const PROVIDERS: &str = "providers";
pub const PRODUCTS: &str = "products";
pub const CATEGORIES: &str = "categories";
pub const POSTS: &str = "posts";
pub const COMMENTS: &str = "comments";
pub const CART: &str = "cart";
pub const WISHLIST: &str = "wishlist";
pub const VEHICLES: &str = "vehicles";
pub const POINTS_OF_INTEREST: &str = "pointsOfInterest";
pub const ROUTES: &str = "routes";
pub const DELETION_REQUESTS: &str = "deletionRequests";
