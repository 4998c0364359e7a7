//! Core business logic for rolapet-rs.
//!
//! Services are plain structs over repositories, built once by
//! [`AppContext`] and shared by reference.

pub mod context;
pub mod geo;
pub mod services;

pub use context::AppContext;
pub use services::*;
