//! Common utilities and shared types for rolapet-rs.
//!
//! This crate provides foundational components used across all rolapet-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Result envelope**: The caller-facing `{ success, message, data }` shape via [`Envelope`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Time**: An injectable [`Clock`] so rating windows and warning dates are testable
//! - **Logging**: `tracing` subscriber bootstrap via [`logging::init`]
//!
//! # Example
//!
//! ```no_run
//! use rolapet_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     rolapet_common::logging::init(&config.logging);
//!     let id = IdGenerator::new().generate();
//!     println!("Generated ID: {id}");
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod id;
pub mod logging;
pub mod response;

pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use response::Envelope;
