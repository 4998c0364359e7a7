//! Error types for rolapet-rs.

use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Expected failures ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Ratings are only accepted within {window_days} days of the purchase")]
    WindowExpired { window_days: i64 },

    #[error("Already liked: {0}")]
    AlreadyLiked(String),

    #[error("Not liked: {0}")]
    NotLiked(String),

    #[error("{}", auto_moderation_message(.banned))]
    AutoModerated {
        /// Whether the author was banned as part of the rejection.
        banned: bool,
        /// Banned words found in the content.
        flagged: Vec<String>,
    },

    // === Infrastructure failures ===
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn auto_moderation_message(banned: &bool) -> &'static str {
    if *banned {
        "Content rejected: you have been banned for inappropriate language"
    } else {
        "Content rejected: it contains banned words"
    }
}

impl AppError {
    /// Returns the error code for result envelopes.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Duplicate(_) => "DUPLICATE",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::WindowExpired { .. } => "WINDOW_EXPIRED",
            Self::AlreadyLiked(_) => "ALREADY_LIKED",
            Self::NotLiked(_) => "NOT_LIKED",
            Self::AutoModerated { banned: true, .. } => "AUTO_BANNED",
            Self::AutoModerated { banned: false, .. } => "CONTENT_BLOCKED",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this is an expected, caller-facing failure
    /// (validation, lookups, duplicates, moderation) rather than an
    /// infrastructure fault.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        !matches!(
            self,
            Self::Storage(_) | Self::Serialization(_) | Self::Config(_) | Self::Internal(_)
        )
    }

    /// Returns whether this is a not-found failure of any kind.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::UserNotFound(_))
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
