//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Persistent store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Content moderation configuration.
    #[serde(default)]
    pub moderation: ModerationConfig,
    /// Rating configuration.
    #[serde(default)]
    pub rating: RatingConfig,
    /// Map configuration.
    #[serde(default)]
    pub map: MapConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which key-value backend holds the collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map; contents are lost on exit.
    #[default]
    Memory,
    /// `PostgreSQL` table of JSON documents.
    Database,
}

/// Persistent store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Backend to use.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Prefix applied to every key.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// `PostgreSQL` connection URL (database backend only).
    #[serde(default)]
    pub database_url: Option<String>,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Content moderation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationConfig {
    /// Accumulated warnings that deactivate an account.
    #[serde(default = "default_max_warnings")]
    pub max_warnings_before_ban: usize,
    /// Whether warnings issued by the moderation engine count toward the ban threshold.
    #[serde(default = "default_true")]
    pub automated_warnings_count_toward_ban: bool,
    /// Banned words seeded into an empty store.
    #[serde(default = "default_banned_words")]
    pub default_banned_words: Vec<String>,
}

/// Rating configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatingConfig {
    /// Days after a purchase during which the product may be rated.
    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

/// Map configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    /// Latitude of the simulated location centre.
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,
    /// Longitude of the simulated location centre.
    #[serde(default = "default_center_lng")]
    pub center_lng: f64,
    /// Delay before the simulated location lookup resolves.
    #[serde(default = "default_location_delay_ms")]
    pub location_delay_ms: u64,
    /// Total spread, in degrees, of the simulated location around the centre.
    #[serde(default = "default_location_jitter")]
    pub location_jitter_deg: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_namespace() -> String {
    "rolapet_".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_min_connections() -> u32 {
    1
}

const fn default_max_warnings() -> usize {
    3
}

const fn default_true() -> bool {
    true
}

fn default_banned_words() -> Vec<String> {
    [
        "odio",
        "violencia",
        "discriminación",
        "amenaza",
        "insulto",
        "agresión",
        "racismo",
        "xenofobia",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

const fn default_window_days() -> i64 {
    60
}

// Bogotá, D.C.
const fn default_center_lat() -> f64 {
    4.6097
}

const fn default_center_lng() -> f64 {
    -74.0817
}

const fn default_location_delay_ms() -> u64 {
    500
}

const fn default_location_jitter() -> f64 {
    0.1
}

fn default_log_filter() -> String {
    "rolapet=info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            namespace: default_namespace(),
            database_url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            max_warnings_before_ban: default_max_warnings(),
            automated_warnings_count_toward_ban: true,
            default_banned_words: default_banned_words(),
        }
    }
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_lng: default_center_lng(),
            location_delay_ms: default_location_delay_ms(),
            location_jitter_deg: default_location_jitter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `ROLAPET_ENV`)
    /// 4. Environment variables with `ROLAPET__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("ROLAPET_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ROLAPET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("ROLAPET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.namespace, "rolapet_");
        assert_eq!(config.moderation.max_warnings_before_ban, 3);
        assert!(config.moderation.automated_warnings_count_toward_ban);
        assert_eq!(config.moderation.default_banned_words.len(), 8);
        assert_eq!(config.rating.window_days, 60);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let source = r#"
            [store]
            backend = "database"
            database_url = "postgres://localhost/rolapet"

            [rating]
            window_days = 30
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.store.backend, StoreBackend::Database);
        assert_eq!(
            config.store.database_url.as_deref(),
            Some("postgres://localhost/rolapet")
        );
        assert_eq!(config.rating.window_days, 30);
        assert_eq!(config.moderation.max_warnings_before_ban, 3);
        assert_eq!(config.logging.filter, "rolapet=info");
    }
}
