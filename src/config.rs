//! # Configuration
//!
//! Explicit, typed configuration for a reconciliation run. Loaded with
//! precedence: Env vars > Config file > Defaults. Nothing in this crate
//! reads the environment anywhere else; every tunable flows in through
//! [`ReconcileConfig`].
//!
//! # Example config file (tessmatch.toml)
//! ```toml
//! nearby_distance = 200.0
//!
//! [radius]
//! lower = 0.0
//! upper = 1000.0
//!
//! [endpoints]
//! primary_dsn = "tessdb.sqlite"
//! secondary_url = "https://api.example.org/photometers"
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level configuration for a reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Same-place threshold in meters for the change planner: a matched
    /// pair whose coordinates lie farther apart than this gets a new
    /// location instead of an in-place update.
    pub nearby_distance: f64,
    /// Distance window for radius searches.
    pub radius: RadiusConfig,
    /// Where the two stores live.
    pub endpoints: StoreEndpoints,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            nearby_distance: DEFAULT_NEARBY_DISTANCE,
            radius: RadiusConfig::default(),
            endpoints: StoreEndpoints::default(),
        }
    }
}

pub const DEFAULT_NEARBY_DISTANCE: f64 = 200.0;
pub const DEFAULT_RADIUS_LOWER: f64 = 0.0;
pub const DEFAULT_RADIUS_UPPER: f64 = 1_000.0;

/// Inclusive distance bounds, in meters, for proximity searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusConfig {
    pub lower: f64,
    pub upper: f64,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            lower: DEFAULT_RADIUS_LOWER,
            upper: DEFAULT_RADIUS_UPPER,
        }
    }
}

/// Connection coordinates for the two stores. The readers that use these
/// live outside this crate; they are carried here so one config covers a
/// whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreEndpoints {
    /// DSN or path of the primary relational store.
    pub primary_dsn: Option<String>,
    /// Base URL of the secondary store's HTTP API.
    pub secondary_url: Option<String>,
}

impl ReconcileConfig {
    /// Load configuration with precedence: Env > File > Defaults.
    ///
    /// Environment variables use the `TESSMATCH_` prefix with `__` as the
    /// nesting separator, e.g. `TESSMATCH_NEARBY_DISTANCE=350` and
    /// `TESSMATCH_RADIUS__UPPER=500`.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(ReconcileConfig::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("TESSMATCH_").split("__"));
        figment.extract().map_err(ConfigError::from)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
#[error("configuration error: {message}")]
pub struct ConfigError {
    pub message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}
