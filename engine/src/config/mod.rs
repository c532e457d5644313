//! Configuration management for the calorie tracker
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: CT__)

use anyhow::Result;
use calorie_tracker_shared::{Catalog, Profile};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub recent: RecentConfig,
}

/// Where the document lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Storage key of the persisted document
    pub key: String,
}

/// Optional catalog file (JSON or CSV); the bundled catalog otherwise
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

/// Values used for fresh documents and new users
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    pub profile: Profile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentConfig {
    /// Length of the recent-food and recent-exercise lists
    pub limit: usize,
}

impl Default for RecentConfig {
    fn default() -> Self {
        Self { limit: 8 }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_dir: PathBuf::from(".calorie-tracker"),
                key: "calorie-tracker-state-v2".to_string(),
            },
            catalog: CatalogConfig::default(),
            defaults: DefaultsConfig::default(),
            recent: RecentConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with CT__ prefix
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        Self::load_with(config::File::with_name(&config_file).required(false))
    }

    /// Defaults, then `file`, then the environment. Keys arrive lowercased,
    /// so multi-word profile fields are written in snake_case
    /// (`defaults.profile.fasting_start`).
    fn load_with<F>(file: F) -> Result<Self>
    where
        F: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(file)
            // e.g., CT__STORAGE__DATA_DIR=/tmp/ct sets storage.data_dir
            .add_source(config::Environment::with_prefix("CT").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }

    /// Load the configured catalog
    ///
    /// A configured file that cannot be read or parsed yields an empty
    /// catalog; entry by name then only matches custom foods.
    pub fn load_catalog(&self) -> Catalog {
        match &self.catalog.path {
            None => Catalog::builtin(),
            Some(path) => match Catalog::from_path(path) {
                Ok(catalog) => {
                    info!(
                        path = %path.display(),
                        foods = catalog.foods.len(),
                        activities = catalog.activities.len(),
                        "Catalog loaded"
                    );
                    catalog
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Catalog unavailable, continuing with an empty one");
                    Catalog::empty()
                }
            },
        }
    }
}
