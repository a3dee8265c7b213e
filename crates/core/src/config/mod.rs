//! Application configuration with layered loading.
//!
//! Loading precedence (highest wins):
//! 1. Command-line flags (merged in by the binary)
//! 2. Environment variables (METAGEN_*)
//! 3. TOML config file (if METAGEN_CONFIG_FILE set)
//! 4. Built-in defaults

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Configuration consumed by the runner and the fetch client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-Agent string for every outgoing HTTP request.
    ///
    /// Set via METAGEN_USER_AGENT or `--user-agent`.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Root directory for per-provider cache namespaces.
    ///
    /// Set via METAGEN_CACHE_DIR or `--cache-dir`.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Root directory for generated output.
    ///
    /// Set via METAGEN_OUTPUT_DIR or `--output-dir`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Treat every cached body as fresh, skipping all revalidation.
    ///
    /// This short-circuits every freshness strategy the way `Eternal`
    /// does, so it can mask genuine upstream changes. Debug convenience,
    /// not a correctness feature.
    #[serde(default)]
    pub assume_up_to_date: bool,

    /// Emit output records without whitespace.
    #[serde(default)]
    pub minify: bool,
}

fn default_user_agent() -> String {
    concat!("metagen/", env!("CARGO_PKG_VERSION")).into()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./run/cache")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./run/output")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            cache_dir: default_cache_dir(),
            output_dir: default_output_dir(),
            assume_up_to_date: false,
            minify: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, a value
    /// cannot be parsed, or validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("METAGEN_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(Env::prefixed("METAGEN_").map(|key| key.as_str().to_lowercase().into()));

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
