//! # cdoc-config
//!
//! Layered configuration loading for cdoc using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CDOC_*` prefix, `__` as separator)
//! 2. Project-level `cdoc.toml` (or an explicit path)
//! 3. User-level `~/.config/cdoc/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `CDOC_BUILD__BACKEND` -> `build.backend`,
//! `CDOC_BUILD__LEGACY_MARKUP` -> `build.legacy_markup`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use cdoc_config::CdocConfig;
//!
//! let config = CdocConfig::load_with_dotenv().expect("config");
//! for source in &config.sources {
//!     println!("{} -> {}", source.group_name(), source.root.display());
//! }
//! ```

mod build;
mod error;
mod source;

pub use build::{BackendChoice, BuildConfig};
pub use error::ConfigError;
pub use source::{SourceConfig, TestMode};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = "cdoc.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CdocConfig {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl CdocConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment(None).extract().map_err(ConfigError::from)
    }

    /// Load with an explicit project config file instead of `./cdoc.toml`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::figment(Some(path))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or layer more providers on top.
    pub fn figment(project_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path =
            project_file.map_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE), Path::to_path_buf);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("CDOC_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cdoc").join("config.toml"))
    }

    /// Reject configurations a build cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        let mut seen = BTreeSet::new();
        for (i, source) in self.sources.iter().enumerate() {
            if source.root.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("sources[{i}].root"),
                    reason: "root must not be empty".to_string(),
                });
            }
            let name = source.group_name();
            if !seen.insert(name.clone()) {
                return Err(ConfigError::InvalidValue {
                    field: format!("sources[{i}].name"),
                    reason: format!("group name '{name}' is used by more than one source"),
                });
            }
        }
        Ok(())
    }
}
