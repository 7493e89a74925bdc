//! Service configuration.
//!
//! Configuration can be loaded from:
//! 1. TOML file (`jobctl.toml`, `[service]` table)
//! 2. Environment variables (with `JOBCTL_` prefix)
//!
//! Environment variables override TOML configuration.
//!
//! # Example TOML Configuration
//!
//! ```toml
//! [service]
//! artifact_staging_endpoint = "http://localhost:8098"
//! max_pending_preparations = 256
//! log_level = "jobctl=debug,info"
//!
//! [service.default_environment]
//! harness_image = "apache/beam_java_sdk:2.9.0"
//! # mode = "EXTERNAL"
//! # config = "localhost:50000"
//! ```

use std::path::Path;

use jobctl_environments::{EnvironmentError, EnvironmentFactory};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "jobctl.toml";

/// Harness image used when nothing else is configured.
pub const DEFAULT_HARNESS_IMAGE: &str = "apache/beam_java_sdk:latest";

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid artifact staging endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid default environment: {0}")]
    InvalidEnvironment(#[from] EnvironmentError),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Job service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Endpoint returned to clients for artifact staging.
    pub artifact_staging_endpoint: String,

    /// Upper bound on prepared-but-not-run jobs. Prepare returns
    /// `UNAVAILABLE` while the bound is reached.
    pub max_pending_preparations: usize,

    /// Whether Prepare accepts new jobs at startup.
    pub accepting_jobs: bool,

    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Environment used for work without an explicit binding.
    pub default_environment: DefaultEnvironmentConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            artifact_staging_endpoint: "http://localhost:8098".to_string(),
            max_pending_preparations: 1024,
            accepting_jobs: true,
            log_level: "info".to_string(),
            default_environment: DefaultEnvironmentConfig::default(),
        }
    }
}

/// The default environment, as a mode tag plus configuration string.
///
/// With no `mode`, the default is a docker harness running `harness_image`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultEnvironmentConfig {
    pub harness_image: String,
    pub mode: Option<String>,
    pub config: Option<String>,
}

impl Default for DefaultEnvironmentConfig {
    fn default() -> Self {
        Self {
            harness_image: DEFAULT_HARNESS_IMAGE.to_string(),
            mode: None,
            config: None,
        }
    }
}

impl DefaultEnvironmentConfig {
    /// Builds the environment factory this configuration describes.
    pub fn factory(&self) -> Result<EnvironmentFactory, ConfigError> {
        let harness = EnvironmentFactory::with_harness_image(&self.harness_image)?;
        if matches!(self.mode.as_deref(), None | Some("")) {
            return Ok(harness);
        }
        let default =
            harness.create_or_get_default(self.mode.as_deref(), self.config.as_deref())?;
        Ok(EnvironmentFactory::new(default))
    }
}

impl ServiceConfig {
    /// Load configuration from `jobctl.toml` (if present) and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. TOML configuration file
    /// 3. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(DEFAULT_CONFIG_FILE) {
            Ok(contents) => Self::from_toml(&contents)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_file_with(path, |key| std::env::var(key).ok())
    }

    /// Like [`from_file`](Self::from_file), reading overrides through `lookup`
    /// instead of the process environment.
    pub fn from_file_with<P, F>(path: P, lookup: F) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml(&contents)?;
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        struct FullConfig {
            #[serde(default)]
            service: ServiceConfig,
        }

        let full: FullConfig = toml::from_str(content)?;
        Ok(full.service)
    }

    /// Checks values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.artifact_staging_endpoint).map_err(|source| {
            ConfigError::InvalidEndpoint {
                endpoint: self.artifact_staging_endpoint.clone(),
                source,
            }
        })?;
        if self.max_pending_preparations == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_pending_preparations",
                value: "0".to_string(),
            });
        }
        self.default_environment.factory()?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `JOBCTL_*` overrides, resolving each variable through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("JOBCTL_ARTIFACT_STAGING_ENDPOINT") {
            self.artifact_staging_endpoint = endpoint;
        }

        if let Some(max) = lookup("JOBCTL_MAX_PENDING_PREPARATIONS") {
            self.max_pending_preparations = max.parse().map_err(|_| ConfigError::InvalidValue {
                key: "JOBCTL_MAX_PENDING_PREPARATIONS",
                value: max.clone(),
            })?;
        }

        if let Some(accepting) = lookup("JOBCTL_ACCEPTING_JOBS") {
            self.accepting_jobs = accepting.parse().map_err(|_| ConfigError::InvalidValue {
                key: "JOBCTL_ACCEPTING_JOBS",
                value: accepting.clone(),
            })?;
        }

        if let Some(level) = lookup("JOBCTL_LOG_LEVEL") {
            self.log_level = level;
        }

        // Default environment overrides
        if let Some(image) = lookup("JOBCTL_HARNESS_IMAGE") {
            self.default_environment.harness_image = image;
        }
        if let Some(mode) = lookup("JOBCTL_ENVIRONMENT_MODE") {
            self.default_environment.mode = Some(mode);
        }
        if let Some(config) = lookup("JOBCTL_ENVIRONMENT_CONFIG") {
            self.default_environment.config = Some(config);
        }

        Ok(())
    }
}
