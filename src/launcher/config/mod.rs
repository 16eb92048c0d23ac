//! Load and validate launcher configuration.
use std::{collections::BTreeMap, env, path::PathBuf};

use serde::Deserialize;
use tracing::{error, info};

use crate::lib::errors::ConfigError;

pub mod launch;
pub mod packages;
pub mod telemetry;

pub use launch::{parse_launch_section, LaunchSection, RawLaunchSection};
pub use packages::{
    parse_packages_section, parse_templating_section, PackagesSection, RawPackagesSection,
    RawTemplatingSection, TemplatingSection,
};

pub const CONFIG_ENV_KEY: &str = "ONROBOT_LAUNCH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "launch.toml";

/// Top-level configuration container.
#[derive(Debug, Clone, Default)]
pub struct LauncherConfig {
    pub launch: LaunchSection,
    pub packages: PackagesSection,
    pub templating: TemplatingSection,
    /// Default launch argument values; command-line assignments win.
    pub arguments: BTreeMap<String, String>,
    /// `None` when running on built-in defaults.
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawLauncherConfig {
    launch: Option<RawLaunchSection>,
    packages: Option<RawPackagesSection>,
    templating: Option<RawTemplatingSection>,
    arguments: Option<BTreeMap<String, String>>,
}

impl LauncherConfig {
    /// Prefer `ONROBOT_LAUNCH_CONFIG`, then `launch.toml` if present, then defaults.
    pub fn load_from_env_or_default() -> Result<Self, ConfigError> {
        match env::var(CONFIG_ENV_KEY) {
            Ok(value) if !value.trim().is_empty() => {
                let path = PathBuf::from(value);
                telemetry::log_env_source(&path, true);
                Self::load_from_path(path)
            }
            _ => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                telemetry::log_env_source(&path, false);
                if path.is_file() {
                    Self::load_from_path(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from `path`, or fall back to the environment/defaults.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load_from_env_or_default(),
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        info!(
            target: "onrobot_launch::config",
            path = %path.display(),
            "Starting configuration load"
        );

        let builder = config::Config::builder().add_source(config::File::from(path.clone()));
        let document = builder.build().map_err(|err| {
            let error = ConfigError::from_read_error(path.clone(), err);
            error!(
                target: "onrobot_launch::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        let raw: RawLauncherConfig = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: "onrobot_launch::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let config = Self::from_raw(raw, path.clone()).map_err(|err| {
            error!(
                target: "onrobot_launch::config",
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        telemetry::log_loaded(&config);
        Ok(config)
    }

    fn from_raw(raw: RawLauncherConfig, path: PathBuf) -> Result<Self, ConfigError> {
        let launch = parse_launch_section(raw.launch, &path)?;
        let packages = parse_packages_section(raw.packages, &path)?;
        let templating = parse_templating_section(raw.templating, &path)?;

        Ok(Self {
            launch,
            packages,
            templating,
            arguments: raw.arguments.unwrap_or_default(),
            source_path: Some(path),
        })
    }
}
