//! LaunchProfile and config path resolution.
use std::{
    collections::BTreeMap,
    env,
    path::{Path, PathBuf},
};

use crate::plan::PlanVariant;

/// Resolved launch profile.
#[derive(Debug, Clone, Default)]
pub struct LaunchProfile {
    /// Explicit configuration file; `None` defers to the environment/defaults.
    pub config_path: Option<PathBuf>,
    pub variant: Option<PlanVariant>,
    pub overrides: BTreeMap<String, String>,
    pub dry_run: bool,
    pub launch_args: Vec<String>,
}

/// Resolve config path: CLI override, made absolute against the working directory.
pub fn resolve_config_path(override_path: Option<PathBuf>) -> Option<PathBuf> {
    let path = override_path?;
    if path.is_absolute() {
        return Some(path);
    }
    match env::current_dir() {
        Ok(cwd) => Some(cwd.join(path)),
        Err(_) => Some(path),
    }
}

/// Build launch arguments suitable for reproduction/logging.
pub fn build_launch_args(
    variant: Option<PlanVariant>,
    config: Option<&Path>,
    assignments: &[String],
) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(variant) = variant {
        args.push(format!("--variant={}", variant.as_str().replace('_', "-")));
    }
    if let Some(config) = config {
        args.push(format!("--config={}", config.display()));
    }
    args.extend(assignments.iter().cloned());
    args
}
