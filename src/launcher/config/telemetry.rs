use tracing::{debug, info};

use super::{LauncherConfig, CONFIG_ENV_KEY, DEFAULT_CONFIG_PATH};

pub fn log_env_source(path: &std::path::Path, from_env: bool) {
    if from_env {
        info!(
            target: "onrobot_launch::config",
            path = %path.display(),
            "Loading configuration using ONROBOT_LAUNCH_CONFIG environment variable"
        );
    } else {
        debug!(
            target: "onrobot_launch::config",
            path = %path.display(),
            env = CONFIG_ENV_KEY,
            default = DEFAULT_CONFIG_PATH,
            "ONROBOT_LAUNCH_CONFIG not set; using launch.toml when present"
        );
    }
}

pub fn log_loaded(config: &LauncherConfig) {
    info!(
        target: "onrobot_launch::config",
        path = ?config.source_path,
        variant = config.launch.variant.as_str(),
        prefixes = config.packages.prefixes.len(),
        templating_executable = %config.templating.executable.display(),
        default_arguments = config.arguments.len(),
        "Configuration file loaded successfully"
    );
}
