use std::path::Path;

use serde::Deserialize;

use crate::{
    lib::errors::ConfigError,
    plan::{PlanFeatures, PlanVariant},
};

/// `[launch]` section: which builder variant to use and per-feature overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchSection {
    pub variant: PlanVariant,
    pub namespace: Option<bool>,
    pub launch_toggles: Option<bool>,
    pub fake_hardware: Option<bool>,
    pub description_override: Option<bool>,
    pub serial_by_default: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawLaunchSection {
    pub variant: Option<String>,
    pub namespace: Option<bool>,
    pub launch_toggles: Option<bool>,
    pub fake_hardware: Option<bool>,
    pub description_override: Option<bool>,
    pub serial_by_default: Option<bool>,
}

impl LaunchSection {
    /// Features of `variant` with this section's explicit overrides applied.
    pub fn features_for(&self, variant: PlanVariant) -> PlanFeatures {
        let preset = variant.features();
        PlanFeatures {
            namespace: self.namespace.unwrap_or(preset.namespace),
            launch_toggles: self.launch_toggles.unwrap_or(preset.launch_toggles),
            fake_hardware: self.fake_hardware.unwrap_or(preset.fake_hardware),
            description_override: self
                .description_override
                .unwrap_or(preset.description_override),
            serial_by_default: self.serial_by_default.unwrap_or(preset.serial_by_default),
        }
    }
}

pub fn parse_launch_section(
    raw: Option<RawLaunchSection>,
    path: &Path,
) -> Result<LaunchSection, ConfigError> {
    let launch_raw = raw.unwrap_or_default();
    let variant = match launch_raw.variant {
        Some(value) => PlanVariant::parse(&value).ok_or_else(|| ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "launch.variant",
            message: format!("`{value}` is not one of: namespaced, description_override"),
        })?,
        None => PlanVariant::default(),
    };

    Ok(LaunchSection {
        variant,
        namespace: launch_raw.namespace,
        launch_toggles: launch_raw.launch_toggles,
        fake_hardware: launch_raw.fake_hardware,
        description_override: launch_raw.description_override,
        serial_by_default: launch_raw.serial_by_default,
    })
}
