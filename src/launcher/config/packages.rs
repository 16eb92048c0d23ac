use std::{ffi::OsString, path::Path, path::PathBuf};

use serde::Deserialize;

use crate::lib::{
    errors::ConfigError,
    paths::{is_nonempty_absolute, ExecutableLookup, PackageIndex},
};
use crate::plan::TEMPLATING_EXECUTABLE;

/// `[packages]` section. Empty prefixes defer to `AMENT_PREFIX_PATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackagesSection {
    pub prefixes: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawPackagesSection {
    pub prefixes: Option<Vec<PathBuf>>,
}

/// `[templating]` section: how the device description template is expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatingSection {
    pub executable: PathBuf,
    pub search_path: Option<OsString>,
}

impl Default for TemplatingSection {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(TEMPLATING_EXECUTABLE),
            search_path: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawTemplatingSection {
    pub executable: Option<PathBuf>,
    pub search_path: Option<String>,
}

impl PackagesSection {
    pub fn package_index(&self) -> PackageIndex {
        if self.prefixes.is_empty() {
            PackageIndex::from_env()
        } else {
            PackageIndex::new(self.prefixes.clone())
        }
    }
}

impl TemplatingSection {
    pub fn executable_lookup(&self) -> ExecutableLookup {
        ExecutableLookup::new(self.search_path.clone())
            .with_override(TEMPLATING_EXECUTABLE, self.executable.clone())
    }
}

pub fn parse_packages_section(
    raw: Option<RawPackagesSection>,
    path: &Path,
) -> Result<PackagesSection, ConfigError> {
    let prefixes = raw.unwrap_or_default().prefixes.unwrap_or_default();
    if let Some(relative) = prefixes.iter().find(|prefix| !is_nonempty_absolute(prefix)) {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "packages.prefixes",
            message: format!(
                "Prefix `{}` must be an absolute path",
                relative.display()
            ),
        });
    }
    Ok(PackagesSection { prefixes })
}

pub fn parse_templating_section(
    raw: Option<RawTemplatingSection>,
    path: &Path,
) -> Result<TemplatingSection, ConfigError> {
    let templating_raw = raw.unwrap_or_default();
    let executable = templating_raw
        .executable
        .unwrap_or_else(|| PathBuf::from(TEMPLATING_EXECUTABLE));
    if executable.as_os_str().is_empty() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "templating.executable",
            message: "Provide an executable name or absolute path".into(),
        });
    }

    Ok(TemplatingSection {
        executable,
        search_path: templating_raw
            .search_path
            .filter(|value| !value.trim().is_empty())
            .map(OsString::from),
    })
}
