//! Package prefix lookup and executable resolution.

use std::{
    collections::BTreeMap,
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::lib::errors::ResolveError;

/// Environment variable listing install prefixes, highest priority first.
pub const AMENT_PREFIX_PATH_ENV: &str = "AMENT_PREFIX_PATH";
const RESOURCE_INDEX_DIR: &str = "share/ament_index/resource_index/packages";

/// Returns true if the path is non-empty and absolute.
pub fn is_nonempty_absolute(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_absolute()
}

/// Ordered set of install prefixes searched for packages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageIndex {
    prefixes: Vec<PathBuf>,
}

impl PackageIndex {
    pub fn new(prefixes: Vec<PathBuf>) -> Self {
        Self { prefixes }
    }

    /// Read prefixes from `AMENT_PREFIX_PATH`; unset yields an empty index.
    pub fn from_env() -> Self {
        let prefixes = env::var_os(AMENT_PREFIX_PATH_ENV)
            .map(|value| {
                env::split_paths(&value)
                    .filter(|path| !path.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self { prefixes }
    }

    pub fn prefixes(&self) -> &[PathBuf] {
        &self.prefixes
    }

    /// First prefix that provides `package`.
    pub fn prefix_of(&self, package: &str) -> Result<&Path, ResolveError> {
        self.prefixes
            .iter()
            .find(|prefix| {
                prefix.join(RESOURCE_INDEX_DIR).join(package).is_file()
                    || prefix.join("share").join(package).is_dir()
            })
            .map(PathBuf::as_path)
            .ok_or_else(|| ResolveError::PackageNotFound {
                package: package.to_string(),
                searched: self.describe_prefixes(),
            })
    }

    /// `<prefix>/share/<package>`.
    pub fn share_dir(&self, package: &str) -> Result<PathBuf, ResolveError> {
        Ok(self.prefix_of(package)?.join("share").join(package))
    }

    /// `<prefix>/lib/<package>`, where node executables are installed.
    pub fn lib_dir(&self, package: &str) -> Result<PathBuf, ResolveError> {
        Ok(self.prefix_of(package)?.join("lib").join(package))
    }

    fn describe_prefixes(&self) -> String {
        if self.prefixes.is_empty() {
            return format!("{AMENT_PREFIX_PATH_ENV} is empty");
        }
        self.prefixes
            .iter()
            .map(|prefix| prefix.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Resolves executable names the way a shell would, with optional overrides.
#[derive(Debug, Clone, Default)]
pub struct ExecutableLookup {
    search_path: Option<OsString>,
    overrides: BTreeMap<String, PathBuf>,
}

impl ExecutableLookup {
    pub fn new(search_path: Option<OsString>) -> Self {
        Self {
            search_path,
            overrides: BTreeMap::new(),
        }
    }

    /// Resolve `name` to `replacement` instead (absolute path or another name).
    pub fn with_override(mut self, name: impl Into<String>, replacement: PathBuf) -> Self {
        self.overrides.insert(name.into(), replacement);
        self
    }

    pub fn find(&self, name: &str) -> Result<PathBuf, ResolveError> {
        let target = self
            .overrides
            .get(name)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(name));
        if target.is_absolute() {
            return Ok(target);
        }

        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let search_path = self.search_path.clone().or_else(|| env::var_os("PATH"));
        which::which_in(&target, search_path, cwd).map_err(|source| {
            ResolveError::ExecutableNotFound {
                name: target.display().to_string(),
                source,
            }
        })
    }
}
