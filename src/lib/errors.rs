use std::{io, path::PathBuf};

use config::ConfigError as ConfigLoaderError;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to build (read) the configuration file.
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize TOML into a struct.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Field failed validation.
    #[error("Configuration file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

/// Launch argument validation failures, reported before any process starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error(
        "Argument `{name}` has value `{value}`, valid choices are: {}",
        .choices.join(", ")
    )]
    InvalidChoice {
        name: String,
        value: String,
        choices: Vec<String>,
    },
    #[error("Required argument `{name}` was not provided (pass `{name}:=<value>`)")]
    MissingRequired { name: String },
    #[error("Malformed launch argument `{raw}`: expected `<name>:=<value>`")]
    MalformedAssignment { raw: String },
}

/// Failures while evaluating substitutions, conditions and parameter files.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Package `{package}` was not found under any prefix ({searched})")]
    PackageNotFound { package: String, searched: String },
    #[error("Executable `{name}` could not be located: {source}")]
    ExecutableNotFound {
        name: String,
        #[source]
        source: which::Error,
    },
    #[error("Executable `{executable}` of package `{package}` does not exist at {path}")]
    NodeExecutableMissing {
        package: String,
        executable: String,
        path: PathBuf,
    },
    #[error("Launch argument `{name}` is referenced but has no value")]
    UndefinedArgument { name: String },
    #[error("Command `{command}` could not be split into arguments: {source}")]
    CommandSyntax {
        command: String,
        #[source]
        source: shell_words::ParseError,
    },
    #[error("Command substitution evaluated to an empty command line")]
    EmptyCommand,
    #[error("Failed to start `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("Command `{command}` exited abnormally (exit={exit_code:?}): {stderr}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("Substitution `{expression}` is not supported in parameter files (only `$(var NAME)` is)")]
    UnsupportedSubstitution { expression: String },
    #[error("Condition value `{value}` is not a boolean (expected true, false, 1 or 0)")]
    InvalidCondition { value: String },
    #[error("Failed to prepare parameter file {path}: {source}")]
    ParameterFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to encode parameters: {source}")]
    ParameterEncoding {
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level failure of a launch, from argument resolution through supervision.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("Failed to start process `{label}`: {source}")]
    ProcessSpawn {
        label: String,
        #[source]
        source: io::Error,
    },
    #[error("Process `{label}` exited abnormally (exit={exit_code:?})")]
    ProcessFailed {
        label: String,
        exit_code: Option<i32>,
    },
    #[error("Internal launcher error: {message}")]
    Internal { message: String },
}

impl LaunchError {
    /// Process exit code reported to the invoking shell.
    pub const fn exit_code(&self) -> u8 {
        match self {
            LaunchError::Argument(_) => 2,
            _ => 1,
        }
    }
}
