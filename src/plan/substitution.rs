//! Deferred values resolved against a launch's argument configuration.
use std::{collections::BTreeMap, process::Command};

use serde::Serialize;
use tracing::{debug, info};

use crate::lib::{
    errors::ResolveError,
    paths::{ExecutableLookup, PackageIndex},
};

use super::arguments::ResolvedConfiguration;

/// A value that is only known once the launch runtime resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Substitution {
    /// Literal text.
    Text { value: String },
    /// Value of a declared launch argument.
    Argument { name: String },
    /// `share` directory of the package named by `package`.
    PackageShare { package: Box<Substitution> },
    /// Path segments joined with the platform separator.
    PathJoin { parts: Vec<Substitution> },
    /// Absolute path of an executable found on the search path.
    FindExecutable { name: String },
    /// Concatenate `parts`, split with shell rules, run it and capture stdout.
    Command { parts: Vec<Substitution> },
    /// Evaluate `inner` once per launch and share the result under `key`.
    Memoized { key: String, inner: Box<Substitution> },
}

impl Substitution {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    pub fn argument(name: impl Into<String>) -> Self {
        Self::Argument { name: name.into() }
    }

    pub fn package_share(package: Substitution) -> Self {
        Self::PackageShare {
            package: Box::new(package),
        }
    }

    pub fn path_join(parts: Vec<Substitution>) -> Self {
        Self::PathJoin { parts }
    }

    pub fn find_executable(name: impl Into<String>) -> Self {
        Self::FindExecutable { name: name.into() }
    }

    pub fn command(parts: Vec<Substitution>) -> Self {
        Self::Command { parts }
    }

    pub fn memoized(key: impl Into<String>, inner: Substitution) -> Self {
        Self::Memoized {
            key: key.into(),
            inner: Box::new(inner),
        }
    }

    /// Render without evaluating, e.g. `$(var onrobot_type)`.
    pub fn describe(&self) -> String {
        match self {
            Substitution::Text { value } => value.clone(),
            Substitution::Argument { name } => format!("$(var {name})"),
            Substitution::PackageShare { package } => {
                format!("$(find-pkg-share {})", package.describe())
            }
            Substitution::PathJoin { parts } => parts
                .iter()
                .map(Substitution::describe)
                .collect::<Vec<_>>()
                .join("/"),
            Substitution::FindExecutable { name } => format!("$(find-exec {name})"),
            Substitution::Command { parts } => format!(
                "$(command {})",
                parts.iter().map(Substitution::describe).collect::<String>()
            ),
            Substitution::Memoized { inner, .. } => inner.describe(),
        }
    }
}

/// Boolean predicate gating a process entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "predicate", rename_all = "snake_case")]
pub enum Condition {
    /// Run when the predicate is true.
    If(Substitution),
    /// Run when the predicate is false.
    Unless(Substitution),
}

impl Condition {
    pub fn evaluate(&self, context: &mut LaunchContext<'_>) -> Result<bool, ResolveError> {
        match self {
            Condition::If(predicate) => parse_bool(&context.evaluate(predicate)?),
            Condition::Unless(predicate) => parse_bool(&context.evaluate(predicate)?).map(|v| !v),
        }
    }
}

/// Interpret a launch boolean: `true`/`1` or `false`/`0`, case-insensitive.
pub fn parse_bool(value: &str) -> Result<bool, ResolveError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ResolveError::InvalidCondition {
            value: value.to_string(),
        }),
    }
}

/// Evaluation state for one launch. Memoized values live as long as the context.
pub struct LaunchContext<'a> {
    configuration: &'a ResolvedConfiguration,
    packages: &'a PackageIndex,
    executables: &'a ExecutableLookup,
    memo: BTreeMap<String, String>,
    commands_run: usize,
}

impl<'a> LaunchContext<'a> {
    pub fn new(
        configuration: &'a ResolvedConfiguration,
        packages: &'a PackageIndex,
        executables: &'a ExecutableLookup,
    ) -> Self {
        Self {
            configuration,
            packages,
            executables,
            memo: BTreeMap::new(),
            commands_run: 0,
        }
    }

    pub fn configuration(&self) -> &ResolvedConfiguration {
        self.configuration
    }

    /// Number of external commands executed so far.
    pub fn commands_run(&self) -> usize {
        self.commands_run
    }

    pub fn evaluate(&mut self, substitution: &Substitution) -> Result<String, ResolveError> {
        match substitution {
            Substitution::Text { value } => Ok(value.clone()),
            Substitution::Argument { name } => self
                .configuration
                .get(name)
                .map(str::to_string)
                .ok_or_else(|| ResolveError::UndefinedArgument { name: name.clone() }),
            Substitution::PackageShare { package } => {
                let package = self.evaluate(package)?;
                let share = self.packages.share_dir(&package)?;
                Ok(share.display().to_string())
            }
            Substitution::PathJoin { parts } => {
                let mut path = std::path::PathBuf::new();
                for part in parts {
                    path.push(self.evaluate(part)?);
                }
                Ok(path.display().to_string())
            }
            Substitution::FindExecutable { name } => {
                Ok(self.executables.find(name)?.display().to_string())
            }
            Substitution::Command { parts } => {
                let mut command_line = String::new();
                for part in parts {
                    command_line.push_str(&self.evaluate(part)?);
                }
                self.run_command(&command_line)
            }
            Substitution::Memoized { key, inner } => {
                if let Some(value) = self.memo.get(key) {
                    debug!(
                        target: "onrobot_launch::plan",
                        key = %key,
                        "Reusing memoized substitution"
                    );
                    return Ok(value.clone());
                }
                let value = self.evaluate(inner)?;
                self.memo.insert(key.clone(), value.clone());
                Ok(value)
            }
        }
    }

    fn run_command(&mut self, command_line: &str) -> Result<String, ResolveError> {
        let tokens =
            shell_words::split(command_line).map_err(|source| ResolveError::CommandSyntax {
                command: command_line.to_string(),
                source,
            })?;
        let (program, args) = tokens.split_first().ok_or(ResolveError::EmptyCommand)?;

        info!(
            target: "onrobot_launch::plan",
            command = %command_line,
            "Running command substitution"
        );
        self.commands_run += 1;
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| ResolveError::CommandSpawn {
                command: command_line.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ResolveError::CommandFailed {
                command: command_line.to_string(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn configuration(pairs: &[(&str, &str)]) -> ResolvedConfiguration {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn booleans_accept_launch_spellings() {
        assert!(parse_bool("true").expect("true"));
        assert!(parse_bool("True").expect("True"));
        assert!(parse_bool("1").expect("1"));
        assert!(!parse_bool("FALSE").expect("FALSE"));
        assert!(!parse_bool("0").expect("0"));
        assert!(matches!(
            parse_bool("yes"),
            Err(ResolveError::InvalidCondition { .. })
        ));
    }

    #[test]
    fn conditions_follow_argument_values() {
        let config = configuration(&[("launch_rviz", "false"), ("launch_rsp", "true")]);
        let packages = PackageIndex::default();
        let executables = ExecutableLookup::default();
        let mut context = LaunchContext::new(&config, &packages, &executables);

        let rviz = Condition::If(Substitution::argument("launch_rviz"));
        let rsp = Condition::If(Substitution::argument("launch_rsp"));
        let headless = Condition::Unless(Substitution::argument("launch_rviz"));
        assert!(!rviz.evaluate(&mut context).expect("boolean"));
        assert!(rsp.evaluate(&mut context).expect("boolean"));
        assert!(headless.evaluate(&mut context).expect("boolean"));
    }

    #[test]
    fn undefined_argument_is_an_error() {
        let config = ResolvedConfiguration::default();
        let packages = PackageIndex::default();
        let executables = ExecutableLookup::default();
        let mut context = LaunchContext::new(&config, &packages, &executables);

        assert!(matches!(
            context.evaluate(&Substitution::argument("ns")),
            Err(ResolveError::UndefinedArgument { name }) if name == "ns"
        ));
    }

    #[test]
    fn package_share_path_joins_relative_parts() {
        let temp = tempdir().expect("can create temporary directory");
        fs::create_dir_all(temp.path().join("share/forked_description"))
            .expect("can create share dir");
        let config = configuration(&[("description_package", "forked_description")]);
        let packages = PackageIndex::new(vec![temp.path().to_path_buf()]);
        let executables = ExecutableLookup::default();
        let mut context = LaunchContext::new(&config, &packages, &executables);

        let path = Substitution::path_join(vec![
            Substitution::package_share(Substitution::argument("description_package")),
            Substitution::text("urdf"),
            Substitution::text("onrobot.urdf.xacro"),
        ]);
        assert_eq!(
            context.evaluate(&path).expect("package exists"),
            temp.path()
                .join("share/forked_description/urdf/onrobot.urdf.xacro")
                .display()
                .to_string()
        );
    }

    #[test]
    fn describe_renders_placeholders() {
        let command = Substitution::command(vec![
            Substitution::find_executable("xacro"),
            Substitution::text(" onrobot_type:="),
            Substitution::argument("onrobot_type"),
        ]);
        assert_eq!(
            command.describe(),
            "$(command $(find-exec xacro) onrobot_type:=$(var onrobot_type))"
        );
    }

    #[cfg(unix)]
    #[test]
    fn memoized_command_runs_once() {
        let temp = tempdir().expect("can create temporary directory");
        let log = temp.path().join("calls.log");
        let config = configuration(&[("onrobot_type", "rg2")]);
        let packages = PackageIndex::default();
        let executables = ExecutableLookup::default();
        let mut context = LaunchContext::new(&config, &packages, &executables);

        let description = Substitution::memoized(
            "robot_description",
            Substitution::command(vec![
                Substitution::text(format!(
                    "sh -c 'echo call >> {}; printf \"<robot type=%s/>\" \"$0\"' ",
                    log.display()
                )),
                Substitution::argument("onrobot_type"),
            ]),
        );

        let first = context.evaluate(&description).expect("command succeeds");
        let second = context.evaluate(&description).expect("memoized");
        assert_eq!(first, "<robot type=rg2/>");
        assert_eq!(first, second);
        assert_eq!(context.commands_run(), 1);
        let calls = fs::read_to_string(&log).expect("log written");
        assert_eq!(calls.lines().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_surfaces_stderr() {
        let config = ResolvedConfiguration::default();
        let packages = PackageIndex::default();
        let executables = ExecutableLookup::default();
        let mut context = LaunchContext::new(&config, &packages, &executables);

        let failing = Substitution::command(vec![Substitution::text(
            "sh -c 'echo broken template >&2; exit 3'",
        )]);
        match context.evaluate(&failing) {
            Err(ResolveError::CommandFailed {
                exit_code, stderr, ..
            }) => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr, "broken template");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
