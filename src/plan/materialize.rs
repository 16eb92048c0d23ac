//! Turn a launch plan plus resolved arguments into concrete process invocations.
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;
use serde_json::{json, Map, Value};
use tempfile::TempDir;
use tracing::info;

use crate::lib::{
    errors::ResolveError,
    node_command::{build_node_arguments, NodeInvocation},
    paths::{ExecutableLookup, PackageIndex},
};

use super::{
    arguments::ResolvedConfiguration,
    process::{OutputMode, ParameterSource, ProcessSpec},
    substitution::LaunchContext,
    LaunchPlan,
};

/// A process ready to be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedProcess {
    pub label: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub output: OutputMode,
}

impl MaterializedProcess {
    /// Shell-quoted command line for display.
    pub fn command_line(&self) -> String {
        shell_words::join(
            std::iter::once(self.program.display().to_string()).chain(self.args.iter().cloned()),
        )
    }
}

/// Processes to start and labels of entries whose condition was false.
///
/// Generated parameter files live in a temporary directory removed on drop,
/// so the plan must outlive the processes it starts.
#[derive(Debug)]
pub struct MaterializedPlan {
    pub processes: Vec<MaterializedProcess>,
    pub skipped: Vec<String>,
    /// External commands run while resolving, templating included.
    pub commands_run: usize,
    params_dir: TempDir,
}

impl MaterializedPlan {
    pub fn params_dir(&self) -> &Path {
        self.params_dir.path()
    }
}

/// Evaluate conditions and substitutions for every entry of `plan`.
///
/// Substitutions shared between entries (the device description) are
/// evaluated once.
pub fn materialize(
    plan: &LaunchPlan,
    configuration: &ResolvedConfiguration,
    packages: &PackageIndex,
    executables: &ExecutableLookup,
) -> Result<MaterializedPlan, ResolveError> {
    let params_dir = tempfile::Builder::new()
        .prefix("onrobot_launch_")
        .tempdir()
        .map_err(|source| ResolveError::ParameterFile {
            path: env::temp_dir(),
            source,
        })?;
    let mut context = LaunchContext::new(configuration, packages, executables);
    let mut processes = Vec::new();
    let mut skipped = Vec::new();

    for (index, entry) in plan.processes.iter().enumerate() {
        let spec = entry.spec();
        let label = process_label(spec, index);
        if let Some(condition) = entry.condition() {
            if !condition.evaluate(&mut context)? {
                info!(
                    target: "onrobot_launch::plan",
                    label = %label,
                    "Condition is false; process will not be started"
                );
                skipped.push(label);
                continue;
            }
        }
        let process = materialize_process(spec, label, &mut context, packages, params_dir.path())?;
        processes.push(process);
    }

    Ok(MaterializedPlan {
        processes,
        skipped,
        commands_run: context.commands_run(),
        params_dir,
    })
}

/// Node name when set, otherwise `<executable>-<position>`.
fn process_label(spec: &ProcessSpec, index: usize) -> String {
    match &spec.name {
        Some(name) => name.clone(),
        None => format!("{}-{}", spec.executable, index + 1),
    }
}

fn materialize_process(
    spec: &ProcessSpec,
    label: String,
    context: &mut LaunchContext<'_>,
    packages: &PackageIndex,
    params_dir: &Path,
) -> Result<MaterializedProcess, ResolveError> {
    let program = packages.lib_dir(&spec.package)?.join(&spec.executable);
    if !program.is_file() {
        return Err(ResolveError::NodeExecutableMissing {
            package: spec.package.clone(),
            executable: spec.executable.clone(),
            path: program,
        });
    }

    let namespace = spec
        .namespace
        .as_ref()
        .map(|namespace| context.evaluate(namespace))
        .transpose()?;
    let arguments = spec
        .arguments
        .iter()
        .map(|argument| context.evaluate(argument))
        .collect::<Result<Vec<_>, _>>()?;

    let mut params_files = Vec::with_capacity(spec.parameters.len());
    for (position, parameter) in spec.parameters.iter().enumerate() {
        let path = match parameter {
            ParameterSource::Value { name, value } => {
                let value = context.evaluate(value)?;
                let destination = params_dir.join(format!("{label}_{position}_{name}.yaml"));
                write_parameter_value(&destination, name, value)?;
                destination
            }
            ParameterSource::File { path, allow_substs } => {
                let source = PathBuf::from(context.evaluate(path)?);
                if *allow_substs {
                    let file_name = source
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "params.yaml".to_string());
                    let destination = params_dir.join(format!("{label}_{position}_{file_name}"));
                    expand_parameter_file(&source, &destination, context.configuration())?;
                    destination
                } else {
                    source
                }
            }
        };
        params_files.push(path);
    }

    let params_refs: Vec<&Path> = params_files.iter().map(PathBuf::as_path).collect();
    let args = build_node_arguments(NodeInvocation {
        name: spec.name.as_deref(),
        namespace: namespace.as_deref(),
        arguments: &arguments,
        params_files: &params_refs,
    });

    Ok(MaterializedProcess {
        label,
        program,
        args,
        output: spec.output,
    })
}

/// Write `{"/**": {"ros__parameters": {name: value}}}`; JSON is valid YAML.
fn write_parameter_value(destination: &Path, name: &str, value: String) -> Result<(), ResolveError> {
    let mut parameters = Map::new();
    parameters.insert(name.to_string(), Value::String(value));
    let document = json!({ "/**": { "ros__parameters": parameters } });
    let encoded = serde_json::to_string_pretty(&document)
        .map_err(|source| ResolveError::ParameterEncoding { source })?;
    fs::write(destination, encoded).map_err(|source| ResolveError::ParameterFile {
        path: destination.to_path_buf(),
        source,
    })
}

fn expand_parameter_file(
    source: &Path,
    destination: &Path,
    configuration: &ResolvedConfiguration,
) -> Result<(), ResolveError> {
    let raw = fs::read_to_string(source).map_err(|err| ResolveError::ParameterFile {
        path: source.to_path_buf(),
        source: err,
    })?;
    let expanded = substitute_vars(&raw, configuration)?;
    fs::write(destination, expanded).map_err(|err| ResolveError::ParameterFile {
        path: destination.to_path_buf(),
        source: err,
    })
}

fn substitution_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\(([A-Za-z][A-Za-z0-9_-]*)\s+([^)]*?)\s*\)")
            .expect("substitution pattern is valid")
    })
}

/// Replace every `$(var NAME)` with the resolved argument value.
///
/// Any other `$(...)` substitution is rejected rather than left as literal text.
pub fn substitute_vars(
    text: &str,
    configuration: &ResolvedConfiguration,
) -> Result<String, ResolveError> {
    let mut expanded = String::with_capacity(text.len());
    let mut last = 0;
    for captures in substitution_pattern().captures_iter(text) {
        let (Some(whole), Some(kind), Some(name)) =
            (captures.get(0), captures.get(1), captures.get(2))
        else {
            continue;
        };
        if kind.as_str() != "var" {
            return Err(ResolveError::UnsupportedSubstitution {
                expression: whole.as_str().to_string(),
            });
        }
        let value = configuration.get(name.as_str()).ok_or_else(|| {
            ResolveError::UndefinedArgument {
                name: name.as_str().to_string(),
            }
        })?;
        expanded.push_str(&text[last..whole.start()]);
        expanded.push_str(value);
        last = whole.end();
    }
    expanded.push_str(&text[last..]);
    Ok(expanded)
}
