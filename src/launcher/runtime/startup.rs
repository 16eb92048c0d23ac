use std::{collections::BTreeMap, process::ExitCode};

use anyhow::Error;
use uuid::Uuid;

use crate::{
    cli::LaunchProfile,
    launcher::{config::LauncherConfig, runtime::Supervisor},
    lib::{
        errors::LaunchError,
        telemetry::{emit_launch_summary, LaunchTelemetry},
    },
    plan::{materialize, LaunchPlan, LaunchPlanBuilder, MaterializedPlan, PlanVariant},
};

/// Bundles a runtime error message with an exit code.
#[derive(Debug)]
pub struct RuntimeExit {
    message: String,
    exit_code: ExitCode,
}

impl RuntimeExit {
    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self {
            message: format!("{err:?}"),
            exit_code: ExitCode::FAILURE,
        }
    }

    pub fn from_launch_error(err: LaunchError) -> Self {
        let exit_code = ExitCode::from(err.exit_code());
        Self {
            message: err.to_string(),
            exit_code,
        }
    }

    pub fn report(self) -> ExitCode {
        eprintln!("{}", self.message);
        self.exit_code
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Variant chosen on the command line, else the configured one.
pub fn select_variant(profile: &LaunchProfile, config: &LauncherConfig) -> PlanVariant {
    profile.variant.unwrap_or(config.launch.variant)
}

/// Build the plan for `profile` with configured feature overrides applied.
pub fn build_plan(profile: &LaunchProfile, config: &LauncherConfig) -> LaunchPlan {
    let variant = select_variant(profile, config);
    LaunchPlanBuilder::new(config.launch.features_for(variant)).build_plan()
}

/// Configured default arguments overlaid with command-line assignments.
pub fn merged_overrides(
    profile: &LaunchProfile,
    config: &LauncherConfig,
) -> BTreeMap<String, String> {
    let mut overrides = config.arguments.clone();
    overrides.extend(
        profile
            .overrides
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );
    overrides
}

/// Resolve arguments and evaluate every substitution. Nothing is started.
pub async fn prepare_launch(
    profile: &LaunchProfile,
    config: &LauncherConfig,
) -> Result<MaterializedPlan, LaunchError> {
    let plan = build_plan(profile, config);
    let resolved = plan.resolve_arguments(&merged_overrides(profile, config))?;
    let packages = config.packages.package_index();
    let executables = config.templating.executable_lookup();

    // Templating runs an external tool synchronously.
    let materialized = tokio::task::spawn_blocking(move || {
        materialize(&plan, &resolved, &packages, &executables)
    })
    .await
    .map_err(|err| LaunchError::Internal {
        message: format!("plan materialization task failed: {err}"),
    })??;
    Ok(materialized)
}

/// Resolve the plan and either print it (`--dry-run`) or supervise it.
pub async fn run_launch(profile: LaunchProfile, config: LauncherConfig) -> Result<(), RuntimeExit> {
    let launch_id = Uuid::new_v4();
    let materialized = prepare_launch(&profile, &config)
        .await
        .map_err(RuntimeExit::from_launch_error)?;

    let config_path = config
        .source_path
        .as_ref()
        .map(|path| path.to_string_lossy().into_owned());
    emit_launch_summary(&LaunchTelemetry {
        launch_id,
        variant: select_variant(&profile, &config).as_str(),
        config_path: config_path.as_deref(),
        started: materialized.processes.len(),
        skipped: &materialized.skipped,
        commands_run: materialized.commands_run,
        params_dir: materialized.params_dir(),
        launch_args: &profile.launch_args,
    });

    if profile.dry_run {
        println!("{}", render_dry_run(&materialized));
        return Ok(());
    }

    Supervisor::new(launch_id)
        .run(materialized)
        .await
        .map_err(RuntimeExit::from_launch_error)
}

/// One `[label] command line` per process, then the skipped entries.
pub fn render_dry_run(materialized: &MaterializedPlan) -> String {
    let mut lines: Vec<String> = materialized
        .processes
        .iter()
        .map(|process| format!("[{}] {}", process.label, process.command_line()))
        .collect();
    for label in &materialized.skipped {
        lines.push(format!("[{label}] skipped (condition is false)"));
    }
    lines.join("\n")
}
