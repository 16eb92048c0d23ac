//! Entry point for the OnRobot gripper launcher.
use std::process::ExitCode;

use anyhow::Error;
use clap::Parser;
use onrobot_launch::{
    cli::{execute_inspect_command, InspectCommand, LaunchProfile, LaunchProfileArgs, ParsedCommand},
    launcher::{
        config::LauncherConfig,
        runtime::{self, RuntimeExit},
    },
    lib::{errors::LaunchError, telemetry},
};

#[tokio::main]
async fn main() -> ExitCode {
    match bootstrap().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(exit) => exit.report(),
    }
}

async fn bootstrap() -> Result<(), RuntimeExit> {
    telemetry::init_tracing().map_err(RuntimeExit::from_error)?;
    let args = LaunchProfileArgs::parse();
    let command = args
        .into_command()
        .map_err(|err| RuntimeExit::from_launch_error(LaunchError::from(err)))?;

    match command {
        ParsedCommand::Launch(profile) => run_launch(profile).await,
        ParsedCommand::Inspect(command, profile) => handle_inspect_command(command, profile),
    }
}

fn load_config(profile: &LaunchProfile) -> Result<LauncherConfig, RuntimeExit> {
    LauncherConfig::load(profile.config_path.clone())
        .map_err(|err| RuntimeExit::from_error(Error::new(err)))
}

async fn run_launch(profile: LaunchProfile) -> Result<(), RuntimeExit> {
    let config = load_config(&profile)?;
    runtime::run_launch(profile, config).await
}

fn handle_inspect_command(
    command: InspectCommand,
    profile: LaunchProfile,
) -> Result<(), RuntimeExit> {
    let config = load_config(&profile)?;
    let plan = runtime::build_plan(&profile, &config);
    let message = execute_inspect_command(command, &plan).map_err(RuntimeExit::from_error)?;
    println!("{message}");
    Ok(())
}
