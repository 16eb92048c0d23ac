//! CLI argument definitions and `LaunchProfile` construction.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{lib::errors::ArgumentError, plan::PlanVariant};

use super::{build_launch_args, resolve_config_path, LaunchProfile};

/// Parsed command intent from CLI.
#[derive(Debug, Clone)]
pub enum ParsedCommand {
    Launch(LaunchProfile),
    Inspect(InspectCommand, LaunchProfile),
}

/// Commands that print information about the plan without resolving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectCommand {
    Plan,
    ShowArgs,
}

/// Top-level subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Print the unresolved launch plan as JSON.
    Plan,
    /// List declared launch arguments with defaults and choices.
    ShowArgs,
    /// Resolve arguments and start the gripper process graph.
    #[command(
        after_help = "Example: onrobot-launch launch onrobot_type:=rg2 connection_type:=tcp ip_address:=192.168.1.1"
    )]
    Launch(LaunchArgs),
}

/// Arguments for `launch`.
#[derive(Debug, Clone, Args)]
pub struct LaunchArgs {
    /// Print the resolved command lines instead of starting processes.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
    /// Launch arguments as `<name>:=<value>`.
    #[arg(value_name = "NAME:=VALUE")]
    pub assignments: Vec<String>,
}

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    author,
    version,
    about = "Launch the OnRobot RG2/RG6 gripper control stack",
    long_about = None
)]
pub struct LaunchProfileArgs {
    /// Path to launch.toml (overrides ONROBOT_LAUNCH_CONFIG).
    #[arg(long = "config", global = true)]
    pub config_override: Option<PathBuf>,
    /// Builder variant (overrides `[launch].variant`).
    #[arg(long, value_enum, global = true)]
    pub variant: Option<PlanVariant>,
    #[command(subcommand)]
    pub command: CliCommand,
}

impl LaunchProfileArgs {
    /// Parse CLI args into either launch mode or an inspection command.
    pub fn into_command(self) -> Result<ParsedCommand, ArgumentError> {
        let config_path = resolve_config_path(self.config_override);
        let (inspect, dry_run, assignments) = match self.command {
            CliCommand::Plan => (Some(InspectCommand::Plan), false, Vec::new()),
            CliCommand::ShowArgs => (Some(InspectCommand::ShowArgs), false, Vec::new()),
            CliCommand::Launch(args) => (None, args.dry_run, args.assignments),
        };

        let overrides = crate::plan::parse_assignments(&assignments)?;
        let launch_args = build_launch_args(self.variant, config_path.as_deref(), &assignments);
        let profile = LaunchProfile {
            config_path,
            variant: self.variant,
            overrides,
            dry_run,
            launch_args,
        };

        Ok(match inspect {
            Some(command) => ParsedCommand::Inspect(command, profile),
            None => ParsedCommand::Launch(profile),
        })
    }
}
