//! CLI entrypoint module structure.
use anyhow::Result;

use crate::plan::{ArgumentDeclaration, LaunchPlan};

pub mod args;
pub mod profile;

pub use args::{CliCommand, InspectCommand, LaunchArgs, LaunchProfileArgs, ParsedCommand};
pub use profile::{build_launch_args, resolve_config_path, LaunchProfile};

/// Execute an inspection command and return the text to print.
pub fn execute_inspect_command(command: InspectCommand, plan: &LaunchPlan) -> Result<String> {
    match command {
        InspectCommand::Plan => Ok(serde_json::to_string_pretty(plan)?),
        InspectCommand::ShowArgs => Ok(render_arguments(&plan.arguments)),
    }
}

/// Human-readable argument listing in the launch tool's `--show-args` layout.
pub fn render_arguments(arguments: &[ArgumentDeclaration]) -> String {
    let mut out = String::from("Arguments (pass arguments as '<name>:=<value>'):\n");
    for argument in arguments {
        out.push_str(&format!("\n    '{}':\n", argument.name));
        out.push_str(&format!("        {}", argument.description));
        if let Some(choices) = &argument.choices {
            let quoted: Vec<String> = choices.iter().map(|choice| format!("'{choice}'")).collect();
            out.push_str(&format!(" Valid choices are: [{}]", quoted.join(", ")));
        }
        out.push('\n');
        match &argument.default {
            Some(default) => out.push_str(&format!("        (default: '{default}')\n")),
            None => out.push_str("        (required)\n"),
        }
    }
    out
}
