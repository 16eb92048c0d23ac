//! Shared helpers for building ROS 2 node command lines.

use std::{path::Path, process::Stdio};

use tokio::process::Command;

/// Marker separating node-specific arguments from ROS arguments.
pub const ROS_ARGS_FLAG: &str = "--ros-args";

pub struct NodeInvocation<'a> {
    pub name: Option<&'a str>,
    pub namespace: Option<&'a str>,
    pub arguments: &'a [String],
    pub params_files: &'a [&'a Path],
}

/// Make a namespace absolute; empty or `/` means the root namespace.
pub fn normalize_namespace(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{trimmed}"))
    }
}

/// Build the argument vector passed after the executable path.
pub fn build_node_arguments(invocation: NodeInvocation<'_>) -> Vec<String> {
    let mut args: Vec<String> = invocation.arguments.to_vec();

    let mut ros_args = Vec::new();
    if let Some(name) = invocation.name {
        ros_args.push("-r".to_string());
        ros_args.push(format!("__node:={name}"));
    }
    if let Some(namespace) = invocation.namespace.and_then(normalize_namespace) {
        ros_args.push("-r".to_string());
        ros_args.push(format!("__ns:={namespace}"));
    }
    for params_file in invocation.params_files {
        ros_args.push("--params-file".to_string());
        ros_args.push(params_file.display().to_string());
    }

    if !ros_args.is_empty() {
        args.push(ROS_ARGS_FLAG.to_string());
        args.extend(ros_args);
    }
    args
}

/// Build the supervised command; piped output is used for `both` mode.
pub fn build_node_command(program: &Path, args: &[String], piped: bool) -> Command {
    let mut command = Command::new(program);
    command.kill_on_drop(true);
    command.args(args);
    command.stdin(Stdio::null());
    if piped {
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    }
    command
}
