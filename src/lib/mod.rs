//! Shared library modules providing error types, package lookup, node command lines and telemetry initialization.

pub mod errors;
pub mod node_command;
pub mod paths;
pub mod telemetry;
