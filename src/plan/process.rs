use serde::Serialize;

use super::substitution::{Condition, Substitution};

/// Where a process's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Inherit the terminal.
    Screen,
    /// Terminal plus the launch log.
    Both,
}

impl OutputMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Screen => "screen",
            OutputMode::Both => "both",
        }
    }
}

/// One parameter source handed to a node, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterSource {
    /// A single named parameter, e.g. `robot_description`.
    Value { name: String, value: Substitution },
    /// A YAML parameter file. With `allow_substs`, `$(var NAME)` is expanded
    /// and any other `$(...)` substitution fails the launch.
    File {
        path: Substitution,
        allow_substs: bool,
    },
}

/// Declarative description of one node process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Substitution>,
    pub package: String,
    pub executable: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub arguments: Vec<Substitution>,
    pub parameters: Vec<ParameterSource>,
    pub output: OutputMode,
}

impl ProcessSpec {
    pub fn new(package: &str, executable: &str) -> Self {
        Self {
            namespace: None,
            package: package.to_string(),
            executable: executable.to_string(),
            name: None,
            arguments: Vec::new(),
            parameters: Vec::new(),
            output: OutputMode::Screen,
        }
    }

    pub fn namespace(mut self, namespace: Option<Substitution>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn argument(mut self, argument: Substitution) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn parameter(mut self, parameter: ParameterSource) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }
}

/// A plan entry: either always started, or gated by a condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum ProcessEntry {
    Always(ProcessSpec),
    Conditional {
        spec: ProcessSpec,
        condition: Condition,
    },
}

impl ProcessEntry {
    /// Gate `spec` on `condition` when one is given.
    pub fn gated(spec: ProcessSpec, condition: Option<Condition>) -> Self {
        match condition {
            Some(condition) => ProcessEntry::Conditional { spec, condition },
            None => ProcessEntry::Always(spec),
        }
    }

    pub fn spec(&self) -> &ProcessSpec {
        match self {
            ProcessEntry::Always(spec) | ProcessEntry::Conditional { spec, .. } => spec,
        }
    }

    pub fn condition(&self) -> Option<&Condition> {
        match self {
            ProcessEntry::Always(_) => None,
            ProcessEntry::Conditional { condition, .. } => Some(condition),
        }
    }
}
