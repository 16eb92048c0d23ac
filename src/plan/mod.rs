//! Launch plan model: argument declarations, substitutions and process entries.
use std::collections::BTreeMap;

use serde::Serialize;

use crate::lib::errors::ArgumentError;

pub mod arguments;
pub mod builder;
pub mod materialize;
pub mod process;
pub mod substitution;

pub use arguments::{parse_assignments, ArgumentDeclaration, ResolvedConfiguration};
pub use builder::{
    LaunchPlanBuilder, PlanFeatures, PlanVariant, DESCRIPTION_PACKAGE, DRIVER_PACKAGE,
    FINGER_WIDTH_CONTROLLER, JOINT_STATE_BROADCASTER, ROBOT_DESCRIPTION_KEY,
    TEMPLATING_EXECUTABLE,
};
pub use materialize::{materialize, MaterializedPlan, MaterializedProcess};
pub use process::{OutputMode, ParameterSource, ProcessEntry, ProcessSpec};
pub use substitution::{parse_bool, Condition, LaunchContext, Substitution};

/// Argument declarations followed by process entries, in launch order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    pub arguments: Vec<ArgumentDeclaration>,
    pub processes: Vec<ProcessEntry>,
}

impl LaunchPlan {
    pub fn argument(&self, name: &str) -> Option<&ArgumentDeclaration> {
        self.arguments.iter().find(|argument| argument.name == name)
    }

    /// Overlay `overrides` on the declared defaults and validate choices.
    pub fn resolve_arguments(
        &self,
        overrides: &BTreeMap<String, String>,
    ) -> Result<ResolvedConfiguration, ArgumentError> {
        ResolvedConfiguration::resolve(&self.arguments, overrides)
    }
}
