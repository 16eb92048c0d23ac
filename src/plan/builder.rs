//! OnRobot launch plan construction.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::{
    arguments::ArgumentDeclaration,
    process::{OutputMode, ParameterSource, ProcessEntry, ProcessSpec},
    substitution::{Condition, Substitution},
    LaunchPlan,
};

pub const DESCRIPTION_PACKAGE: &str = "onrobot_description";
pub const DRIVER_PACKAGE: &str = "onrobot_driver";
pub const TEMPLATING_EXECUTABLE: &str = "xacro";
/// Parameter key and memo key of the generated device description.
pub const ROBOT_DESCRIPTION_KEY: &str = "robot_description";
pub const DESCRIPTION_NAME: &str = "onrobot";
pub const JOINT_STATE_BROADCASTER: &str = "joint_state_broadcaster";
pub const FINGER_WIDTH_CONTROLLER: &str = "finger_width_controller";

/// Template tokens, in the order the xacro file expects them.
const TEMPLATE_ARGUMENTS: &[&str] = &[
    "onrobot_type",
    "connection_type",
    "device",
    "ip_address",
    "port",
    "prefix",
];

/// Independent switches selecting which arguments and gates a plan carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanFeatures {
    /// Declare `ns` and run every node inside it.
    pub namespace: bool,
    /// Declare `launch_rsp`/`launch_rviz` and gate the matching processes.
    pub launch_toggles: bool,
    /// Declare `use_fake_hardware` and forward it to the template.
    pub fake_hardware: bool,
    /// Declare `description_package` for template and RViz config lookup.
    pub description_override: bool,
    /// Default `connection_type` to `serial` instead of requiring it.
    pub serial_by_default: bool,
}

/// Preset feature sets matching the two historical launch files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanVariant {
    /// Namespaced nodes with RViz/RSP toggles and fake hardware support.
    #[default]
    Namespaced,
    /// Overridable description package, everything always launched.
    DescriptionOverride,
}

impl PlanVariant {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PlanVariant::Namespaced => "namespaced",
            PlanVariant::DescriptionOverride => "description_override",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().replace('-', "_").as_str() {
            "namespaced" => Some(PlanVariant::Namespaced),
            "description_override" => Some(PlanVariant::DescriptionOverride),
            _ => None,
        }
    }

    pub const fn features(&self) -> PlanFeatures {
        match self {
            PlanVariant::Namespaced => PlanFeatures {
                namespace: true,
                launch_toggles: true,
                fake_hardware: true,
                description_override: false,
                serial_by_default: false,
            },
            PlanVariant::DescriptionOverride => PlanFeatures {
                namespace: false,
                launch_toggles: false,
                fake_hardware: false,
                description_override: true,
                serial_by_default: true,
            },
        }
    }
}

impl Default for PlanFeatures {
    fn default() -> Self {
        PlanVariant::default().features()
    }
}

/// Builds the OnRobot launch plan. Pure: equal features give equal plans.
#[derive(Debug, Clone, Copy, Default)]
pub struct LaunchPlanBuilder {
    features: PlanFeatures,
}

impl LaunchPlanBuilder {
    pub fn new(features: PlanFeatures) -> Self {
        Self { features }
    }

    pub fn features(&self) -> PlanFeatures {
        self.features
    }

    pub fn build_plan(&self) -> LaunchPlan {
        let description = self.device_description();
        let controllers = ParameterSource::File {
            path: Substitution::path_join(vec![
                Substitution::package_share(Substitution::text(DRIVER_PACKAGE)),
                Substitution::text("config"),
                Substitution::text("rg_controllers.yaml"),
            ]),
            allow_substs: true,
        };
        let robot_description = ParameterSource::Value {
            name: ROBOT_DESCRIPTION_KEY.to_string(),
            value: description,
        };
        let rviz_config = Substitution::path_join(vec![
            Substitution::package_share(self.description_package()),
            Substitution::text("rviz"),
            Substitution::text("view_onrobot.rviz"),
        ]);

        let control_node = ProcessSpec::new("controller_manager", "ros2_control_node")
            .namespace(self.namespace())
            .parameter(robot_description.clone())
            .parameter(controllers)
            .output(OutputMode::Screen);
        let state_publisher = ProcessSpec::new("robot_state_publisher", "robot_state_publisher")
            .namespace(self.namespace())
            .parameter(robot_description)
            .output(OutputMode::Both);
        let joint_state_spawner = self.spawner(JOINT_STATE_BROADCASTER);
        let finger_width_spawner = self.spawner(FINGER_WIDTH_CONTROLLER);
        let rviz = ProcessSpec::new("rviz2", "rviz2")
            .namespace(self.namespace())
            .name("rviz2")
            .argument(Substitution::text("-d"))
            .argument(rviz_config)
            .output(OutputMode::Screen);

        LaunchPlan {
            arguments: self.declare_arguments(),
            processes: vec![
                ProcessEntry::Always(control_node),
                ProcessEntry::gated(state_publisher, self.toggle("launch_rsp")),
                ProcessEntry::Always(joint_state_spawner),
                ProcessEntry::Always(finger_width_spawner),
                ProcessEntry::gated(rviz, self.toggle("launch_rviz")),
            ],
        }
    }

    fn declare_arguments(&self) -> Vec<ArgumentDeclaration> {
        let mut connection_type = ArgumentDeclaration::new(
            "connection_type",
            "Connection type for the OnRobot gripper. TCP for the Control Box. Serial for the UR Tool I/O (RS485).",
        )
        .with_choices(&["serial", "tcp"]);
        if self.features.serial_by_default {
            connection_type = connection_type.with_default("serial");
        }

        let mut declared = vec![
            ArgumentDeclaration::new("onrobot_type", "Type of OnRobot gripper.")
                .with_choices(&["rg2", "rg6"]),
            connection_type,
            ArgumentDeclaration::new(
                "device",
                "Device name for the serial connection. Only used when connection_type is serial.",
            )
            .with_default("/tmp/ttyUR"),
            ArgumentDeclaration::new(
                "ip_address",
                "IP address for the TCP connection. Only used when connection_type is tcp.",
            )
            .with_default("192.168.1.1"),
            ArgumentDeclaration::new(
                "port",
                "Port for the TCP connection. Only used when connection_type is tcp.",
            )
            .with_default("502"),
            ArgumentDeclaration::new(
                "prefix",
                "Prefix for joint names (useful for multi-robot setups).",
            )
            .with_default(""),
        ];

        if self.features.namespace {
            declared.push(
                ArgumentDeclaration::new(
                    "ns",
                    "Namespace for the nodes. Useful for separate gripper and robot control setups.",
                )
                .with_default("onrobot"),
            );
        }
        if self.features.launch_toggles {
            declared.push(
                ArgumentDeclaration::new("launch_rviz", "Launch RViz for visualization.")
                    .with_default("true"),
            );
            declared.push(
                ArgumentDeclaration::new("launch_rsp", "Launch robot state publisher.")
                    .with_default("true"),
            );
        }
        if self.features.fake_hardware {
            declared.push(
                ArgumentDeclaration::new(
                    "use_fake_hardware",
                    "Use fake hardware interface for testing.",
                )
                .with_default("false"),
            );
        }
        if self.features.description_override {
            declared.push(
                ArgumentDeclaration::new(
                    "description_package",
                    "Package providing the URDF template and RViz configuration. Override to use a forked description package.",
                )
                .with_default(DESCRIPTION_PACKAGE),
            );
        }
        declared
    }

    fn description_package(&self) -> Substitution {
        if self.features.description_override {
            Substitution::argument("description_package")
        } else {
            Substitution::text(DESCRIPTION_PACKAGE)
        }
    }

    /// `xacro <template> onrobot_type:=... [use_fake_hardware:=...] name:=onrobot`, run once.
    fn device_description(&self) -> Substitution {
        let template = Substitution::path_join(vec![
            Substitution::package_share(self.description_package()),
            Substitution::text("urdf"),
            Substitution::text("onrobot.urdf.xacro"),
        ]);

        let mut parts = vec![
            Substitution::find_executable(TEMPLATING_EXECUTABLE),
            Substitution::text(" "),
            template,
        ];
        let forwarded = TEMPLATE_ARGUMENTS
            .iter()
            .copied()
            .chain(self.features.fake_hardware.then_some("use_fake_hardware"));
        for name in forwarded {
            parts.push(Substitution::text(format!(" {name}:=")));
            parts.push(Substitution::argument(name));
        }
        parts.push(Substitution::text(format!(" name:={DESCRIPTION_NAME}")));

        Substitution::memoized(ROBOT_DESCRIPTION_KEY, Substitution::command(parts))
    }

    fn namespace(&self) -> Option<Substitution> {
        self.features
            .namespace
            .then(|| Substitution::argument("ns"))
    }

    fn toggle(&self, argument: &str) -> Option<Condition> {
        self.features
            .launch_toggles
            .then(|| Condition::If(Substitution::argument(argument)))
    }

    fn spawner(&self, controller: &str) -> ProcessSpec {
        ProcessSpec::new("controller_manager", "spawner")
            .namespace(self.namespace())
            .argument(Substitution::text(controller))
            .output(OutputMode::Screen)
    }
}
