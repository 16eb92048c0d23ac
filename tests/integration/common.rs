use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use tempfile::{tempdir, TempDir};

pub const BINARY_PATH: &str = env!("CARGO_BIN_EXE_onrobot-launch");

/// Records its arguments next to itself and prints a minimal description.
const FAKE_XACRO: &str = "#!/bin/sh\necho \"$@\" >> \"$(dirname \"$0\")/xacro.calls\"\nprintf '<robot name=\"onrobot\"/>'\n";

pub const REQUIRED_ARGS: [&str; 2] = ["onrobot_type:=rg2", "connection_type:=tcp"];

/// A throwaway install prefix with every package the launch references.
pub struct FakeInstall {
    pub root: TempDir,
}

impl FakeInstall {
    /// Node executables run `node_body`; the templating tool always succeeds.
    pub fn new(node_body: &str) -> Self {
        let root = tempdir().expect("can create temporary directory");
        let prefix = root.path().join("install");
        for package in [
            "onrobot_description",
            "onrobot_driver",
            "controller_manager",
            "robot_state_publisher",
            "rviz2",
        ] {
            let marker = prefix
                .join("share/ament_index/resource_index/packages")
                .join(package);
            write_file(&marker, "");
            fs::create_dir_all(prefix.join("share").join(package)).expect("share dir");
        }
        write_file(
            &prefix.join("share/onrobot_description/urdf/onrobot.urdf.xacro"),
            "<robot/>",
        );
        write_file(
            &prefix.join("share/onrobot_description/rviz/view_onrobot.rviz"),
            "Panels: []\n",
        );
        write_file(
            &prefix.join("share/onrobot_driver/config/rg_controllers.yaml"),
            "controller_manager:\n  ros__parameters:\n    update_rate: 100\n",
        );
        for (package, executable) in [
            ("controller_manager", "ros2_control_node"),
            ("controller_manager", "spawner"),
            ("robot_state_publisher", "robot_state_publisher"),
            ("rviz2", "rviz2"),
        ] {
            write_script(&prefix.join("lib").join(package).join(executable), node_body);
        }
        write_script(&root.path().join("bin/xacro"), FAKE_XACRO);

        let install = Self { root };
        write_file(&install.config_path(), &install.config_body());
        install
    }

    pub fn prefix(&self) -> PathBuf {
        self.root.path().join("install")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.path().join("launch.toml")
    }

    pub fn xacro_calls(&self) -> String {
        fs::read_to_string(self.root.path().join("bin/xacro.calls")).unwrap_or_default()
    }

    fn config_body(&self) -> String {
        format!(
            "[launch]\nvariant = \"namespaced\"\n\n[packages]\nprefixes = [\"{}\"]\n\n[templating]\nexecutable = \"{}\"\n",
            self.prefix().display(),
            self.root.path().join("bin/xacro").display()
        )
    }

    /// Binary invocation pinned to this install's configuration.
    pub fn command(&self) -> Command {
        let mut command = Command::new(BINARY_PATH);
        command
            .arg("--config")
            .arg(self.config_path())
            .current_dir(self.root.path())
            .env_remove("ONROBOT_LAUNCH_CONFIG")
            .env("AMENT_PREFIX_PATH", self.prefix())
            .env("RUST_LOG", "warn");
        command
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .output()
            .expect("launcher binary should start")
    }
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_file(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().expect("has parent")).expect("can create dir");
    fs::write(path, body).expect("can write file");
}

fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    write_file(path, body);
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("can mark executable");
}
