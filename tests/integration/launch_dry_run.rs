use crate::common::{stderr_of, stdout_of, FakeInstall, REQUIRED_ARGS};

#[test]
fn dry_run_prints_every_command_line() {
    let install = FakeInstall::new("#!/bin/sh\nexit 0\n");
    let output = install.run(&[
        "launch",
        "--dry-run",
        REQUIRED_ARGS[0],
        REQUIRED_ARGS[1],
        "ip_address:=10.1.2.3",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));

    let stdout = stdout_of(&output);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 5, "unexpected dry run output: {stdout}");
    assert!(lines[0].starts_with("[ros2_control_node-1] "));
    assert!(lines[1].starts_with("[robot_state_publisher-2] "));
    assert!(lines[2].contains("spawner joint_state_broadcaster --ros-args"));
    assert!(lines[3].contains("spawner finger_width_controller --ros-args"));
    assert!(lines[4].starts_with("[rviz2] "));
    assert!(lines[4].contains("view_onrobot.rviz"));
    assert!(lines
        .iter()
        .all(|line| line.contains("__ns:=/onrobot")));

    let calls = install.xacro_calls();
    assert_eq!(calls.lines().count(), 1, "templating must run once: {calls}");
    assert!(calls.contains("ip_address:=10.1.2.3"));
}

#[test]
fn disabled_toggles_are_reported_as_skipped() {
    let install = FakeInstall::new("#!/bin/sh\nexit 0\n");
    let output = install.run(&[
        "launch",
        "--dry-run",
        REQUIRED_ARGS[0],
        REQUIRED_ARGS[1],
        "launch_rviz:=false",
        "launch_rsp:=0",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));

    let stdout = stdout_of(&output);
    assert!(stdout.contains("[robot_state_publisher-2] skipped (condition is false)"));
    assert!(stdout.contains("[rviz2] skipped (condition is false)"));
    assert_eq!(
        stdout
            .lines()
            .filter(|line| !line.ends_with("skipped (condition is false)"))
            .count(),
        3
    );
}

#[test]
fn non_boolean_toggle_fails_before_start() {
    let install = FakeInstall::new("#!/bin/sh\nexit 0\n");
    let output = install.run(&[
        "launch",
        "--dry-run",
        REQUIRED_ARGS[0],
        REQUIRED_ARGS[1],
        "launch_rviz:=maybe",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("`maybe` is not a boolean"));
}
