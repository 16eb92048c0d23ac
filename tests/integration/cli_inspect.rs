use serde_json::Value;

use crate::common::{stderr_of, stdout_of, FakeInstall, REQUIRED_ARGS};

#[test]
fn plan_prints_five_entries_as_json() {
    let install = FakeInstall::new("#!/bin/sh\nexit 0\n");
    let output = install.run(&["plan"]);
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));

    let plan: Value = serde_json::from_str(&stdout_of(&output)).expect("plan is json");
    let processes = plan["processes"].as_array().expect("process list");
    assert_eq!(processes.len(), 5);
    let names: Vec<&str> = plan["arguments"]
        .as_array()
        .expect("argument list")
        .iter()
        .filter_map(|argument| argument["name"].as_str())
        .collect();
    assert!(names.contains(&"ns"));
    assert!(!names.contains(&"description_package"));
    assert!(install.xacro_calls().is_empty(), "inspection must not template");
}

#[test]
fn variant_flag_overrides_configured_variant() {
    let install = FakeInstall::new("#!/bin/sh\nexit 0\n");
    let output = install.run(&["--variant", "description-override", "show-args"]);
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));

    let listing = stdout_of(&output);
    assert!(listing.starts_with("Arguments (pass arguments as '<name>:=<value>'):"));
    assert!(listing.contains("    'description_package':"));
    assert!(listing.contains("    'onrobot_type':"));
    assert!(!listing.contains("    'ns':"));
}

#[test]
fn invalid_choice_exits_with_usage_code() {
    let install = FakeInstall::new("#!/bin/sh\nexit 0\n");
    let output = install.run(&["launch", "--dry-run", "onrobot_type:=rg9", REQUIRED_ARGS[1]]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output)
        .contains("Argument `onrobot_type` has value `rg9`, valid choices are: rg2, rg6"));
    assert!(install.xacro_calls().is_empty());
}

#[test]
fn missing_connection_type_is_rejected() {
    let install = FakeInstall::new("#!/bin/sh\nexit 0\n");
    let output = install.run(&["launch", "--dry-run", REQUIRED_ARGS[0]]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("`connection_type`"));
}

#[test]
fn invalid_config_exits_with_failure() {
    let install = FakeInstall::new("#!/bin/sh\nexit 0\n");
    std::fs::write(install.config_path(), "[launch]\nvariant = \"legacy\"\n")
        .expect("can rewrite config");
    let output = install.run(&["plan"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("launch.variant"));
}
