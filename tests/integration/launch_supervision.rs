use std::{process::Stdio, time::Duration};

use anyhow::Result;
use tokio::{process::Command, time::timeout};

use crate::common::{FakeInstall, REQUIRED_ARGS};

async fn launch_status(install: &FakeInstall) -> Result<Option<i32>> {
    let mut command = Command::from(install.command());
    command
        .args(["launch", REQUIRED_ARGS[0], REQUIRED_ARGS[1], "launch_rviz:=false"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    let status = timeout(Duration::from_secs(20), command.status()).await??;
    Ok(status.code())
}

#[tokio::test]
async fn launch_exits_cleanly_when_every_node_does() -> Result<()> {
    let install = FakeInstall::new("#!/bin/sh\nexit 0\n");
    assert_eq!(launch_status(&install).await?, Some(0));
    Ok(())
}

#[tokio::test]
async fn failing_node_fails_the_launch() -> Result<()> {
    let install = FakeInstall::new(
        "#!/bin/sh\ncase \"$0\" in *ros2_control_node) exit 3 ;; esac\nexit 0\n",
    );
    assert_eq!(launch_status(&install).await?, Some(1));
    Ok(())
}
