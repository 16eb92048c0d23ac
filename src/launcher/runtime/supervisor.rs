//! Start materialized processes and supervise them until they exit.
use std::{collections::BTreeMap, process::ExitStatus, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Child,
    signal,
    sync::mpsc,
    time,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    lib::{errors::LaunchError, node_command::build_node_command, telemetry::ProcessSpan},
    plan::{MaterializedPlan, MaterializedProcess, OutputMode},
};

/// How long processes get to exit after SIGINT before they are killed.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

struct ProcessExit {
    label: String,
    status: std::io::Result<ExitStatus>,
}

/// Runs a materialized plan: every process is started, output is forwarded,
/// and the launch ends once all processes have exited, one fails, or on Ctrl-C.
pub struct Supervisor {
    launch_id: Uuid,
    grace: Duration,
}

impl Supervisor {
    pub fn new(launch_id: Uuid) -> Self {
        Self {
            launch_id,
            grace: SHUTDOWN_GRACE,
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Supervise `plan`. Clean exits leave the others running; the first
    /// abnormal exit stops every remaining process and is returned.
    pub async fn run(&self, plan: MaterializedPlan) -> Result<(), LaunchError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut running: BTreeMap<String, Option<u32>> = BTreeMap::new();

        for process in &plan.processes {
            match self.start(process, tx.clone()) {
                Ok(pid) => {
                    running.insert(process.label.clone(), pid);
                }
                Err(err) => {
                    error!(
                        target: "onrobot_launch::runtime",
                        label = %process.label,
                        reason = %err,
                        "Failed to start process; shutting down the launch"
                    );
                    self.shutdown(&mut running, &mut rx).await;
                    return Err(err);
                }
            }
        }
        drop(tx);

        let mut first_failure = None;
        while !running.is_empty() {
            tokio::select! {
                exit = rx.recv() => {
                    let Some(exit) = exit else { break };
                    running.remove(&exit.label);
                    if let Some(failure) = report_exit(exit) {
                        warn!(
                            target: "onrobot_launch::runtime",
                            running = running.len(),
                            "Process failed; stopping the launch"
                        );
                        first_failure = Some(failure);
                        self.shutdown(&mut running, &mut rx).await;
                        break;
                    }
                }
                _ = signal::ctrl_c() => {
                    info!(
                        target: "onrobot_launch::runtime",
                        running = running.len(),
                        "Interrupt received; stopping processes"
                    );
                    self.shutdown(&mut running, &mut rx).await;
                    break;
                }
            }
        }

        // Parameter files must stay on disk until every process is gone.
        drop(plan);
        match first_failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn start(
        &self,
        process: &MaterializedProcess,
        tx: mpsc::UnboundedSender<ProcessExit>,
    ) -> Result<Option<u32>, LaunchError> {
        let piped = process.output == OutputMode::Both;
        let mut command = build_node_command(&process.program, &process.args, piped);
        let mut child = command.spawn().map_err(|source| LaunchError::ProcessSpawn {
            label: process.label.clone(),
            source,
        })?;
        let pid = child.id();
        let span = ProcessSpan::start(self.launch_id, &process.label, pid);

        if piped {
            forward_output(&mut child, &process.label);
        }

        let label = process.label.clone();
        tokio::spawn(async move {
            let status = child.wait().await;
            let (outcome, code) = match &status {
                Ok(status) if status.success() => ("exited", status.code()),
                Ok(status) => ("failed", status.code()),
                Err(_) => ("lost", None),
            };
            span.finish(outcome, code);
            let _ = tx.send(ProcessExit { label, status });
        });
        Ok(pid)
    }

    /// SIGINT everything still running, then SIGKILL whatever outlives the grace period.
    async fn shutdown(
        &self,
        running: &mut BTreeMap<String, Option<u32>>,
        rx: &mut mpsc::UnboundedReceiver<ProcessExit>,
    ) {
        for (label, pid) in running.iter() {
            if let Some(pid) = pid {
                if !send_signal(*pid, Signal::Interrupt) {
                    warn!(
                        target: "onrobot_launch::runtime",
                        label = %label,
                        pid,
                        "Failed to deliver SIGINT"
                    );
                }
            }
        }

        let deadline = time::sleep(self.grace);
        tokio::pin!(deadline);
        while !running.is_empty() {
            tokio::select! {
                exit = rx.recv() => {
                    let Some(exit) = exit else { break };
                    running.remove(&exit.label);
                    report_exit(exit);
                }
                _ = &mut deadline => {
                    for (label, pid) in running.iter() {
                        warn!(
                            target: "onrobot_launch::runtime",
                            label = %label,
                            "Process ignored SIGINT; killing it"
                        );
                        if let Some(pid) = pid {
                            send_signal(*pid, Signal::Kill);
                        }
                    }
                    break;
                }
            }
        }
    }
}

/// Log one exit; abnormal exits are returned as errors.
fn report_exit(exit: ProcessExit) -> Option<LaunchError> {
    match exit.status {
        Ok(status) if status.success() => {
            info!(
                target: "onrobot_launch::runtime",
                label = %exit.label,
                "Process finished cleanly"
            );
            None
        }
        Ok(status) => {
            error!(
                target: "onrobot_launch::runtime",
                label = %exit.label,
                exit_code = status.code(),
                "Process has died"
            );
            Some(LaunchError::ProcessFailed {
                label: exit.label,
                exit_code: status.code(),
            })
        }
        Err(err) => {
            error!(
                target: "onrobot_launch::runtime",
                label = %exit.label,
                reason = %err,
                "Lost track of process"
            );
            Some(LaunchError::ProcessFailed {
                label: exit.label,
                exit_code: None,
            })
        }
    }
}

/// Echo each line of piped output to the terminal and to the log.
fn forward_output(child: &mut Child, label: &str) {
    if let Some(stdout) = child.stdout.take() {
        spawn_line_forwarder(stdout, label.to_string(), false);
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_line_forwarder(stderr, label.to_string(), true);
    }
}

fn spawn_line_forwarder<R>(reader: R, label: String, is_stderr: bool)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        target: "onrobot_launch::process",
                        label = %label,
                        reason = %err,
                        "Stopped forwarding process output"
                    );
                    break;
                }
            }
            let text = String::from_utf8_lossy(&buf);
            let line = text.trim_end_matches(['\n', '\r']);
            if is_stderr {
                eprintln!("[{label}] {line}");
            } else {
                println!("[{label}] {line}");
            }
            info!(
                target: "onrobot_launch::process",
                label = %label,
                stream = if is_stderr { "stderr" } else { "stdout" },
                "{line}"
            );
        }
    });
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Interrupt,
    Kill,
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: Signal) -> bool {
    let signal = match signal {
        Signal::Interrupt => libc::SIGINT,
        Signal::Kill => libc::SIGKILL,
    };
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    let result = unsafe { libc::kill(pid, signal) };
    result == 0
}

#[cfg(not(unix))]
fn send_signal(_pid: u32, _signal: Signal) -> bool {
    false
}
