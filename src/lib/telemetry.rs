//! Telemetry initialization and supervised-process span helpers.

use std::{path::Path, time::Instant};

use anyhow::Result;
use tracing::{info, info_span, Span};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

/// Initialize `tracing` and format developer logs.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Span helper recording start and exit of one supervised process.
pub struct ProcessSpan {
    span: Span,
    started_at: Instant,
    label: String,
}

impl ProcessSpan {
    /// Start a process span.
    pub fn start(launch_id: Uuid, label: &str, pid: Option<u32>) -> Self {
        let span = info_span!(
            target: "onrobot_launch::process",
            "process",
            %launch_id,
            label,
            pid
        );
        span.in_scope(|| {
            info!(
                target: "onrobot_launch::process",
                label,
                pid,
                "Process started"
            )
        });
        Self {
            span,
            started_at: Instant::now(),
            label: label.to_string(),
        }
    }

    /// Close the span while recording exit status.
    pub fn finish(self, status: &'static str, exit_code: Option<i32>) {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        let _entered = self.span.enter();
        info!(
            target: "onrobot_launch::process",
            label = %self.label,
            status = status,
            exit_code = exit_code,
            elapsed_ms = elapsed_ms,
            "Process finished"
        );
    }
}

/// Summary of a resolved launch emitted before processes start.
#[derive(Debug)]
pub struct LaunchTelemetry<'a> {
    pub launch_id: Uuid,
    pub variant: &'a str,
    pub config_path: Option<&'a str>,
    pub started: usize,
    pub skipped: &'a [String],
    pub commands_run: usize,
    pub params_dir: &'a Path,
    pub launch_args: &'a [String],
}

/// Emit the launch summary to `tracing`.
pub fn emit_launch_summary(telemetry: &LaunchTelemetry<'_>) {
    info!(
        target: "onrobot_launch::runtime",
        launch_id = %telemetry.launch_id,
        variant = telemetry.variant,
        config_path = telemetry.config_path.unwrap_or("<defaults>"),
        started = telemetry.started,
        skipped = ?telemetry.skipped,
        commands_run = telemetry.commands_run,
        params_dir = %telemetry.params_dir.display(),
        launch_args = ?telemetry.launch_args,
        "Launching OnRobot process graph"
    );
}
