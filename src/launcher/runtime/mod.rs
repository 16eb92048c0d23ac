//! Launch preparation and process supervision.
mod startup;
mod supervisor;

pub use startup::{
    build_plan, merged_overrides, prepare_launch, render_dry_run, run_launch, select_variant,
    RuntimeExit,
};
pub use supervisor::{Supervisor, SHUTDOWN_GRACE};
