//! Activity Log: append-only structured log at `system/activity.log`
//! (`spec.md` §6, "File formats produced").
//!
//! The log itself is just the destination for `tracing` events already
//! emitted across the engine (step runs, context-manager turns, scheduler
//! sync); this module only wires up where those events land.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber: newline-delimited JSON to
/// `system_root/activity.log`, mirrored to stderr for interactive use.
///
/// The returned guard must be held for the process lifetime; dropping it
/// flushes and stops the background writer thread.
pub fn init(system_root: &Path) -> WorkerGuard {
    let appender = tracing_appender::rolling::never(system_root, "activity.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().json().with_writer(non_blocking))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    guard
}
