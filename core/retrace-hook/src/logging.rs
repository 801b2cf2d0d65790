//! File logging for the hook binary.
//!
//! Hook invocations run headless inside the editor's process tree, so
//! diagnostics go to a log file under the storage root instead of stderr.
//! `RUST_LOG` overrides the level derived from the `debug` setting.

use retrace_core::StorageConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub fn init(storage: &StorageConfig, debug: bool) -> Option<WorkerGuard> {
    if storage.ensure_dirs().is_err() {
        return None;
    }

    let appender = tracing_appender::rolling::never(storage.root(), "retrace-hook.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Some(guard)
}
