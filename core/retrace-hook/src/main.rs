//! retrace-hook: CLI adapter between a host editor and the history core.
//!
//! The editor integration calls this binary on its file events and
//! maintenance commands; all history semantics live in `retrace-core`.
//!
//! ## Subcommands
//!
//! - `handle`: record a file event, reads JSON from stdin
//! - `cleanup`: drop history entries whose files no longer exist
//! - `reset`: discard the entire history

mod handle;
mod logging;

use clap::{Parser, Subcommand};
use retrace_core::{Settings, StorageConfig};

#[derive(Parser)]
#[command(name = "retrace-hook")]
#[command(about = "Retrace file-access history tracker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle a host-editor event (reads JSON from stdin)
    Handle,

    /// Remove history entries whose files no longer exist
    Cleanup {
        /// Also drop whole projects whose project file has vanished
        #[arg(long)]
        drop_orphans: bool,
    },

    /// Discard the entire history
    Reset,
}

fn main() {
    let cli = Cli::parse();
    let storage = StorageConfig::default();
    let settings = Settings::load(&storage.settings_file());
    let _logging_guard = logging::init(&storage, settings.debug);

    let result = match cli.command {
        Commands::Handle => handle::run(settings, &storage),
        Commands::Cleanup { drop_orphans } => handle::run_cleanup(settings, &storage, drop_orphans),
        Commands::Reset => handle::run_reset(settings, &storage),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "retrace-hook failed");
        std::process::exit(1);
    }
}
