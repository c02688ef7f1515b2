//! Binary entry point: resolve settings, start logging, open the library
//! file, and drive the Ratatui event loop until the user exits.
use anyhow::Context;
use clap::Parser;
use personal_library_manager::config::{Cli, Settings};
use personal_library_manager::logging::init_logging;
use personal_library_manager::{run_app, App, RecordStore};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let settings = Settings::resolve(Cli::parse()).context("failed to resolve settings")?;
    init_logging(&settings.log_level, &settings.log_file)?;
    info!(library = %settings.library_file.display(), "starting library manager");

    let store = RecordStore::open(&settings.library_file);
    let mut app = App::new(store);
    run_app(&mut app)
}
