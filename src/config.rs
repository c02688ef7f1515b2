//! Runtime settings: where the library file and the log file live, and how
//! chatty logging should be. Command-line flags win over environment
//! variables, which win over the defaults under the user's home directory.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".personal-library-manager";
/// JSON file holding the library inside the application data directory.
const LIBRARY_FILE_NAME: &str = "books_data.json";
/// Log file written next to the library by default.
const LOG_FILE_NAME: &str = "library.log";

/// Keep a personal book catalog in a JSON file.
#[derive(Debug, Parser)]
#[command(name = "library", version, about)]
pub struct Cli {
    /// JSON file holding the library
    #[arg(long, env = "LIBRARY_FILE", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// File that receives log output
    #[arg(long, env = "LIBRARY_LOG_FILE", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error, off
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: String,
}

/// Fully resolved settings handed to the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub library_file: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Settings {
    /// Fill any path the user did not supply with the home-directory default.
    pub fn resolve(cli: Cli) -> Result<Self> {
        let library_file = match cli.file.filter(|p| !p.as_os_str().is_empty()) {
            Some(path) => path,
            None => data_dir()?.join(LIBRARY_FILE_NAME),
        };
        let log_file = match cli.log_file.filter(|p| !p.as_os_str().is_empty()) {
            Some(path) => path,
            None => data_dir()?.join(LOG_FILE_NAME),
        };

        Ok(Self {
            library_file,
            log_file,
            log_level: cli.log_level,
        })
    }
}

/// Resolve the absolute path to the application data directory.
fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}
