//! Logger setup
//!
//! Logs go through the `log` facade to env_logger. The filter comes from
//! `RUST_LOG` and defaults to `info`. While the terminal view owns the screen
//! logs are appended to a file instead of stderr.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use env_logger::{Env, Target};
use thiserror::Error;

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Errors that can occur when installing the logger
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Failed to open log file {path}: {source}")]
    OpenFile { path: PathBuf, source: io::Error },

    #[error("Logger already installed: {0}")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

/// Default log file, inside the XDG cache directory
/// (`~/.cache/statusboard/statusboard.log` on Linux).
///
/// Returns `None` if no home directory can be determined.
pub fn default_log_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "statusboard")?;
    Some(project_dirs.cache_dir().join("statusboard.log"))
}

/// Opens `path` for appending, creating missing parent directories
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global logger
pub fn init(target: LogTarget) -> Result<(), LogError> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();

    if let LogTarget::File(path) = target {
        let file = open_log_file(&path).map_err(|source| LogError::OpenFile {
            path: path.clone(),
            source,
        })?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.try_init()?;
    Ok(())
}
