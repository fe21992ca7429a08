//! Diagnostic log setup. The TUI owns the terminal, so records go to a file.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{Error, Result};

/// `trade_YYYYmmdd_HHMMSS.log`
pub fn log_file_name(now: DateTime<Local>) -> String {
    now.format("trade_%Y%m%d_%H%M%S.log").to_string()
}

/// Route `log` records to a fresh file in `dir`. Filter from `RUST_LOG`, default `info`.
pub fn init(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(log_file_name(Local::now()));
    let file = File::create(&path)?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .map_err(|e| Error::Config(format!("logger already initialised: {e}")))?;
    Ok(path)
}

/// Log to stderr, for the non-interactive commands.
pub fn init_stderr() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .try_init();
}
