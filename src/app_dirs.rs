//! Where polymatch keeps its files: `<config dir>/.polymatch/` holding
//! `config.toml` and `logs/`.
//!
//! `POLYMATCH_CONFIG_HOME` replaces the OS config dir, which tests and
//! portable installs rely on.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use thiserror::Error;

pub const APP_DIR_NAME: &str = ".polymatch";
pub const CONFIG_HOME_ENV: &str = "POLYMATCH_CONFIG_HOME";
const LOGS_DIR_NAME: &str = "logs";

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("Could not determine a config directory; set {CONFIG_HOME_ENV}")]
    NoBaseDir,
    #[error("Could not create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The `.polymatch` directory, created on first use.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(root_in(&config_home()?))
}

/// `.polymatch/logs`, created on first use.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join(LOGS_DIR_NAME))
}

fn config_home() -> Result<PathBuf, AppDirError> {
    match std::env::var_os(CONFIG_HOME_ENV) {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(home)),
        _ => BaseDirs::new()
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or(AppDirError::NoBaseDir),
    }
}

fn root_in(home: &Path) -> PathBuf {
    home.join(APP_DIR_NAME)
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    match fs::create_dir_all(&path) {
        Ok(()) => Ok(path),
        Err(source) => Err(AppDirError::CreateDir { path, source }),
    }
}
