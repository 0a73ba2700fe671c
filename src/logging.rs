//! Tracing setup: one log file per launch under `.polymatch/logs`, an
//! optional stdout mirror, and pruning of old launch files.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
    time::SystemTime,
};

use time::{
    OffsetDateTime, UtcOffset,
    format_description::BorrowedFormatItem,
    macros::format_description,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt};

use crate::app_dirs;
use crate::config::LogSettings;

const FILE_STEM: &str = "polymatch";
const FILE_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
const LINE_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");

/// Keeps the non-blocking writer flushing for the life of the process.
static FILE_WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("No log directory: {0}")]
    Directory(#[from] app_dirs::AppDirError),
    #[error("Could not list {path} for pruning: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not delete stale log {path}: {source}")]
    RemoveFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not create {path}: {source}")]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not build a log file name: {0}")]
    FormatTime(#[from] time::error::Format),
    #[error("A global tracing subscriber is already installed: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install the global subscriber and return this launch's log file.
///
/// Calling it again returns the path without touching the subscriber. Errors
/// are returned so `main` can carry on with stderr.
pub fn init(settings: &LogSettings) -> Result<PathBuf, LoggingError> {
    let dir = app_dirs::logs_dir()?;
    let name = launch_file_name(local_now())?;
    let path = dir.join(&name);
    if FILE_WRITER_GUARD.get().is_some() {
        return Ok(path);
    }
    fs::File::create(&path).map_err(|source| LoggingError::CreateLogFile {
        path: path.clone(),
        source,
    })?;
    prune(&dir, settings.max_files.max(1))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, name));
    let timer = OffsetTime::new(local_offset(), LINE_STAMP);
    let to_file = fmt::layer()
        .with_ansi(false)
        .with_timer(timer.clone())
        .with_writer(writer);
    let to_stdout = settings
        .stdout
        .then(|| fmt::layer().with_timer(timer).with_writer(std::io::stdout));

    let subscriber = tracing_subscriber::registry()
        .with(filter_for(&settings.level))
        .with(to_file)
        .with(to_stdout);
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = FILE_WRITER_GUARD.set(guard);

    tracing::info!(path = %path.display(), level = %settings.level, "Logging started");
    Ok(path)
}

/// Delete the oldest `.log` files so at most `keep` remain.
fn prune(dir: &Path, keep: usize) -> Result<(), LoggingError> {
    let entries = fs::read_dir(dir).map_err(|source| LoggingError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut logs: Vec<(SystemTime, PathBuf)> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "log"))
        .map(|path| {
            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .collect();
    if logs.len() <= keep {
        return Ok(());
    }
    logs.sort();
    let stale = logs.len() - keep;
    for (_, path) in logs.drain(..stale) {
        fs::remove_file(&path).map_err(|source| LoggingError::RemoveFile { path, source })?;
    }
    Ok(())
}

fn launch_file_name(at: OffsetDateTime) -> Result<String, LoggingError> {
    Ok(format!("{FILE_STEM}_{}.log", at.format(FILE_STAMP)?))
}

fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(local_offset())
}

/// `RUST_LOG` wins; an unparsable configured level falls back to `info`.
fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
