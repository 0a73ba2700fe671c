use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::BoundingBox;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1500;
const DEFAULT_POLYGON_LIMIT: usize = 4000;
const DEFAULT_MAX_LOG_FILES: usize = 10;

/// Errors that may occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The application directory could not be resolved or created.
    #[error("Config directory unavailable: {0}")]
    Directory(#[from] crate::app_dirs::AppDirError),
    /// Failed to create a parent directory for the config file.
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read the config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write the config file.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`AppSettings`].
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Settings could not be serialized.
    #[error("Failed to serialize config for {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
}

/// All persisted client settings.
///
/// TOML tables: `server`, `datasets`, `analysis`, `view`, `logging`. Every key
/// is optional; missing keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub server: ServerSettings,
    pub datasets: DatasetSettings,
    pub analysis: AnalysisSettings,
    pub view: ViewSettings,
    pub logging: LogSettings,
}

impl AppSettings {
    /// Restore defaults for values that would make the client unusable.
    pub fn normalized(mut self) -> Self {
        if self.server.base_url.trim().is_empty() {
            self.server.base_url = DEFAULT_BASE_URL.to_string();
        }
        if self.server.max_response_bytes == 0 {
            self.server.max_response_bytes = DEFAULT_MAX_RESPONSE_BYTES;
        }
        if self.analysis.poll_interval_ms == 0 {
            self.analysis.poll_interval_ms = DEFAULT_POLL_INTERVAL_MS;
        }
        if self.analysis.polygon_limit == 0 {
            self.analysis.polygon_limit = DEFAULT_POLYGON_LIMIT;
        }
        if self.logging.max_files == 0 {
            self.logging.max_files = DEFAULT_MAX_LOG_FILES;
        }
        self.datasets.prefix_a = non_empty_or(&self.datasets.prefix_a, "data_a");
        self.datasets.prefix_b = non_empty_or(&self.datasets.prefix_b, "data_b");
        self
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Where the matching service lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Origin every API path is joined onto.
    pub base_url: String,
    /// Upper bound on any single response body.
    pub max_response_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

/// Labels the two datasets are uploaded and queried under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSettings {
    pub prefix_a: String,
    pub prefix_b: String,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            prefix_a: "data_a".to_string(),
            prefix_b: "data_b".to_string(),
        }
    }
}

/// Task polling and query sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub poll_interval_ms: u64,
    /// Feature cap per dataset when loading polygons for the view.
    pub polygon_limit: usize,
    /// Grid identifiers to restrict queries to; empty means all grids.
    pub grids: Vec<String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            polygon_limit: DEFAULT_POLYGON_LIMIT,
            grids: Vec::new(),
        }
    }
}

impl AnalysisSettings {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Start on the accelerated view when the GPU probe succeeds.
    pub prefer_accelerated: bool,
    /// Extent shown by the overview thumbnail; also the initial bbox.
    pub global_bounds: BoundingBox,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            prefer_accelerated: true,
            global_bounds: BoundingBox::new(-120.0, -120.0, 120.0, 120.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub max_files: usize,
    pub stdout: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            max_files: DEFAULT_MAX_LOG_FILES,
            stdout: true,
        }
    }
}
