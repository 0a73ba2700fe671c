//! Client settings persisted as TOML under the application directory.

mod io;
mod types;

pub use io::{CONFIG_FILE_NAME, SERVER_URL_ENV, config_path, load_from_path, load_or_default, save, save_to_path};
pub use types::{
    AnalysisSettings, AppSettings, ConfigError, DatasetSettings, LogSettings, ServerSettings,
    ViewSettings,
};
