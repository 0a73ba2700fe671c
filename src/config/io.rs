use std::path::{Path, PathBuf};

use crate::app_dirs;

use super::types::{AppSettings, ConfigError};

/// Default filename used to store the settings.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Environment variable that overrides `server.base_url`.
pub const SERVER_URL_ENV: &str = "POLYMATCH_SERVER_URL";

/// Resolve the settings file path inside the application directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load settings from the application directory, falling back to defaults
/// when no file exists yet.
pub fn load_or_default() -> Result<AppSettings, ConfigError> {
    let mut settings = load_from_path(&config_path()?)?;
    if let Ok(url) = std::env::var(SERVER_URL_ENV) {
        if !url.trim().is_empty() {
            settings.server.base_url = url.trim().to_string();
        }
    }
    Ok(settings)
}

/// Load settings from an explicit path. A missing file yields defaults.
pub fn load_from_path(path: &Path) -> Result<AppSettings, ConfigError> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<AppSettings>(&text)
        .map(AppSettings::normalized)
        .map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
}

/// Persist settings to the application directory.
pub fn save(settings: &AppSettings) -> Result<(), ConfigError> {
    save_to_path(settings, &config_path()?)
}

/// Write settings to `path` through a sibling temp file so a crash never
/// leaves a truncated config behind.
pub fn save_to_path(settings: &AppSettings, path: &Path) -> Result<(), ConfigError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let data = toml::to_string_pretty(settings).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    let temp = dir.join(format!(".{CONFIG_FILE_NAME}.{}.tmp", uuid::Uuid::new_v4().simple()));
    std::fs::write(&temp, data).map_err(|source| ConfigError::Write {
        path: temp.clone(),
        source,
    })?;
    std::fs::rename(&temp, path).map_err(|source| {
        let _ = std::fs::remove_file(&temp);
        ConfigError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::BoundingBox;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_from_path(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.analysis.poll_interval_ms, 1500);
        assert_eq!(settings.analysis.polygon_limit, 4000);
        assert_eq!(
            settings.view.global_bounds,
            BoundingBox::new(-120.0, -120.0, 120.0, 120.0)
        );
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[server]\nbase_url = \"http://matcher:9000\"\n\n[analysis]\npoll_interval_ms = 0\ngrids = [\"0_0\", \"0_1\"]\n",
        )
        .unwrap();
        let settings = load_from_path(&path).unwrap();
        assert_eq!(settings.server.base_url, "http://matcher:9000");
        assert_eq!(settings.analysis.poll_interval_ms, 1500);
        assert_eq!(settings.analysis.grids, vec!["0_0", "0_1"]);
        assert_eq!(settings.datasets.prefix_a, "data_a");
    }

    #[test]
    fn save_then_load_preserves_edits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut settings = AppSettings::default();
        settings.datasets.prefix_a = "parcels_2023".into();
        settings.view.prefer_accelerated = false;
        save_to_path(&settings, &path).unwrap();
        assert_eq!(load_from_path(&path).unwrap(), settings);
        let leftovers = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter(|entry| {
                entry
                    .as_ref()
                    .is_ok_and(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[server\nbase_url = 3").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
