use std::{
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};

use polymatch::app_dirs::CONFIG_HOME_ENV;
use polymatch::config::SERVER_URL_ENV;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Points the config home at a scratch directory and clears the server
/// override for the guard's lifetime.
pub struct PolymatchEnvGuard {
    previous: Vec<(&'static str, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl PolymatchEnvGuard {
    pub fn set_config_home(path: PathBuf) -> Self {
        let lock = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        let previous = [CONFIG_HOME_ENV, SERVER_URL_ENV]
            .into_iter()
            .map(|key| (key, std::env::var(key).ok()))
            .collect();
        // SAFETY: env mutation only happens while ENV_LOCK is held.
        unsafe {
            std::env::set_var(CONFIG_HOME_ENV, path);
            std::env::remove_var(SERVER_URL_ENV);
        }
        Self {
            previous,
            _lock: lock,
        }
    }

    pub fn set_server_url(&self, url: &str) {
        // SAFETY: the guard holds ENV_LOCK.
        unsafe {
            std::env::set_var(SERVER_URL_ENV, url);
        }
    }
}

impl Drop for PolymatchEnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..) {
            // SAFETY: the guard still holds ENV_LOCK.
            unsafe {
                match value {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
    }
}
