use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{ensure, Context};
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "rideadmin.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub poll_interval_secs: u64,
    pub page_window: u32,
    pub request_timeout_secs: Option<u64>,
    pub session_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "https://booker-olive-kappa.vercel.app".into(),
            poll_interval_secs: 300,
            page_window: 5,
            request_timeout_secs: None,
            session_file: PathBuf::from("./.rideadmin/session.json"),
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Command-line flags win over file and environment.
    pub fn apply_overrides(&mut self, api_url: Option<String>, session_file: Option<PathBuf>) {
        if let Some(v) = api_url {
            self.api_base_url = v;
        }
        if let Some(v) = session_file {
            self.session_file = v;
        }
    }

    fn validate(self) -> anyhow::Result<Self> {
        ensure!(
            !self.api_base_url.trim().is_empty(),
            "api_base_url must not be empty"
        );
        ensure!(
            self.poll_interval_secs > 0,
            "poll_interval_secs must be at least 1"
        );
        ensure!(self.page_window > 0, "page_window must be at least 1");
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    poll_interval_secs: Option<u64>,
    page_window: Option<u32>,
    request_timeout_secs: Option<u64>,
    session_file: Option<PathBuf>,
}

/// Reads `rideadmin.toml` (or `explicit_path`) and the process environment.
pub fn load_settings(explicit_path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(explicit_path, |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_with(
    explicit_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let path = explicit_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            if let Some(v) = file_cfg.api_base_url {
                settings.api_base_url = v;
            }
            if let Some(v) = file_cfg.poll_interval_secs {
                settings.poll_interval_secs = v;
            }
            if let Some(v) = file_cfg.page_window {
                settings.page_window = v;
            }
            if let Some(v) = file_cfg.request_timeout_secs {
                settings.request_timeout_secs = Some(v);
            }
            if let Some(v) = file_cfg.session_file {
                settings.session_file = v;
            }
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && explicit_path.is_none() => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    }

    if let Some(v) = env("RIDEADMIN_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("APP__POLL_INTERVAL_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.poll_interval_secs = parsed,
            Err(_) => warn!(value = %v, "config: ignoring invalid APP__POLL_INTERVAL_SECS"),
        }
    }

    if let Some(v) = env("APP__PAGE_WINDOW") {
        match v.parse::<u32>() {
            Ok(parsed) => settings.page_window = parsed,
            Err(_) => warn!(value = %v, "config: ignoring invalid APP__PAGE_WINDOW"),
        }
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(0) => settings.request_timeout_secs = None,
            Ok(parsed) => settings.request_timeout_secs = Some(parsed),
            Err(_) => warn!(value = %v, "config: ignoring invalid APP__REQUEST_TIMEOUT_SECS"),
        }
    }

    if let Some(v) = env("APP__SESSION_FILE") {
        settings.session_file = PathBuf::from(v);
    }

    settings.validate()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
