use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use client_core::{
    navigation::DEFAULT_GRID_COLUMNS,
    persistence::{DEFAULT_SAVE_DELAY, DEFAULT_SAVE_GUARD},
    session::{SessionSettings, DEFAULT_PORT_BASE},
    upload::{UploadPolicy, ALLOWED_MIME_TYPES, MAX_GALLERY_ITEMS},
};
use serde::Deserialize;
use tracing::warn;

pub const CONFIG_FILE: &str = "curator.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend_host: Option<String>,
    pub backend_port_base: u16,
    pub grid_columns: usize,
    pub save_delay_ms: u64,
    pub save_guard_ms: u64,
    pub max_gallery_items: usize,
    pub allowed_mime_types: Vec<String>,
    pub download_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_host: None,
            backend_port_base: DEFAULT_PORT_BASE,
            grid_columns: DEFAULT_GRID_COLUMNS,
            save_delay_ms: DEFAULT_SAVE_DELAY.as_millis() as u64,
            save_guard_ms: DEFAULT_SAVE_GUARD.as_millis() as u64,
            max_gallery_items: MAX_GALLERY_ITEMS,
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            download_dir: default_download_dir(),
        }
    }
}

impl Settings {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            grid_columns: self.grid_columns.max(1),
            port_base: self.backend_port_base,
            save_delay: Duration::from_millis(self.save_delay_ms),
            save_guard: Duration::from_millis(self.save_guard_ms),
            upload_policy: UploadPolicy {
                allowed_mime_types: self.allowed_mime_types.clone(),
                max_gallery_items: self.max_gallery_items,
            },
        }
    }
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("./downloads"))
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(CONFIG_FILE), &|key| std::env::var(key).ok())
}

pub fn load_settings_from(path: &Path, var: &dyn Fn(&str) -> Option<String>) -> Settings {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => match toml::from_str::<Settings>(&raw) {
            Ok(file_cfg) => file_cfg,
            Err(err) => {
                warn!(path = %path.display(), %err, "ignoring unreadable configuration file");
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    };

    let overrides: HashMap<&str, String> = [
        "CURATOR_BACKEND_HOST",
        "APP__BACKEND_HOST",
        "CURATOR_BACKEND_PORT_BASE",
        "APP__BACKEND_PORT_BASE",
        "APP__GRID_COLUMNS",
        "APP__SAVE_DELAY_MS",
        "APP__SAVE_GUARD_MS",
        "APP__MAX_GALLERY_ITEMS",
        "APP__DOWNLOAD_DIR",
    ]
    .into_iter()
    .filter_map(|key| var(key).map(|value| (key, value)))
    .collect();

    if let Some(v) = overrides.get("CURATOR_BACKEND_HOST") {
        settings.backend_host = Some(v.clone());
    }
    if let Some(v) = overrides.get("APP__BACKEND_HOST") {
        settings.backend_host = Some(v.clone());
    }

    if let Some(v) = parsed(&overrides, "CURATOR_BACKEND_PORT_BASE") {
        settings.backend_port_base = v;
    }
    if let Some(v) = parsed(&overrides, "APP__BACKEND_PORT_BASE") {
        settings.backend_port_base = v;
    }

    if let Some(v) = parsed(&overrides, "APP__GRID_COLUMNS") {
        settings.grid_columns = v;
    }
    if let Some(v) = parsed(&overrides, "APP__SAVE_DELAY_MS") {
        settings.save_delay_ms = v;
    }
    if let Some(v) = parsed(&overrides, "APP__SAVE_GUARD_MS") {
        settings.save_guard_ms = v;
    }
    if let Some(v) = parsed(&overrides, "APP__MAX_GALLERY_ITEMS") {
        settings.max_gallery_items = v;
    }

    if let Some(v) = overrides.get("APP__DOWNLOAD_DIR") {
        settings.download_dir = PathBuf::from(v);
    }

    settings
}

fn parsed<T: FromStr>(overrides: &HashMap<&str, String>, key: &str) -> Option<T> {
    let raw = overrides.get(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring invalid numeric override");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
