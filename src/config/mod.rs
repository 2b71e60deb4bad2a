use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::editor::tools::{Color, ToolKind, ToolStyle};
use crate::export::DEFAULT_EXPORT_QUALITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "okol";
const APP_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_BACKEND_BASE: &str = "http://localhost:5012";

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend_base: String,
    pub default_tool: ToolKind,
    pub default_color: Color,
    pub default_size: f64,
    pub default_opacity: f64,
    pub device_pixel_ratio: f64,
    pub export_quality: u8,
    pub download_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let style = ToolStyle::default();
        Self {
            backend_base: DEFAULT_BACKEND_BASE.to_string(),
            default_tool: style.tool,
            default_color: style.color,
            default_size: style.size,
            default_opacity: style.opacity,
            device_pixel_ratio: 1.0,
            export_quality: DEFAULT_EXPORT_QUALITY,
            download_dir: None,
        }
    }
}

impl AppConfig {
    /// Initial drawing style with out-of-range values clamped.
    pub fn tool_style(&self) -> ToolStyle {
        ToolStyle::clamped(
            self.default_tool,
            self.default_color,
            self.default_size,
            self.default_opacity,
        )
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn export_quality(&self) -> u8 {
        self.export_quality.clamp(1, 100)
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => parse_app_config(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn parse_app_config(contents: &str) -> Result<AppConfig, serde_json::Error> {
    serde_json::from_str(contents)
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
