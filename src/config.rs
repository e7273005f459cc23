use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::engine::EngineConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub store: StoreConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub redirect_limit: usize,
    pub max_document_mb: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            request_timeout_ms: 60_000,
            redirect_limit: 5,
            max_document_mb: 200,
            user_agent: concat!("mgl/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    const MEBIBYTE: u64 = 1024 * 1024;

    pub fn max_document_bytes(&self) -> u64 {
        self.max_document_mb.saturating_mul(Self::MEBIBYTE).max(1)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub path: String,
    pub ephemeral: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            ephemeral: false,
        }
    }
}

impl StoreConfig {
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if self.ephemeral {
            return None;
        }
        if !self.path.is_empty() {
            return Some(PathBuf::from(&self.path));
        }
        default_store_path()
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UiConfig {
    pub redraw_interval_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            redraw_interval_ms: 120,
        }
    }
}

impl Config {
    pub fn load() -> AppResult<Self> {
        let Some(path) = default_config_path() else {
            return Ok(Self::default());
        };
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        if !path.is_file() {
            return Err(AppError::invalid_argument(format!(
                "config path is not a regular file: {}",
                path.display()
            )));
        }

        let raw = fs::read_to_string(path).map_err(|source| {
            AppError::io_with_context(source, format!("failed to read config: {}", path.display()))
        })?;
        let parsed = toml::from_str::<Self>(&raw).map_err(|source| {
            AppError::invalid_argument(format!(
                "failed to parse config {}: {source}",
                path.display()
            ))
        })?;
        Ok(parsed.sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.fetch.connect_timeout_ms = self.fetch.connect_timeout_ms.max(1);
        self.fetch.request_timeout_ms = self.fetch.request_timeout_ms.max(1);
        self.fetch.max_document_mb = self.fetch.max_document_mb.max(1);
        if self.fetch.user_agent.trim().is_empty() {
            self.fetch.user_agent = FetchConfig::default().user_agent;
        }
        self.ui.redraw_interval_ms = self.ui.redraw_interval_ms.max(1);
        self
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            connect_timeout: Duration::from_millis(self.fetch.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.fetch.request_timeout_ms),
            redirect_limit: self.fetch.redirect_limit,
            max_document_bytes: self.fetch.max_document_bytes(),
            user_agent: self.fetch.user_agent.clone(),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os("MGL_CONFIG_PATH")
        && !explicit.is_empty()
    {
        return Some(PathBuf::from(explicit));
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME")
        && !xdg.is_empty()
    {
        return Some(PathBuf::from(xdg).join("mgl").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME")
        && !home.is_empty()
    {
        return Some(
            PathBuf::from(home)
                .join(".config")
                .join("mgl")
                .join("config.toml"),
        );
    }
    if let Some(appdata) = std::env::var_os("APPDATA")
        && !appdata.is_empty()
    {
        return Some(PathBuf::from(appdata).join("mgl").join("config.toml"));
    }
    None
}

pub fn default_store_path() -> Option<PathBuf> {
    if let Some(data) = dirs::data_dir() {
        return Some(data.join("mgl").join("highlights.json"));
    }
    dirs::home_dir().map(|home| home.join(".mgl-highlights.json"))
}
