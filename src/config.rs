// =============================================================================
// CONFIGURATION - Load settings from config.toml
// =============================================================================
//
// This module handles loading and parsing configuration from config.toml.
// Provides sensible defaults if config file is missing or has errors.
// The defaults reproduce the engine's stock behaviour: an 800x600 fixed-size
// window and a Vulkan 1.4 instance.

use anyhow::{Context, Result};
use ash::vk;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// A message produced while loading, held until the logger is running
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: log::Level,
    pub message: String,
}

impl Notice {
    fn new(level: log::Level, message: String) -> Self {
        Self { level, message }
    }

    pub fn emit(&self) {
        log::log!(self.level, "{}", self.message);
    }
}

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub application: ApplicationConfig,
    pub debug: DebugConfig,
}

/// Window settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    /// How long one poll may block waiting for events. 0 polls without waiting.
    pub poll_timeout_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Penguin Physical Engine".to_string(),
            width: 800,
            height: 600,
            resizable: false,
            poll_timeout_ms: 0,
        }
    }
}

/// Application metadata handed to the Vulkan instance
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub name: String,
    pub version: [u32; 3],
    pub engine_name: String,
    pub engine_version: [u32; 3],
    pub api_version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "Penguin Physical Engine".to_string(),
            version: [1, 0, 0],
            engine_name: "No Engine".to_string(),
            engine_version: [1, 0, 0],
            api_version: "1.4".to_string(),
        }
    }
}

/// Debug settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Check required extensions against the driver before creating the instance
    pub verify_extensions: bool,
    /// Create a window surface after the instance
    pub create_surface: bool,
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            verify_extensions: true,
            create_surface: true,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from config.toml, falling back to defaults if not
    /// found or broken. Logging is not up yet, so messages come back as notices.
    pub fn load() -> (Self, Vec<Notice>) {
        Self::load_with_notices(DEFAULT_CONFIG_PATH)
    }

    pub fn load_with_notices<P: AsRef<Path>>(path: P) -> (Self, Vec<Notice>) {
        let path = path.as_ref();
        let mut notices = Vec::new();

        let config = match Self::load_from_path(path) {
            Ok(Some(config)) => {
                notices.push(Notice::new(
                    log::Level::Info,
                    format!("Loaded configuration from {:?}", path),
                ));
                notices.push(Notice::new(log::Level::Debug, format!("Config: {:?}", config)));
                config
            }
            Ok(None) => {
                notices.push(Notice::new(
                    log::Level::Info,
                    format!("Config file not found at {:?}, using defaults", path),
                ));
                Config::default()
            }
            Err(e) => {
                notices.push(Notice::new(
                    log::Level::Warn,
                    format!("Failed to load {:?}: {:#}. Using defaults.", path, e),
                ));
                Config::default()
            }
        };

        if config.debug.log_level.parse::<log::LevelFilter>().is_err() {
            notices.push(Notice::new(
                log::Level::Warn,
                format!(
                    "Unknown log level '{}', defaulting to info",
                    config.debug.log_level
                ),
            ));
        }

        (config, notices)
    }

    /// Load configuration from a specific path. `None` if the file does not exist.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(Some(config))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Target API version as a packed Vulkan version number
    pub fn api_version(&self) -> u32 {
        match self.application.api_version.trim() {
            "1.0" => vk::API_VERSION_1_0,
            "1.1" => vk::API_VERSION_1_1,
            "1.2" => vk::API_VERSION_1_2,
            "1.3" => vk::API_VERSION_1_3,
            "1.4" => vk::make_api_version(0, 1, 4, 0),
            other => {
                log::warn!("Unknown API version '{}', defaulting to 1.4", other);
                vk::make_api_version(0, 1, 4, 0)
            }
        }
    }

    pub fn application_version(&self) -> u32 {
        pack_version(self.application.version)
    }

    pub fn engine_version(&self) -> u32 {
        pack_version(self.application.engine_version)
    }

    /// Configured level; unknown names mean info (reported by `load_with_notices`)
    pub fn log_level(&self) -> log::LevelFilter {
        self.debug
            .log_level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }
}

fn pack_version([major, minor, patch]: [u32; 3]) -> u32 {
    vk::make_api_version(0, major, minor, patch)
}
