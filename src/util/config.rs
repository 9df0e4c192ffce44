//! Configuration file support for msbuildcc.
//!
//! Two configuration file locations are read:
//! - Global: `~/.msbuildcc/config.toml` - User-wide defaults
//! - Project: `.msbuildcc/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::platform::Platform;
use crate::util::fs::read_to_string;

/// Directory name used for both config locations.
pub const CONFIG_DIR: &str = ".msbuildcc";

/// msbuildcc configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Driver settings
    pub driver: DriverConfig,

    /// Toolchain discovery settings
    pub discovery: DiscoveryConfig,
}

/// Settings applied to every driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Default target platform (`win32`, `win-amd64`)
    pub platform: Option<String>,

    /// Forced `PlatformToolset`, skipping detection from the compiler path
    pub platform_toolset: Option<String>,

    /// Forced `DefaultWindowsSDKVersion`
    pub windows_sdk_version: Option<String>,

    /// Intermediate directory used when a compile names no output directory
    pub intermediate_dir: Option<PathBuf>,

    /// Extension that marks a shared object as a loadable module
    pub module_extension: Option<String>,

    /// Write projects but never run the orchestrator
    #[serde(default)]
    pub dry_run: bool,

    /// Extra items added to every project, keyed by item type
    #[serde(default)]
    pub items: BTreeMap<String, Vec<toml::Value>>,
}

/// Where toolchain instances come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Path to an instance manifest
    pub manifest: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.driver.platform.is_some() {
            self.driver.platform = other.driver.platform;
        }
        if other.driver.platform_toolset.is_some() {
            self.driver.platform_toolset = other.driver.platform_toolset;
        }
        if other.driver.windows_sdk_version.is_some() {
            self.driver.windows_sdk_version = other.driver.windows_sdk_version;
        }
        if other.driver.intermediate_dir.is_some() {
            self.driver.intermediate_dir = other.driver.intermediate_dir;
        }
        if other.driver.module_extension.is_some() {
            self.driver.module_extension = other.driver.module_extension;
        }
        if other.driver.dry_run {
            self.driver.dry_run = true;
        }
        // items of the same type are replaced, not concatenated
        self.driver.items.extend(other.driver.items);

        if other.discovery.manifest.is_some() {
            self.discovery.manifest = other.discovery.manifest;
        }
    }

    /// Parse the configured platform.
    pub fn platform(&self) -> Result<Option<Platform>> {
        self.driver
            .platform
            .as_deref()
            .map(|p| p.parse::<Platform>().map_err(anyhow::Error::from))
            .transpose()
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.msbuildcc/config.toml)
/// 2. Global config (~/.msbuildcc/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global config directory (~/.msbuildcc).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR))
}

/// Get the global config path (~/.msbuildcc/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.msbuildcc/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.toml")
}
