//! Settings file and path resolution.
//!
//! Covers:
//! - `load` / `save_to` (YAML file I/O with atomic write)
//! - XDG-compliant path helpers (`settings_path`, `settings_dir`,
//!   `default_storage_path`)
//! - Opening the configured customization store

use crate::customizations::StoreFormat;
use crate::error::StoreError;
use crate::storage::{CustomizationStorage, FileStorage};
use crate::writer::BackgroundStorage;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name used under the platform config and data directories.
pub const APP_DIR_NAME: &str = "keycommand-kit";

/// Settings for the key binding subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyCommandSettings {
    /// Where customizations are stored. `None` uses [`Self::default_storage_path`].
    pub storage_path: Option<PathBuf>,

    /// Serialization format of the customization store.
    pub storage_format: StoreFormat,

    /// Combinations the editor rejects outright, in `Cmd+Shift+S` notation.
    pub forbidden_combinations: Vec<String>,

    /// Persist customizations on a background writer thread instead of
    /// blocking the caller.
    pub background_writes: bool,
}

impl Default for KeyCommandSettings {
    fn default() -> Self {
        Self {
            storage_path: None,
            storage_format: StoreFormat::Yaml,
            forbidden_combinations: Vec::new(),
            background_writes: false,
        }
    }
}

impl KeyCommandSettings {
    /// Load settings from the default location, falling back to defaults when
    /// no settings file exists.
    pub fn load() -> Result<Self> {
        let settings_path = Self::settings_path();
        log::info!("Key command settings path: {:?}", settings_path);
        Self::load_from(&settings_path)
    }

    /// Load settings from `path`, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("Settings file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        let settings: Self = serde_yaml_ng::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file {:?}", path))?;
        Ok(settings)
    }

    /// Save settings to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml_ng::to_string(self)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Builder method to set the storage path.
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Builder method to set the storage format.
    pub fn with_storage_format(mut self, format: StoreFormat) -> Self {
        self.storage_format = format;
        self
    }

    /// Builder method to add a forbidden combination.
    pub fn forbid(mut self, combination: impl Into<String>) -> Self {
        self.forbidden_combinations.push(combination.into());
        self
    }

    /// Builder method to toggle background writes.
    pub fn with_background_writes(mut self, enabled: bool) -> Self {
        self.background_writes = enabled;
        self
    }

    /// The storage path in effect: the configured one or the default for the
    /// configured format.
    pub fn effective_storage_path(&self) -> PathBuf {
        self.storage_path
            .clone()
            .unwrap_or_else(|| Self::default_storage_path(self.storage_format))
    }

    /// Open the configured customization store.
    pub fn open_storage(&self) -> Result<Box<dyn CustomizationStorage>, StoreError> {
        let file = FileStorage::new(self.effective_storage_path(), self.storage_format);
        if self.background_writes {
            Ok(Box::new(BackgroundStorage::new(file)?))
        } else {
            Ok(Box::new(file))
        }
    }

    /// Get the settings file path (using XDG convention)
    pub fn settings_path() -> PathBuf {
        Self::settings_dir().join("settings.yaml")
    }

    /// Get the settings directory path (using XDG convention)
    pub fn settings_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join(APP_DIR_NAME)
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            // Use XDG convention on all platforms: ~/.config/keycommand-kit
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join(APP_DIR_NAME)
            } else {
                PathBuf::from(".")
            }
        }
    }

    /// Get the default customization store path for `format`.
    pub fn default_storage_path(format: StoreFormat) -> PathBuf {
        let file_name = format!("customizations.{}", format.extension());
        #[cfg(target_os = "windows")]
        {
            if let Some(data_dir) = dirs::data_local_dir() {
                data_dir.join(APP_DIR_NAME).join(file_name)
            } else {
                PathBuf::from(file_name)
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Some(home_dir) = dirs::home_dir() {
                home_dir
                    .join(".local")
                    .join("share")
                    .join(APP_DIR_NAME)
                    .join(file_name)
            } else {
                PathBuf::from(file_name)
            }
        }
    }
}
