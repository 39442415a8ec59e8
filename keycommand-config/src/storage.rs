//! Storage collaborators for the customization map.
//!
//! The registry only knows the [`CustomizationStorage`] contract: load the
//! whole map, save the whole map. Implementations decide the byte format and
//! the medium.
//!
//! - [`FileStorage`]: YAML or JSON file with atomic write
//! - [`MemoryStorage`]: shared in-process map, used by tests and by hosts
//!   that persist through their own channel

use crate::customizations::{Customizations, StoreFormat};
use crate::error::StoreError;
use parking_lot::Mutex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loads and saves the nested customization map.
pub trait CustomizationStorage: Send + Sync + fmt::Debug {
    /// Load the stored customizations. A store that does not exist yet loads
    /// as an empty map.
    fn load(&self) -> Result<Customizations, StoreError>;

    /// Replace the stored customizations with `customizations`.
    fn save(&self, customizations: &Customizations) -> Result<(), StoreError>;

    /// Block until every previously accepted save has reached the medium.
    ///
    /// Synchronous storages have nothing to wait for.
    fn flush(&self) {}
}

impl<S: CustomizationStorage + ?Sized> CustomizationStorage for Arc<S> {
    fn load(&self) -> Result<Customizations, StoreError> {
        (**self).load()
    }

    fn save(&self, customizations: &Customizations) -> Result<(), StoreError> {
        (**self).save(customizations)
    }

    fn flush(&self) {
        (**self).flush()
    }
}

impl<S: CustomizationStorage + ?Sized> CustomizationStorage for Box<S> {
    fn load(&self) -> Result<Customizations, StoreError> {
        (**self).load()
    }

    fn save(&self, customizations: &Customizations) -> Result<(), StoreError> {
        (**self).save(customizations)
    }

    fn flush(&self) {
        (**self).flush()
    }
}

/// File-backed store.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash never leaves a half-written document behind. A mutex serializes
/// writers targeting this location.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    format: StoreFormat,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Create a store at `path` using `format`.
    pub fn new(path: impl Into<PathBuf>, format: StoreFormat) -> Self {
        Self {
            path: path.into(),
            format,
            write_lock: Mutex::new(()),
        }
    }

    /// Create a YAML store at `path`.
    pub fn yaml(path: impl Into<PathBuf>) -> Self {
        Self::new(path, StoreFormat::Yaml)
    }

    /// Create a JSON store at `path`.
    pub fn json(path: impl Into<PathBuf>) -> Self {
        Self::new(path, StoreFormat::Json)
    }

    /// Path of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialization format of the store file.
    pub fn format(&self) -> StoreFormat {
        self.format
    }

    fn temp_path(&self) -> PathBuf {
        let extension = match self.path.extension() {
            Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
            None => "tmp".to_string(),
        };
        self.path.with_extension(extension)
    }
}

impl CustomizationStorage for FileStorage {
    fn load(&self) -> Result<Customizations, StoreError> {
        if !self.path.exists() {
            log::debug!("No customization store at {:?}", self.path);
            return Ok(Customizations::default());
        }

        let contents =
            fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let customizations = self.format.decode(&contents)?;
        log::info!(
            "Loaded {} customization(s) from {:?}",
            customizations.len(),
            self.path
        );
        Ok(customizations)
    }

    fn save(&self, customizations: &Customizations) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let document = self.format.encode(customizations)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = self.temp_path();
        fs::write(&temp_path, document).map_err(|e| StoreError::io(&temp_path, e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        log::debug!(
            "Saved {} customization(s) to {:?}",
            customizations.len(),
            self.path
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    stored: Customizations,
    saves: usize,
}

/// In-memory store.
///
/// Clones share the same underlying map, so a test can hand one clone to a
/// registry and inspect what was saved through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an in-memory store pre-populated with `customizations`.
    pub fn with_contents(customizations: Customizations) -> Self {
        let storage = Self::default();
        storage.state.lock().stored = customizations;
        storage
    }

    /// Copy of the currently stored map.
    pub fn snapshot(&self) -> Customizations {
        self.state.lock().stored.clone()
    }

    /// Number of saves performed so far.
    pub fn save_count(&self) -> usize {
        self.state.lock().saves
    }
}

impl CustomizationStorage for MemoryStorage {
    fn load(&self) -> Result<Customizations, StoreError> {
        Ok(self.state.lock().stored.clone())
    }

    fn save(&self, customizations: &Customizations) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.stored = customizations.clone();
        state.saves += 1;
        Ok(())
    }
}
