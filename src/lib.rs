//! keycommand-kit: user-customizable keyboard shortcuts.
//!
//! Re-exports the binding registry and configuration crates, builds a
//! registry from [`KeyCommandSettings`], and owns the process-wide default
//! instance most hosts use.
//!
//! ```ignore
//! use keycommand_kit::{KeyBinding, shared};
//!
//! let mut registry = shared().write();
//! registry.register_global(KeyBinding::parse("find", "Find", "Cmd+F", true)?)?;
//! ```

pub use keycommand_bindings::{
    BindingRef, Combination, Conflict, Decision, EditorSlot, EditorState,
    GlobalKeyBindingsProvider, IndexPath, Input, KeyBinding, KeyBindingEditor,
    KeyBindingsProvider, KeyBindingsRegistry, KeyCommand, KeyCommandSet, Modifiers, NamedInput,
    Outcome, ParseError, ProposalResult, Provider, ProviderId, RegistryError, RevertCheck,
    UNASSIGNED_INPUT, parse_combination,
};
pub use keycommand_config::{
    BackgroundStorage, CustomizationStorage, Customizations, FileStorage, KeyCommandSettings,
    MemoryStorage, StoreError, StoreFormat, StoredCombination,
};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Application version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static SHARED: LazyLock<RwLock<KeyBindingsRegistry>> = LazyLock::new(|| {
    let settings = KeyCommandSettings::load().unwrap_or_else(|e| {
        log::error!("Failed to load key command settings, using defaults: {:#}", e);
        KeyCommandSettings::default()
    });
    let registry = RwLock::new(build_registry(&settings));
    SHARED_INITIALIZED.store(true, Ordering::Release);
    registry
});

static SHARED_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// The process-wide registry, built from the default settings file on first
/// access.
///
/// Statics are never dropped, so a background writer behind this registry is
/// not drained at exit. Hosts that enable `background_writes` must call
/// [`flush_shared`] from their shutdown path.
pub fn shared() -> &'static RwLock<KeyBindingsRegistry> {
    &SHARED
}

/// Block until every queued customization save of the shared registry has
/// reached storage. Call before process exit. Does nothing if the shared
/// registry was never used.
pub fn flush_shared() {
    if SHARED_INITIALIZED.load(Ordering::Acquire) {
        SHARED.read().flush();
        log::debug!("Flushed shared key binding customizations");
    }
}

/// Build a registry configured by `settings`.
///
/// A store that cannot be opened leaves the registry in memory-only mode.
/// Forbidden combinations that fail to parse are skipped.
pub fn build_registry(settings: &KeyCommandSettings) -> KeyBindingsRegistry {
    let mut registry = match settings.open_storage() {
        Ok(storage) => {
            log::info!(
                "Key binding customizations stored at {:?}",
                settings.effective_storage_path()
            );
            KeyBindingsRegistry::with_storage(storage)
        }
        Err(e) => {
            log::error!(
                "Failed to open key binding customization store, changes will not persist: {}",
                e
            );
            KeyBindingsRegistry::new()
        }
    };

    registry.set_forbidden_combinations(forbidden_combinations(settings));
    registry
}

/// Load settings from `path` and build a registry from them.
///
/// Unlike [`shared`], a malformed settings file is an error here.
pub fn load_registry_from(path: &Path) -> Result<KeyBindingsRegistry> {
    let settings = KeyCommandSettings::load_from(path)
        .with_context(|| format!("Failed to load key command settings from {:?}", path))?;
    Ok(build_registry(&settings))
}

/// Parse the settings' forbidden list, dropping entries that do not parse.
pub fn forbidden_combinations(settings: &KeyCommandSettings) -> Vec<Combination> {
    settings
        .forbidden_combinations
        .iter()
        .filter_map(|entry| match parse_combination(entry) {
            Ok(combination) if combination.is_unassigned() => {
                log::warn!("Ignoring forbidden combination '{}': unassigned", entry);
                None
            }
            Ok(combination) => Some(combination),
            Err(e) => {
                log::warn!("Ignoring forbidden combination '{}': {}", entry, e);
                None
            }
        })
        .collect()
}
