//! Settings and customization persistence for keycommand-kit.
//!
//! This crate owns everything the key binding registry needs to remember a
//! user's remappings across sessions. It includes:
//!
//! - The persisted shape of customizations (`Customizations`)
//! - Storage collaborators (file, in-memory, background single-writer)
//! - The settings file and XDG path resolution
//! - Typed store errors

pub mod customizations;
pub mod error;
pub mod settings;
pub mod storage;
pub mod writer;

pub use customizations::{Customizations, StoreFormat, StoredCombination};
pub use error::StoreError;
pub use settings::{APP_DIR_NAME, KeyCommandSettings};
pub use storage::{CustomizationStorage, FileStorage, MemoryStorage};
pub use writer::BackgroundStorage;
