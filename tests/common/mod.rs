//! Shared integration test helpers for keycommand-kit.
//!
//! Include with `mod common;` at the top of a test file. The
//! `#[allow(dead_code)]` attribute suppresses warnings when only a subset of
//! helpers are used per file.

#![allow(dead_code)]

use keycommand_kit::{KeyBinding, KeyBindingsProvider, KeyCommandSettings, Provider};
use tempfile::TempDir;

/// Creates a temporary directory and settings whose customization store
/// lives inside it.
///
/// The `TempDir` must be kept alive for the duration of the test.
pub fn settings_with_tmp_store() -> (KeyCommandSettings, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let settings = KeyCommandSettings::default()
        .with_storage_path(temp_dir.path().join("customizations.yaml"));
    (settings, temp_dir)
}

/// A small editor-like provider used across tests.
pub struct TextEditing;

impl KeyBindingsProvider for TextEditing {
    fn provider(&self) -> Provider {
        Provider::new("text-editing", "Text Editing")
    }

    fn provide_key_bindings(&self) -> Vec<KeyBinding> {
        vec![
            KeyBinding::parse("bold", "Bold", "Cmd+B", true).expect("valid combination"),
            KeyBinding::parse("italic", "Italic", "Cmd+I", true).expect("valid combination"),
            KeyBinding::parse("indent", "Indent", "Tab", false).expect("valid combination"),
        ]
    }
}
