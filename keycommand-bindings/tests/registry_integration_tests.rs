//! Integration tests for keycommand-bindings.
//!
//! These tests exercise the full register → customize → persist → reload
//! pipeline through the public API, using real files in temporary
//! directories for the persistence cases.

use keycommand_bindings::{
    BindingRef, Combination, EditorSlot, KeyBinding, KeyBindingEditor, KeyBindingsProvider,
    KeyBindingsRegistry, Modifiers, NamedInput, Outcome, ProposalResult, Provider, ProviderId,
    RegistryError, RevertCheck, parse_combination,
};
use keycommand_config::{FileStorage, MemoryStorage, StoreFormat};
use std::collections::HashMap;
use tempfile::TempDir;

struct DocumentProvider;

impl KeyBindingsProvider for DocumentProvider {
    fn provider(&self) -> Provider {
        Provider::new("document", "Document")
    }

    fn provide_key_bindings(&self) -> Vec<KeyBinding> {
        vec![
            KeyBinding::parse("save", "Save", "Cmd+S", true).unwrap(),
            KeyBinding::parse("saveAs", "Save As", "Cmd+Shift+S", true).unwrap(),
            KeyBinding::parse("close", "Close", "Cmd+W", true).unwrap(),
        ]
    }
}

struct NavigationProvider;

impl KeyBindingsProvider for NavigationProvider {
    fn provider(&self) -> Provider {
        Provider::new("navigation", "Navigation")
    }

    fn provide_key_bindings(&self) -> Vec<KeyBinding> {
        vec![
            KeyBinding::parse("back", "Back", "Cmd+Left", true).unwrap(),
            KeyBinding::parse("forward", "Forward", "Cmd+Right", true).unwrap(),
            KeyBinding::parse("dismiss", "Dismiss", "Esc", false).unwrap(),
        ]
    }
}

/// Provider whose third binding reuses a key with a different combination.
struct BrokenProvider;

impl KeyBindingsProvider for BrokenProvider {
    fn provider(&self) -> Provider {
        Provider::new("broken", "Broken")
    }

    fn provide_key_bindings(&self) -> Vec<KeyBinding> {
        vec![
            KeyBinding::parse("a", "A", "Ctrl+A", true).unwrap(),
            KeyBinding::parse("b", "B", "Ctrl+B", true).unwrap(),
            KeyBinding::parse("a", "A again", "Ctrl+C", true).unwrap(),
            KeyBinding::parse("d", "D", "Ctrl+D", true).unwrap(),
        ]
    }
}

fn combo(s: &str) -> Combination {
    parse_combination(s).unwrap()
}

fn populate(registry: &mut KeyBindingsRegistry) {
    registry.register_provider(&DocumentProvider).unwrap();
    registry.register_provider(&NavigationProvider).unwrap();
}

fn document() -> ProviderId {
    ProviderId::from("document")
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn providers_listed_in_registration_order() {
    let mut registry = KeyBindingsRegistry::new();
    populate(&mut registry);

    assert_eq!(registry.provider_count(), 2);
    assert_eq!(registry.name_of(0), Some("Document"));
    assert_eq!(registry.name_of(1), Some("Navigation"));
    assert_eq!(registry.binding_count(0), 3);
    assert_eq!(registry.binding_at(1, 0).unwrap().key(), "saveAs");
    assert_eq!(registry.binding_at(2, 1).unwrap().key(), "dismiss");
    assert!(registry.binding_at(3, 0).is_none());
}

#[test]
fn registering_provider_twice_is_idempotent() {
    let mut registry = KeyBindingsRegistry::new();
    populate(&mut registry);
    populate(&mut registry);
    assert_eq!(registry.provider_count(), 2);
    assert_eq!(registry.binding_count(0), 3);
}

#[test]
fn duplicate_key_keeps_earlier_bindings() {
    let mut registry = KeyBindingsRegistry::new();
    let err = registry.register_provider(&BrokenProvider).unwrap_err();

    let RegistryError::DuplicateKeyConflict { key, existing, new, .. } = err else {
        panic!("expected duplicate key conflict, got {:?}", err);
    };
    assert_eq!(key, "a");
    assert_eq!(existing, combo("Ctrl+A"));
    assert_eq!(new, combo("Ctrl+C"));

    let broken = ProviderId::from("broken");
    assert!(registry.contains("a", &broken));
    assert!(registry.contains("b", &broken));
    assert!(!registry.contains("d", &broken));
}

#[test]
fn error_message_names_binding() {
    let mut registry = KeyBindingsRegistry::new();
    let err = registry.register_provider(&BrokenProvider).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("'a'"));
    assert!(message.contains("'broken'"));
}

// ---------------------------------------------------------------------------
// Effective bindings
// ---------------------------------------------------------------------------

#[test]
fn effective_is_default_until_customized() {
    let mut registry = KeyBindingsRegistry::new();
    populate(&mut registry);

    for (key, default) in registry.effective_bindings(&document()) {
        assert_eq!(&default, registry.default_binding(&key, &document()).unwrap());
        assert!(!default.is_customized());
    }

    registry
        .register_customization(0, "close", combo("Ctrl+W"))
        .unwrap();
    let close = registry.effective_binding("close", &document()).unwrap();
    assert_eq!(close.combination(), combo("Ctrl+W"));
    assert_eq!(close.default_combination(), combo("Cmd+W"));
    assert_eq!(close.name(), "Close");
    assert!(close.is_discoverable());
}

#[test]
fn index_path_round_trip() {
    let mut registry = KeyBindingsRegistry::new();
    populate(&mut registry);

    let navigation = ProviderId::from("navigation");
    let path = registry.index_path_of(&navigation, "forward").unwrap();
    assert_eq!(registry.provider_id_of(path.provider), Some(&navigation));
    assert_eq!(
        registry.binding_at(path.binding, path.provider).unwrap().key(),
        "forward"
    );
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn customizations_survive_restart_yaml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("customizations.yaml");

    {
        let mut registry = KeyBindingsRegistry::with_storage(FileStorage::yaml(&path));
        populate(&mut registry);
        registry
            .register_customization(0, "save", combo("Ctrl+Alt+S"))
            .unwrap();
        registry.customize_as_unassigned(1, "dismiss").unwrap();
    }

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("document"));
    assert!(contents.contains("Unassigned"));

    let mut registry = KeyBindingsRegistry::with_storage(FileStorage::yaml(&path));
    populate(&mut registry);
    assert_eq!(
        registry
            .effective_binding("save", &document())
            .unwrap()
            .combination(),
        combo("Ctrl+Alt+S")
    );
    assert!(
        registry
            .effective_binding("dismiss", &"navigation".into())
            .unwrap()
            .is_unassigned()
    );
}

#[test]
fn customizations_survive_restart_json() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("customizations.json");

    {
        let mut registry =
            KeyBindingsRegistry::with_storage(FileStorage::new(&path, StoreFormat::Json));
        populate(&mut registry);
        let alt_left = Combination::named(NamedInput::LeftArrow, Modifiers::ALTERNATE);
        registry.register_customization(1, "back", alt_left).unwrap();
    }

    let mut registry = KeyBindingsRegistry::with_storage(FileStorage::json(&path));
    populate(&mut registry);
    assert_eq!(
        registry
            .effective_binding("back", &"navigation".into())
            .unwrap()
            .combination(),
        combo("Alt+Left")
    );
}

#[test]
fn customizations_for_unregistered_providers_are_preserved() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("customizations.yaml");

    {
        let mut registry = KeyBindingsRegistry::with_storage(FileStorage::yaml(&path));
        populate(&mut registry);
        registry
            .register_customization(1, "forward", combo("Ctrl+F"))
            .unwrap();
    }

    // Navigation is not registered this session.
    let mut registry = KeyBindingsRegistry::with_storage(FileStorage::yaml(&path));
    registry.register_provider(&DocumentProvider).unwrap();
    registry
        .register_customization(0, "close", combo("Ctrl+Q"))
        .unwrap();

    let reloaded = KeyBindingsRegistry::with_storage(FileStorage::yaml(&path));
    assert!(reloaded.customizations().contains("navigation", "forward"));
    assert!(reloaded.customizations().contains("document", "close"));
}

#[test]
fn corrupt_store_starts_empty() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("customizations.yaml");
    std::fs::write(&path, "document: [not, a, map").unwrap();

    let mut registry = KeyBindingsRegistry::with_storage(FileStorage::yaml(&path));
    populate(&mut registry);
    assert!(registry.customizations().is_empty());
    assert!(
        !registry
            .effective_binding("save", &document())
            .unwrap()
            .is_customized()
    );
}

#[test]
fn foreign_modifier_bits_do_not_discard_the_store() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("customizations.json");
    std::fs::write(
        &path,
        r#"{
            "document": {
                "save": { "input": "s", "modifiers": 1 },
                "close": { "input": "w", "modifiers": 1048576 }
            }
        }"#,
    )
    .unwrap();

    let mut registry = KeyBindingsRegistry::with_storage(FileStorage::json(&path));
    populate(&mut registry);
    assert_eq!(registry.customizations().len(), 2);
    assert_eq!(
        registry
            .effective_binding("save", &document())
            .unwrap()
            .combination(),
        combo("Ctrl+S")
    );
    assert_eq!(
        registry
            .effective_binding("close", &document())
            .unwrap()
            .combination(),
        combo("W")
    );

    registry
        .register_customization(0, "close", combo("Ctrl+W"))
        .unwrap();
    let reloaded = KeyBindingsRegistry::with_storage(FileStorage::json(&path));
    assert!(reloaded.customizations().contains("document", "save"));
    assert!(reloaded.customizations().contains("document", "close"));
}

#[test]
fn reload_picks_up_external_changes() {
    let storage = MemoryStorage::new();
    let mut registry = KeyBindingsRegistry::with_storage(storage.clone());
    populate(&mut registry);

    let mut other = KeyBindingsRegistry::with_storage(storage.clone());
    populate(&mut other);
    other.register_customization(0, "save", combo("Ctrl+S")).unwrap();

    assert!(registry.customizations().is_empty());
    registry.reload_customizations();
    assert_eq!(
        registry
            .effective_binding("save", &document())
            .unwrap()
            .combination(),
        combo("Ctrl+S")
    );
}

// ---------------------------------------------------------------------------
// Conflicts
// ---------------------------------------------------------------------------

#[test]
fn conflicts_are_symmetric() {
    let mut registry = KeyBindingsRegistry::new();
    populate(&mut registry);
    registry
        .register_customization(1, "back", combo("Cmd+W"))
        .unwrap();

    let close = BindingRef::new(0, "close");
    let back = BindingRef::new(1, "back");

    let from_close = registry.first_conflict(&combo("Cmd+W"), Some(&close)).unwrap();
    assert_eq!(from_close.binding_ref(), back);
    let from_back = registry.first_conflict(&combo("Cmd+W"), Some(&back)).unwrap();
    assert_eq!(from_back.binding_ref(), close);
}

#[test]
fn unassigned_bindings_are_invisible() {
    let mut registry = KeyBindingsRegistry::new();
    populate(&mut registry);
    registry.customize_as_unassigned(0, "save").unwrap();

    assert!(registry.first_conflict(&combo("Cmd+S"), None).is_none());

    let actions = HashMap::from([
        ("save".to_string(), 1),
        ("saveAs".to_string(), 2),
        ("close".to_string(), 3),
    ]);
    let commands = registry.key_commands(&document(), &actions);
    assert_eq!(commands.len(), 2);
    assert!(commands.lookup(&combo("Cmd+S")).is_none());
    assert_eq!(commands.lookup(&combo("Cmd+Shift+S")), Some(&2));
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

#[test]
fn editor_displacement_persists_once() {
    let storage = MemoryStorage::new();
    let mut registry = KeyBindingsRegistry::with_storage(storage.clone());
    populate(&mut registry);

    let mut editor = KeyBindingEditor::begin(&registry, BindingRef::new(0, "save")).unwrap();
    let ProposalResult::Conflict(conflict) = editor.propose(&registry, combo("Cmd+W")) else {
        panic!("expected conflict with close");
    };
    assert_eq!(conflict.binding.key(), "close");
    assert!(editor.confirm_displacement());
    editor.commit(&mut registry).unwrap();

    assert_eq!(storage.save_count(), 1);
    let stored = storage.snapshot();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored.get("document", "close").unwrap().input, "Unassigned");
}

#[test]
fn revert_both_restores_defaults() {
    let mut registry = KeyBindingsRegistry::new();
    populate(&mut registry);
    registry
        .register_customization(0, "save", combo("Cmd+K"))
        .unwrap();
    registry
        .register_customization(0, "saveAs", combo("Cmd+S"))
        .unwrap();

    let mut editor = KeyBindingEditor::begin(&registry, BindingRef::new(0, "save")).unwrap();
    assert!(matches!(
        editor.request_revert(&registry),
        RevertCheck::Conflict {
            can_revert_both: true,
            ..
        }
    ));
    assert!(editor.revert_both());
    editor.commit(&mut registry);

    for (key, binding) in registry.effective_bindings(&document()) {
        assert!(!binding.is_customized(), "{} still customized", key);
    }
}

#[test]
fn revert_both_after_displacement_restores_both_defaults() {
    let mut registry = KeyBindingsRegistry::new();
    populate(&mut registry);
    let save = BindingRef::new(0, "save");

    let mut editor = KeyBindingEditor::begin(&registry, save.clone()).unwrap();
    let ProposalResult::Conflict(conflict) = editor.propose(&registry, combo("Cmd+Shift+S")) else {
        panic!("expected conflict with saveAs");
    };
    assert!(editor.confirm_displacement());
    editor.commit(&mut registry);
    assert!(
        registry
            .effective_binding("saveAs", &document())
            .unwrap()
            .is_unassigned()
    );

    // The displaced binding no longer holds Cmd+S, so the editor offers a
    // plain revert; reverting both is applied directly.
    let mut editor = KeyBindingEditor::begin(&registry, save.clone()).unwrap();
    assert_eq!(editor.request_revert(&registry), RevertCheck::Ready);
    editor.cancel();

    registry.apply(&save, &Outcome::RevertBoth(conflict)).unwrap();
    let save_binding = registry.effective_binding("save", &document()).unwrap();
    let save_as = registry.effective_binding("saveAs", &document()).unwrap();
    assert_eq!(save_binding.combination(), combo("Cmd+S"));
    assert_eq!(save_as.combination(), combo("Cmd+Shift+S"));
    assert!(registry.customizations().is_empty());
}

#[test]
fn apply_rejects_stale_conflict_without_writing() {
    let mut registry = KeyBindingsRegistry::new();
    populate(&mut registry);

    let mut editor = KeyBindingEditor::begin(&registry, BindingRef::new(0, "save")).unwrap();
    let ProposalResult::Conflict(mut conflict) = editor.propose(&registry, combo("Cmd+W")) else {
        panic!("expected conflict");
    };
    conflict.provider_index = 9;
    let outcome = Outcome::UnassignAndCustomize {
        conflict,
        binding: registry
            .effective_binding("save", &document())
            .unwrap()
            .customized(combo("Cmd+W")),
    };

    assert!(registry.apply(&BindingRef::new(0, "save"), &outcome).is_err());
    assert!(registry.customizations().is_empty());
}

#[test]
fn slot_keeps_one_session() {
    let mut registry = KeyBindingsRegistry::new();
    populate(&mut registry);
    let mut slot = EditorSlot::new();

    let first = slot.begin(&registry, BindingRef::new(0, "save")).unwrap();
    first.propose(&registry, combo("Ctrl+1"));
    let second = slot.begin(&registry, BindingRef::new(1, "back")).unwrap();
    second.propose(&registry, combo("Ctrl+2"));
    let committed = slot.commit(&mut registry).unwrap();

    assert!(matches!(committed, Outcome::Customize(_)));
    assert_eq!(registry.customizations().len(), 1);
    assert!(registry.customizations().contains("navigation", "back"));
}
