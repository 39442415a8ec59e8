//! Persisted shape of user customizations.
//!
//! The store is a nested mapping
//! `provider-id -> binding-key -> { input, modifiers }` holding only bindings
//! that currently carry an override. Absent entries mean "use the default".
//! This crate treats `input` as an opaque canonical string and `modifiers` as
//! an opaque bitmask; the bindings crate owns their meaning.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One persisted override: the canonical input string and the modifier bitmask.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredCombination {
    /// Canonical input string (a character, a symbolic key name or the
    /// unassigned sentinel).
    pub input: String,
    /// Modifier bitmask. Stored wide so entries carrying bits this version
    /// does not know still load.
    pub modifiers: u64,
}

impl StoredCombination {
    /// Create a stored combination from its raw parts.
    pub fn new(input: impl Into<String>, modifiers: u64) -> Self {
        Self {
            input: input.into(),
            modifiers,
        }
    }
}

/// Serialization format of a file-backed store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    /// YAML document (the default, like the rest of the settings files).
    #[default]
    Yaml,
    /// JSON document.
    Json,
}

impl StoreFormat {
    /// File extension conventionally used for this format.
    pub fn extension(self) -> &'static str {
        match self {
            StoreFormat::Yaml => "yaml",
            StoreFormat::Json => "json",
        }
    }

    /// Encode a customization map in this format.
    pub fn encode(self, customizations: &Customizations) -> Result<String, StoreError> {
        Ok(match self {
            StoreFormat::Yaml => serde_yaml_ng::to_string(customizations)?,
            StoreFormat::Json => serde_json::to_string_pretty(customizations)?,
        })
    }

    /// Decode a customization map from this format.
    ///
    /// Empty (or whitespace-only) documents decode to an empty map.
    pub fn decode(self, contents: &str) -> Result<Customizations, StoreError> {
        if contents.trim().is_empty() {
            return Ok(Customizations::default());
        }
        Ok(match self {
            StoreFormat::Yaml => serde_yaml_ng::from_str(contents)?,
            StoreFormat::Json => serde_json::from_str(contents)?,
        })
    }
}

/// All active customizations, keyed by provider identity then binding key.
///
/// Backed by `BTreeMap`s so the encoded document is stable across saves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Customizations {
    providers: BTreeMap<String, BTreeMap<String, StoredCombination>>,
}

impl Customizations {
    /// Create an empty customization map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the override for `key` under `provider`.
    pub fn get(&self, provider: &str, key: &str) -> Option<&StoredCombination> {
        self.providers.get(provider)?.get(key)
    }

    /// All overrides stored for one provider.
    pub fn for_provider(&self, provider: &str) -> Option<&BTreeMap<String, StoredCombination>> {
        self.providers.get(provider)
    }

    /// Insert or overwrite an override, returning the previous one.
    pub fn insert(
        &mut self,
        provider: impl Into<String>,
        key: impl Into<String>,
        combination: StoredCombination,
    ) -> Option<StoredCombination> {
        self.providers
            .entry(provider.into())
            .or_default()
            .insert(key.into(), combination)
    }

    /// Remove an override, returning it if it existed.
    ///
    /// Providers left without overrides are dropped so they do not linger as
    /// empty tables in the persisted document.
    pub fn remove(&mut self, provider: &str, key: &str) -> Option<StoredCombination> {
        let bindings = self.providers.get_mut(provider)?;
        let removed = bindings.remove(key);
        if bindings.is_empty() {
            self.providers.remove(provider);
        }
        removed
    }

    /// Whether `key` under `provider` carries an override.
    pub fn contains(&self, provider: &str, key: &str) -> bool {
        self.get(provider, key).is_some()
    }

    /// Total number of overrides across all providers.
    pub fn len(&self) -> usize {
        self.providers.values().map(BTreeMap::len).sum()
    }

    /// Whether no overrides are stored.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Iterate over `(provider, key, combination)` triples in stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &StoredCombination)> {
        self.providers.iter().flat_map(|(provider, bindings)| {
            bindings
                .iter()
                .map(move |(key, combination)| (provider.as_str(), key.as_str(), combination))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut map = Customizations::new();
        assert!(map.insert("editor", "save", StoredCombination::new("s", 12)).is_none());
        assert_eq!(map.get("editor", "save"), Some(&StoredCombination::new("s", 12)));
        assert!(map.get("editor", "open").is_none());
        assert!(map.get("browser", "save").is_none());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_insert_overwrites() {
        let mut map = Customizations::new();
        map.insert("editor", "save", StoredCombination::new("s", 8));
        let previous = map.insert("editor", "save", StoredCombination::new("s", 12));
        assert_eq!(previous, Some(StoredCombination::new("s", 8)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove_prunes_empty_provider() {
        let mut map = Customizations::new();
        map.insert("editor", "save", StoredCombination::new("s", 8));
        assert!(map.remove("editor", "save").is_some());
        assert!(map.is_empty());
        assert!(map.for_provider("editor").is_none());
        assert!(map.remove("editor", "save").is_none());
    }

    #[test]
    fn test_yaml_shape() {
        let mut map = Customizations::new();
        map.insert("editor", "save", StoredCombination::new("s", 12));
        let yaml = StoreFormat::Yaml.encode(&map).unwrap();
        assert!(yaml.contains("editor:"));
        assert!(yaml.contains("save:"));
        assert!(yaml.contains("input: s"));
        assert!(yaml.contains("modifiers: 12"));
    }

    #[test]
    fn test_json_shape() {
        let mut map = Customizations::new();
        map.insert("editor", "save", StoredCombination::new("Unassigned", 0));
        let json = StoreFormat::Json.encode(&map).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["editor"]["save"]["input"], "Unassigned");
        assert_eq!(value["editor"]["save"]["modifiers"], 0);
    }

    #[test]
    fn test_decode_keeps_wide_modifier_masks() {
        let json = r#"{
            "document": {
                "save": { "input": "s", "modifiers": 8 },
                "close": { "input": "w", "modifiers": 1048576 }
            }
        }"#;
        let map = StoreFormat::Json.decode(json).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("document", "save"), Some(&StoredCombination::new("s", 8)));
        assert_eq!(map.get("document", "close").unwrap().modifiers, 1 << 20);

        let yaml = "document:\n  close:\n    input: w\n    modifiers: 1048577\n";
        let map = StoreFormat::Yaml.decode(yaml).unwrap();
        assert_eq!(map.get("document", "close").unwrap().modifiers, 1048577);
    }

    #[test]
    fn test_decode_empty_document() {
        assert!(StoreFormat::Yaml.decode("").unwrap().is_empty());
        assert!(StoreFormat::Json.decode("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(StoreFormat::Json.decode("{not json").is_err());
        assert!(StoreFormat::Yaml.decode("editor: [1, 2").is_err());
    }

    #[test]
    fn test_iter_is_ordered() {
        let mut map = Customizations::new();
        map.insert("b", "z", StoredCombination::new("z", 1));
        map.insert("a", "y", StoredCombination::new("y", 2));
        map.insert("a", "x", StoredCombination::new("x", 4));
        let keys: Vec<(&str, &str)> = map.iter().map(|(p, k, _)| (p, k)).collect();
        assert_eq!(keys, vec![("a", "x"), ("a", "y"), ("b", "z")]);
    }
}
