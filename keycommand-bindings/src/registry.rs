//! The key binding registry.
//!
//! Owns every provider's default bindings, the user's customizations and the
//! forbidden-combination list. Defaults are append-only; user edits only ever
//! touch the customization map, and the effective binding for any
//! (provider, key) pair is derived on demand:
//! `effective = customization ?? default`.
//!
//! Providers and bindings live in insertion-ordered tables, so positional
//! accessors (used for list rendering) are plain index lookups that stay
//! stable for the whole session.

use crate::binding::KeyBinding;
use crate::combination::Combination;
use crate::command::KeyCommandSet;
use crate::error::{RegistryError, Result};
use crate::provider::{KeyBindingsProvider, Provider, ProviderId};
use crate::resolver::Outcome;
use indexmap::{IndexMap, IndexSet};
use keycommand_config::{CustomizationStorage, Customizations};
use std::collections::HashMap;

/// Position of a binding in the registration-ordered provider list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexPath {
    pub provider: usize,
    pub binding: usize,
}

/// Reference to one registered binding: its provider position and key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingRef {
    pub provider_index: usize,
    pub key: String,
}

impl BindingRef {
    pub fn new(provider_index: usize, key: impl Into<String>) -> Self {
        Self {
            provider_index,
            key: key.into(),
        }
    }
}

/// Another binding whose effective combination collides with a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Position of the conflicting binding's provider.
    pub provider_index: usize,
    /// Identity of the conflicting binding's provider.
    pub provider: ProviderId,
    /// The conflicting binding, customization applied.
    pub binding: KeyBinding,
}

impl Conflict {
    pub fn binding_ref(&self) -> BindingRef {
        BindingRef::new(self.provider_index, self.binding.key())
    }
}

#[derive(Debug)]
struct ProviderRecord {
    provider: Provider,
    bindings: IndexMap<String, KeyBinding>,
}

/// Registry of key bindings, customizations and forbidden combinations.
#[derive(Debug, Default)]
pub struct KeyBindingsRegistry {
    providers: IndexMap<ProviderId, ProviderRecord>,
    customizations: Customizations,
    forbidden: IndexSet<Combination>,
    storage: Option<Box<dyn CustomizationStorage>>,
}

impl KeyBindingsRegistry {
    /// Create an empty registry with no storage. Customizations live in
    /// memory only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry backed by `storage`, loading any stored
    /// customizations.
    pub fn with_storage(storage: impl CustomizationStorage + 'static) -> Self {
        let mut registry = Self::new();
        registry.set_storage(storage);
        registry
    }

    /// Attach `storage`, replacing the in-memory customizations with what it
    /// holds.
    pub fn set_storage(&mut self, storage: impl CustomizationStorage + 'static) {
        self.customizations = load_best_effort(&storage);
        self.storage = Some(Box::new(storage));
    }

    /// Re-read customizations from storage. Without storage this is a no-op.
    pub fn reload_customizations(&mut self) {
        if let Some(storage) = &self.storage {
            self.customizations = load_best_effort(&**storage);
        }
    }

    /// Block until every customization save has reached storage.
    pub fn flush(&self) {
        if let Some(storage) = &self.storage {
            storage.flush();
        }
    }

    /// The active customizations, as persisted.
    pub fn customizations(&self) -> &Customizations {
        &self.customizations
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register `binding` under `provider`.
    ///
    /// Registering a key that already exists is a no-op when the combination
    /// is equivalent, and a [`RegistryError::DuplicateKeyConflict`] otherwise.
    /// A provider enters the positional index with its first binding.
    pub fn register(&mut self, binding: KeyBinding, provider: &Provider) -> Result<()> {
        let record = self
            .providers
            .entry(provider.id.clone())
            .or_insert_with(|| {
                log::debug!("Registered provider '{}' ({})", provider.name, provider.id);
                ProviderRecord {
                    provider: provider.clone(),
                    bindings: IndexMap::new(),
                }
            });

        match record.bindings.get(binding.key()) {
            None => {
                log::debug!(
                    "Registered key binding: {} -> {} ({})",
                    binding.combination(),
                    binding.key(),
                    provider.id
                );
                record.bindings.insert(binding.key().to_string(), binding);
                Ok(())
            }
            Some(existing) if existing.is_equivalent(&binding) => Ok(()),
            Some(existing) => Err(RegistryError::DuplicateKeyConflict {
                provider: provider.id.clone(),
                key: binding.key().to_string(),
                existing: existing.combination(),
                new: binding.combination(),
            }),
        }
    }

    /// Register `binding` under the global provider.
    pub fn register_global(&mut self, binding: KeyBinding) -> Result<()> {
        self.register(binding, &Provider::global())
    }

    /// Register every binding `source` provides.
    ///
    /// Stops at the first failure; bindings registered before it stay
    /// registered.
    pub fn register_provider(&mut self, source: &dyn KeyBindingsProvider) -> Result<()> {
        let provider = source.provider();
        let bindings = source.provide_key_bindings();
        let count = bindings.len();

        for binding in bindings {
            self.register(binding, &provider)?;
        }

        log::info!(
            "Registered {} key binding(s) for provider '{}'",
            count,
            provider.name
        );
        Ok(())
    }

    /// Whether `key` is registered for `provider`.
    pub fn contains(&self, key: &str, provider: &ProviderId) -> bool {
        self.providers
            .get(provider)
            .is_some_and(|record| record.bindings.contains_key(key))
    }

    // ------------------------------------------------------------------
    // Effective bindings
    // ------------------------------------------------------------------

    /// The registered default binding, ignoring customizations.
    pub fn default_binding(&self, key: &str, provider: &ProviderId) -> Result<&KeyBinding> {
        self.providers
            .get(provider)
            .and_then(|record| record.bindings.get(key))
            .ok_or_else(|| RegistryError::NotFound {
                provider: provider.clone(),
                key: key.to_string(),
            })
    }

    /// The binding in force for `key` under `provider`.
    pub fn effective_binding(&self, key: &str, provider: &ProviderId) -> Result<KeyBinding> {
        let default = self.default_binding(key, provider)?;
        Ok(self.apply_customization(provider, default))
    }

    /// Every binding in force for `provider`, in registration order. Unknown
    /// providers yield an empty map.
    pub fn effective_bindings(&self, provider: &ProviderId) -> IndexMap<String, KeyBinding> {
        self.providers
            .get(provider)
            .map(|record| {
                record
                    .bindings
                    .iter()
                    .map(|(key, default)| (key.clone(), self.apply_customization(provider, default)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn apply_customization(&self, provider: &ProviderId, default: &KeyBinding) -> KeyBinding {
        let Some(stored) = self.customizations.get(provider.as_str(), default.key()) else {
            return default.clone();
        };
        match Combination::from_stored(stored) {
            Ok(combination) => default.customized(combination),
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable customization for '{}' ({}): {}",
                    default.key(),
                    provider,
                    e
                );
                default.clone()
            }
        }
    }

    // ------------------------------------------------------------------
    // Positional accessors
    // ------------------------------------------------------------------

    /// Number of providers with at least one binding.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Number of bindings registered for the provider at `provider_index`.
    pub fn binding_count(&self, provider_index: usize) -> usize {
        self.providers
            .get_index(provider_index)
            .map_or(0, |(_, record)| record.bindings.len())
    }

    /// The effective binding at `binding_index` within the provider at
    /// `provider_index`.
    pub fn binding_at(&self, binding_index: usize, provider_index: usize) -> Option<KeyBinding> {
        let (id, record) = self.providers.get_index(provider_index)?;
        let (_, default) = record.bindings.get_index(binding_index)?;
        Some(self.apply_customization(id, default))
    }

    /// Display name of the provider at `provider_index`.
    pub fn name_of(&self, provider_index: usize) -> Option<&str> {
        self.providers
            .get_index(provider_index)
            .map(|(_, record)| record.provider.name.as_str())
    }

    /// Identity of the provider at `provider_index`.
    pub fn provider_id_of(&self, provider_index: usize) -> Option<&ProviderId> {
        self.providers.get_index(provider_index).map(|(id, _)| id)
    }

    /// Position of `provider` in the registration order.
    pub fn provider_index_of(&self, provider: &ProviderId) -> Option<usize> {
        self.providers.get_index_of(provider)
    }

    /// Position of the binding `key` registered under `provider`.
    pub fn index_path_of(&self, provider: &ProviderId, key: &str) -> Option<IndexPath> {
        let (provider_index, _, record) = self.providers.get_full(provider)?;
        let binding_index = record.bindings.get_index_of(key)?;
        Some(IndexPath {
            provider: provider_index,
            binding: binding_index,
        })
    }

    /// Resolve a binding reference to its provider identity and default binding.
    pub fn resolve(&self, target: &BindingRef) -> Result<(&ProviderId, &KeyBinding)> {
        let (id, record) = self.providers.get_index(target.provider_index).ok_or(
            RegistryError::ProviderIndexOutOfRange {
                index: target.provider_index,
                count: self.providers.len(),
            },
        )?;
        let default = record
            .bindings
            .get(&target.key)
            .ok_or_else(|| RegistryError::NotFound {
                provider: id.clone(),
                key: target.key.clone(),
            })?;
        Ok((id, default))
    }

    /// The effective binding for a binding reference.
    pub fn effective_binding_at(&self, target: &BindingRef) -> Result<KeyBinding> {
        let (id, default) = self.resolve(target)?;
        Ok(self.apply_customization(id, default))
    }

    // ------------------------------------------------------------------
    // Customizations
    // ------------------------------------------------------------------

    /// Override the combination of `key` in the provider at `provider_index`.
    ///
    /// Customizing a binding to its own default removes the override instead.
    pub fn register_customization(
        &mut self,
        provider_index: usize,
        key: &str,
        combination: Combination,
    ) -> Result<()> {
        let target = BindingRef::new(provider_index, key);
        if self.write_override(&target, Some(combination))? {
            self.persist();
        }
        Ok(())
    }

    /// Restore the default combination of `key`. No-op when not customized.
    pub fn remove_customization(&mut self, provider_index: usize, key: &str) -> Result<()> {
        let target = BindingRef::new(provider_index, key);
        if self.write_override(&target, None)? {
            self.persist();
        }
        Ok(())
    }

    /// Deactivate `key` by customizing it to the unassigned sentinel.
    pub fn customize_as_unassigned(&mut self, provider_index: usize, key: &str) -> Result<()> {
        self.register_customization(provider_index, key, Combination::unassigned())
    }

    /// Commit an editor outcome for `target` as one logical transaction.
    ///
    /// Every binding the outcome touches is validated before anything is
    /// written, so a failing outcome leaves the registry unchanged. The store
    /// is saved once.
    pub fn apply(&mut self, target: &BindingRef, outcome: &Outcome) -> Result<()> {
        self.resolve(target)?;
        let conflict = outcome.conflict().map(Conflict::binding_ref);
        if let Some(conflict) = &conflict {
            self.resolve(conflict)?;
        }

        let mut changed = false;
        match outcome {
            Outcome::Customize(binding) => {
                changed |= self.write_override(target, Some(binding.combination()))?;
            }
            Outcome::UnassignAndCustomize { binding, .. } => {
                if let Some(conflict) = &conflict {
                    changed |= self.write_override(conflict, Some(Combination::unassigned()))?;
                }
                changed |= self.write_override(target, Some(binding.combination()))?;
            }
            Outcome::Revert => {
                changed |= self.write_override(target, None)?;
            }
            Outcome::RevertAndUnassign(_) => {
                if let Some(conflict) = &conflict {
                    changed |= self.write_override(conflict, Some(Combination::unassigned()))?;
                }
                changed |= self.write_override(target, None)?;
            }
            Outcome::RevertBoth(_) => {
                if let Some(conflict) = &conflict {
                    changed |= self.write_override(conflict, None)?;
                }
                changed |= self.write_override(target, None)?;
            }
            Outcome::Unassign => {
                changed |= self.write_override(target, Some(Combination::unassigned()))?;
            }
        }

        log::info!("Applied {} to key binding '{}'", outcome.kind(), target.key);
        if changed {
            self.persist();
        }
        Ok(())
    }

    /// Write (`Some`) or clear (`None`) the override for `target`. Returns
    /// whether the customization map changed.
    fn write_override(
        &mut self,
        target: &BindingRef,
        combination: Option<Combination>,
    ) -> Result<bool> {
        let (id, default) = self.resolve(target)?;
        let provider = id.as_str().to_string();
        let default_combination = default.combination();

        let changed = match combination {
            Some(combination) if combination != default_combination => {
                let stored = combination.to_stored();
                let previous = self
                    .customizations
                    .insert(provider.as_str(), target.key.as_str(), stored.clone());
                previous.as_ref() != Some(&stored)
            }
            _ => self
                .customizations
                .remove(&provider, &target.key)
                .is_some(),
        };
        Ok(changed)
    }

    fn persist(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(e) = storage.save(&self.customizations) {
            log::error!("Failed to save key binding customizations: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Conflicts
    // ------------------------------------------------------------------

    /// Find an effective binding whose combination equals `combination`.
    ///
    /// `excluding` names the binding being edited so it is not reported as
    /// conflicting with itself. Unassigned bindings never match, and querying
    /// the unassigned sentinel never finds anything.
    ///
    /// Providers are scanned in registration order and bindings in insertion
    /// order, so the result is deterministic for a given registry state.
    /// Callers should not rely on which of several colliding bindings is
    /// reported.
    pub fn first_conflict(
        &self,
        combination: &Combination,
        excluding: Option<&BindingRef>,
    ) -> Option<Conflict> {
        let excluding = excluding.map_or(&[][..], std::slice::from_ref);
        self.first_conflict_excluding(combination, excluding)
    }

    /// Like [`Self::first_conflict`], skipping every binding in `excluding`.
    ///
    /// Used to check what a two-binding change would collide with once both
    /// bindings have moved.
    pub fn first_conflict_excluding(
        &self,
        combination: &Combination,
        excluding: &[BindingRef],
    ) -> Option<Conflict> {
        if combination.is_unassigned() {
            return None;
        }

        for (provider_index, (id, record)) in self.providers.iter().enumerate() {
            for (key, default) in &record.bindings {
                let is_excluded = excluding.iter().any(|excluded| {
                    excluded.provider_index == provider_index && excluded.key == *key
                });
                if is_excluded {
                    continue;
                }

                let effective = self.apply_customization(id, default);
                if !effective.is_unassigned() && effective.combination() == *combination {
                    return Some(Conflict {
                        provider_index,
                        provider: id.clone(),
                        binding: effective,
                    });
                }
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Forbidden combinations
    // ------------------------------------------------------------------

    /// Reject `combination` in the editor from now on.
    pub fn forbid(&mut self, combination: Combination) {
        self.forbidden.insert(combination);
    }

    /// Replace the forbidden list.
    pub fn set_forbidden_combinations(
        &mut self,
        combinations: impl IntoIterator<Item = Combination>,
    ) {
        self.forbidden = combinations.into_iter().collect();
    }

    /// Whether the editor must reject `combination`.
    pub fn is_forbidden(&self, combination: &Combination) -> bool {
        self.forbidden.contains(combination)
    }

    /// The forbidden list, in the order it was declared.
    pub fn forbidden_combinations(&self) -> impl Iterator<Item = &Combination> {
        self.forbidden.iter()
    }

    // ------------------------------------------------------------------
    // Invocable commands
    // ------------------------------------------------------------------

    /// Build invocable commands for `provider` from an action table keyed by
    /// binding key. Unassigned bindings and bindings without an action are
    /// left out.
    pub fn key_commands<A: Clone>(
        &self,
        provider: &ProviderId,
        actions: &HashMap<String, A>,
    ) -> KeyCommandSet<A> {
        KeyCommandSet::from_bindings(self.effective_bindings(provider).into_values(), actions)
    }
}

fn load_best_effort(storage: &dyn CustomizationStorage) -> Customizations {
    match storage.load() {
        Ok(customizations) => customizations,
        Err(e) => {
            log::warn!(
                "Could not load key binding customizations, starting without any: {}",
                e
            );
            Customizations::default()
        }
    }
}
