//! Provider namespaces.
//!
//! A provider groups related bindings (one per feature area, typically) under
//! a stable identifier. The identifier is what the customization store is
//! keyed by, so it must not change between releases.

use crate::binding::KeyBinding;
use std::fmt;

/// Stable identity of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(String);

impl ProviderId {
    /// Identifier of the always-present global provider.
    pub const GLOBAL: &'static str = "global";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The global provider's identifier.
    pub fn global() -> Self {
        Self::new(Self::GLOBAL)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProviderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A provider's identity and display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
}

impl Provider {
    pub fn new(id: impl Into<ProviderId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The global provider, named "General".
    pub fn global() -> Self {
        Self::new(ProviderId::global(), "General")
    }
}

/// A source of default bindings for one provider.
pub trait KeyBindingsProvider {
    /// Identity and display name of the namespace the bindings live in.
    fn provider(&self) -> Provider;

    /// Default bindings, in the order they should be listed.
    fn provide_key_bindings(&self) -> Vec<KeyBinding>;
}

/// The global provider. It declares no bindings of its own; hosts register
/// individual global bindings through `KeyBindingsRegistry::register_global`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalKeyBindingsProvider;

impl KeyBindingsProvider for GlobalKeyBindingsProvider {
    fn provider(&self) -> Provider {
        Provider::global()
    }

    fn provide_key_bindings(&self) -> Vec<KeyBinding> {
        Vec::new()
    }
}
