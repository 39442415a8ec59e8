//! Key binding values.
//!
//! A [`KeyBinding`] is immutable. Customizing one produces a new value that
//! keeps the identity fields (`key`, `name`, `is_discoverable`) and remembers
//! the default combination it replaced.

use crate::combination::{Combination, Input, Modifiers};
use crate::parser::{ParseError, parse_combination};

/// A named keyboard shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    key: String,
    name: String,
    is_discoverable: bool,
    combination: Combination,
    /// The default combination, present only while a customization is applied.
    original: Option<Combination>,
}

impl KeyBinding {
    /// Create a default binding.
    ///
    /// `key` is an internal identifier, unique within a provider and never
    /// shown to the user. `name` is the user-facing label.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        combination: Combination,
        is_discoverable: bool,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            is_discoverable,
            combination,
            original: None,
        }
    }

    /// Create a default binding from a combination string such as `"Cmd+S"`.
    pub fn parse(
        key: impl Into<String>,
        name: impl Into<String>,
        combination: &str,
        is_discoverable: bool,
    ) -> Result<Self, ParseError> {
        Ok(Self::new(
            key,
            name,
            parse_combination(combination)?,
            is_discoverable,
        ))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_discoverable(&self) -> bool {
        self.is_discoverable
    }

    /// The combination currently in force.
    pub fn combination(&self) -> Combination {
        self.combination
    }

    pub fn input(&self) -> Input {
        self.combination.input
    }

    pub fn modifiers(&self) -> Modifiers {
        self.combination.modifiers
    }

    /// Whether this binding is deactivated. Unassigned bindings never match
    /// and are never turned into invocable commands.
    pub fn is_unassigned(&self) -> bool {
        self.combination.is_unassigned()
    }

    /// Whether a user customization replaced the default combination.
    pub fn is_customized(&self) -> bool {
        self.original
            .is_some_and(|original| original != self.combination)
    }

    /// The default combination, whether or not a customization is applied.
    pub fn default_combination(&self) -> Combination {
        self.original.unwrap_or(self.combination)
    }

    /// The replaced default combination, if customized.
    pub fn original_combination(&self) -> Option<Combination> {
        self.original.filter(|_| self.is_customized())
    }

    /// Whether both bindings currently resolve to the same combination.
    pub fn is_equivalent(&self, other: &KeyBinding) -> bool {
        self.combination == other.combination
    }

    /// A copy of this binding with `combination` in force.
    ///
    /// The remembered default is always the registered one, even when
    /// customizing an already customized binding. Customizing back to the
    /// default yields a plain default binding.
    pub fn customized(&self, combination: Combination) -> KeyBinding {
        let default = self.default_combination();
        KeyBinding {
            combination,
            original: (combination != default).then_some(default),
            ..self.clone()
        }
    }

    /// A copy of this binding customized to the unassigned sentinel.
    pub fn unassigned(&self) -> KeyBinding {
        self.customized(Combination::unassigned())
    }

    /// A copy of this binding with its default combination restored.
    pub fn reverted(&self) -> KeyBinding {
        KeyBinding {
            combination: self.default_combination(),
            original: None,
            ..self.clone()
        }
    }
}
