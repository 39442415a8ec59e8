//! Invocable key commands.
//!
//! Turns effective bindings into the commands a host installs on its
//! responder chain, and matches captured chords against them.

use crate::binding::KeyBinding;
use crate::combination::Combination;
use std::collections::HashMap;

/// One invocable command: a combination bound to a host action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCommand<A> {
    pub combination: Combination,
    pub action: A,
    /// Title shown in the system discoverability UI, for discoverable bindings.
    pub discoverability_title: Option<String>,
}

/// Commands built from a provider's effective bindings.
#[derive(Debug, Clone)]
pub struct KeyCommandSet<A> {
    commands: Vec<KeyCommand<A>>,
}

impl<A> Default for KeyCommandSet<A> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

impl<A: Clone> KeyCommandSet<A> {
    /// Build commands for every binding that has an entry in `actions`.
    ///
    /// Unassigned bindings are skipped: they must never become invocable.
    pub fn from_bindings(
        bindings: impl IntoIterator<Item = KeyBinding>,
        actions: &HashMap<String, A>,
    ) -> Self {
        let mut commands = Vec::new();
        for binding in bindings {
            if binding.is_unassigned() {
                log::trace!("Skipping unassigned key binding '{}'", binding.key());
                continue;
            }
            let Some(action) = actions.get(binding.key()) else {
                continue;
            };
            commands.push(KeyCommand {
                combination: binding.combination(),
                action: action.clone(),
                discoverability_title: binding
                    .is_discoverable()
                    .then(|| binding.name().to_string()),
            });
        }
        Self { commands }
    }
}

impl<A> KeyCommandSet<A> {
    /// Look up the action for a captured chord.
    ///
    /// Returns the first command whose combination matches. The unassigned
    /// sentinel never matches.
    pub fn lookup(&self, combination: &Combination) -> Option<&A> {
        if combination.is_unassigned() {
            return None;
        }
        self.commands
            .iter()
            .find(|command| command.combination == *combination)
            .map(|command| &command.action)
    }

    pub fn commands(&self) -> &[KeyCommand<A>] {
        &self.commands
    }

    /// Check if the set has any commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Get the number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }
}
