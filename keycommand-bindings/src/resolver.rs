//! Conflict resolution for the binding editor.
//!
//! A [`KeyBindingEditor`] drives one edit of one binding:
//!
//! ```text
//! Editing { pending, awaiting } ──commit──▶ Committed(Outcome)
//!        │
//!        └─────────cancel─────────▶ Cancelled
//! ```
//!
//! Captured chords, revert and unassign requests only change the editor's own
//! state. When a request collides with another binding, the editor parks it as
//! an awaiting decision until the user picks a resolution or declines. The
//! registry is untouched until [`KeyBindingEditor::commit`], so cancelling
//! leaves it exactly as it was.

use crate::binding::KeyBinding;
use crate::combination::Combination;
use crate::error::Result;
use crate::registry::{BindingRef, Conflict, KeyBindingsRegistry};

/// A committable result of an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Customize the edited binding to the carried binding's combination.
    Customize(KeyBinding),
    /// Unassign `conflict` and customize the edited binding.
    UnassignAndCustomize {
        conflict: Conflict,
        binding: KeyBinding,
    },
    /// Restore the edited binding's default.
    Revert,
    /// Restore the edited binding's default and unassign the binding that
    /// currently holds it.
    RevertAndUnassign(Conflict),
    /// Restore both the edited binding and the conflicting binding to their
    /// defaults.
    RevertBoth(Conflict),
    /// Deactivate the edited binding.
    Unassign,
}

impl Outcome {
    /// The other binding this outcome also writes, if any.
    pub fn conflict(&self) -> Option<&Conflict> {
        match self {
            Outcome::UnassignAndCustomize { conflict, .. }
            | Outcome::RevertAndUnassign(conflict)
            | Outcome::RevertBoth(conflict) => Some(conflict),
            Outcome::Customize(_) | Outcome::Revert | Outcome::Unassign => None,
        }
    }

    /// Short name, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Customize(_) => "customize",
            Outcome::UnassignAndCustomize { .. } => "unassign-and-customize",
            Outcome::Revert => "revert",
            Outcome::RevertAndUnassign(_) => "revert-and-unassign",
            Outcome::RevertBoth(_) => "revert-both",
            Outcome::Unassign => "unassign",
        }
    }
}

/// A request blocked on an explicit user choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The proposed combination is held by `conflict`.
    Displacement {
        binding: KeyBinding,
        conflict: Conflict,
    },
    /// The default combination is held by `conflict`.
    Revert {
        conflict: Conflict,
        /// Reverting both is only offered when the conflict holds our default
        /// through a customization, its own default differs from ours, and no
        /// third binding currently holds its default.
        can_revert_both: bool,
    },
}

/// Editor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    Editing {
        pending: Option<Outcome>,
        awaiting: Option<Decision>,
    },
    Committed(Outcome),
    Cancelled,
}

/// Result of handing a captured chord to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalResult {
    /// No conflict; the proposal is now the pending outcome.
    Accepted,
    /// The combination is reserved and was discarded.
    Forbidden,
    /// Another binding holds the combination; call
    /// [`KeyBindingEditor::confirm_displacement`] or [`KeyBindingEditor::decline`].
    Conflict(Conflict),
    /// The editor is no longer editing.
    Closed,
}

/// Result of requesting a revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertCheck {
    /// No conflict; a plain revert is now the pending outcome.
    Ready,
    /// Another binding holds the default; call
    /// [`KeyBindingEditor::revert_and_unassign`], [`KeyBindingEditor::revert_both`]
    /// or [`KeyBindingEditor::decline`].
    Conflict {
        conflict: Conflict,
        can_revert_both: bool,
    },
    /// The editor is no longer editing.
    Closed,
}

/// Edit session for one binding.
#[derive(Debug, Clone)]
pub struct KeyBindingEditor {
    target: BindingRef,
    original: KeyBinding,
    state: EditorState,
}

impl KeyBindingEditor {
    /// Start editing the binding at `target`.
    pub fn begin(registry: &KeyBindingsRegistry, target: BindingRef) -> Result<Self> {
        let original = registry.effective_binding_at(&target)?;
        log::debug!("Editing key binding '{}' ({})", original.key(), original.combination());
        Ok(Self {
            target,
            original,
            state: EditorState::Editing {
                pending: None,
                awaiting: None,
            },
        })
    }

    pub fn target(&self) -> &BindingRef {
        &self.target
    }

    /// The effective binding when the edit began.
    pub fn original(&self) -> &KeyBinding {
        &self.original
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditorState::Editing { .. })
    }

    /// Whether a revert is meaningful for this binding.
    pub fn can_revert(&self) -> bool {
        self.original.is_customized()
    }

    /// The outcome `commit` would apply right now.
    pub fn pending_outcome(&self) -> Option<&Outcome> {
        match &self.state {
            EditorState::Editing { pending, .. } => pending.as_ref(),
            _ => None,
        }
    }

    /// The decision the user still has to make, if any.
    pub fn awaiting_decision(&self) -> Option<&Decision> {
        match &self.state {
            EditorState::Editing { awaiting, .. } => awaiting.as_ref(),
            _ => None,
        }
    }

    /// Handle a chord emitted by the key-capture collaborator.
    ///
    /// Forbidden combinations are dropped without touching the state.
    pub fn propose(
        &mut self,
        registry: &KeyBindingsRegistry,
        combination: Combination,
    ) -> ProposalResult {
        let EditorState::Editing { pending, awaiting } = &mut self.state else {
            return ProposalResult::Closed;
        };

        if registry.is_forbidden(&combination) {
            log::warn!(
                "Ignoring forbidden combination {} for key binding '{}'",
                combination,
                self.original.key()
            );
            return ProposalResult::Forbidden;
        }

        if combination.is_unassigned() {
            *awaiting = None;
            *pending = Some(Outcome::Unassign);
            return ProposalResult::Accepted;
        }

        let binding = self.original.customized(combination);
        match registry.first_conflict(&combination, Some(&self.target)) {
            None => {
                *awaiting = None;
                *pending = Some(Outcome::Customize(binding));
                ProposalResult::Accepted
            }
            Some(conflict) => {
                log::debug!(
                    "Combination {} for '{}' conflicts with '{}' ({})",
                    combination,
                    self.original.key(),
                    conflict.binding.key(),
                    conflict.provider
                );
                *awaiting = Some(Decision::Displacement {
                    binding,
                    conflict: conflict.clone(),
                });
                ProposalResult::Conflict(conflict)
            }
        }
    }

    /// Accept a conflicting proposal by unassigning the binding that holds
    /// the combination. Returns `false` when no such proposal is awaiting.
    pub fn confirm_displacement(&mut self) -> bool {
        let EditorState::Editing { pending, awaiting } = &mut self.state else {
            return false;
        };
        match awaiting.take() {
            Some(Decision::Displacement { binding, conflict }) => {
                *pending = Some(Outcome::UnassignAndCustomize { conflict, binding });
                true
            }
            other => {
                *awaiting = other;
                false
            }
        }
    }

    /// Drop the awaiting decision, keeping whatever was pending before it.
    pub fn decline(&mut self) {
        if let EditorState::Editing { awaiting, .. } = &mut self.state {
            *awaiting = None;
        }
    }

    /// Request that the binding's default combination be restored.
    pub fn request_revert(&mut self, registry: &KeyBindingsRegistry) -> RevertCheck {
        let EditorState::Editing { pending, awaiting } = &mut self.state else {
            return RevertCheck::Closed;
        };

        let default = self.original.default_combination();
        match registry.first_conflict(&default, Some(&self.target)) {
            None => {
                *awaiting = None;
                *pending = Some(Outcome::Revert);
                RevertCheck::Ready
            }
            Some(conflict) => {
                let conflict_default = conflict.binding.default_combination();
                let can_revert_both = conflict.binding.is_customized()
                    && conflict_default != default
                    && registry
                        .first_conflict_excluding(
                            &conflict_default,
                            &[self.target.clone(), conflict.binding_ref()],
                        )
                        .is_none();
                *awaiting = Some(Decision::Revert {
                    conflict: conflict.clone(),
                    can_revert_both,
                });
                RevertCheck::Conflict {
                    conflict,
                    can_revert_both,
                }
            }
        }
    }

    /// Resolve a conflicting revert by unassigning the binding holding the
    /// default. Returns `false` when no revert decision is awaiting.
    pub fn revert_and_unassign(&mut self) -> bool {
        let EditorState::Editing { pending, awaiting } = &mut self.state else {
            return false;
        };
        match awaiting.take() {
            Some(Decision::Revert { conflict, .. }) => {
                *pending = Some(Outcome::RevertAndUnassign(conflict));
                true
            }
            other => {
                *awaiting = other;
                false
            }
        }
    }

    /// Resolve a conflicting revert by reverting the conflicting binding too.
    /// Returns `false` when no revert decision is awaiting or reverting both
    /// would not clear the conflict.
    pub fn revert_both(&mut self) -> bool {
        let EditorState::Editing { pending, awaiting } = &mut self.state else {
            return false;
        };
        match awaiting.take() {
            Some(Decision::Revert {
                conflict,
                can_revert_both: true,
            }) => {
                *pending = Some(Outcome::RevertBoth(conflict));
                true
            }
            other => {
                *awaiting = other;
                false
            }
        }
    }

    /// Deactivate the binding. Always possible: unassigning cannot conflict.
    pub fn unassign(&mut self) -> bool {
        let EditorState::Editing { pending, awaiting } = &mut self.state else {
            return false;
        };
        *awaiting = None;
        *pending = Some(Outcome::Unassign);
        true
    }

    /// Abandon the edit, discarding any pending outcome.
    pub fn cancel(&mut self) {
        if self.is_editing() {
            log::debug!("Cancelled edit of key binding '{}'", self.original.key());
            self.state = EditorState::Cancelled;
        }
    }

    /// Apply the pending outcome to `registry` and close the editor.
    ///
    /// Returns the committed outcome, or `None` when nothing was pending (the
    /// editor is then closed as cancelled) or the editor was already closed.
    ///
    /// # Panics
    ///
    /// Panics if the outcome references a binding that is no longer
    /// registered. Bindings are append-only, so this is a broken invariant
    /// rather than a runtime condition.
    pub fn commit(&mut self, registry: &mut KeyBindingsRegistry) -> Option<Outcome> {
        let EditorState::Editing { pending, .. } = &mut self.state else {
            return None;
        };
        let Some(outcome) = pending.take() else {
            self.state = EditorState::Cancelled;
            return None;
        };

        if let Err(e) = registry.apply(&self.target, &outcome) {
            panic!(
                "Broken key binding invariant committing {} for '{}': {}",
                outcome.kind(),
                self.target.key,
                e
            );
        }

        self.state = EditorState::Committed(outcome.clone());
        Some(outcome)
    }
}

/// Holder of the single active edit session.
///
/// Key capture is exclusive: beginning a new session cancels the previous
/// uncommitted one.
#[derive(Debug, Default)]
pub struct EditorSlot {
    active: Option<KeyBindingEditor>,
}

impl EditorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin editing `target`, cancelling any session still in progress.
    pub fn begin(
        &mut self,
        registry: &KeyBindingsRegistry,
        target: BindingRef,
    ) -> Result<&mut KeyBindingEditor> {
        let editor = KeyBindingEditor::begin(registry, target)?;
        if let Some(mut previous) = self.active.take() {
            previous.cancel();
        }
        Ok(self.active.insert(editor))
    }

    /// The session in progress, if any.
    pub fn active(&self) -> Option<&KeyBindingEditor> {
        self.active.as_ref().filter(|editor| editor.is_editing())
    }

    pub fn active_mut(&mut self) -> Option<&mut KeyBindingEditor> {
        self.active.as_mut().filter(|editor| editor.is_editing())
    }

    /// Commit the session in progress and close it.
    pub fn commit(&mut self, registry: &mut KeyBindingsRegistry) -> Option<Outcome> {
        let mut editor = self.active.take()?;
        editor.commit(registry)
    }

    /// Cancel the session in progress and close it.
    pub fn cancel(&mut self) {
        if let Some(mut editor) = self.active.take() {
            editor.cancel();
        }
    }
}
