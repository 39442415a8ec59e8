//! Key binding registry for keycommand-kit.
//!
//! Hosts register default bindings grouped by provider, users customize them
//! through an editor, and the registry persists the overrides so they survive
//! restarts.
//!
//! Features:
//! - Provider-scoped default bindings with stable identifiers
//! - Customizations stored separately and layered over defaults on read
//! - Unassigned bindings that never match and never conflict
//! - Conflict detection and resolution when an edit collides with another binding
//! - Forbidden combinations reserved by the host

pub mod binding;
pub mod combination;
pub mod command;
pub mod error;
pub mod parser;
pub mod provider;
pub mod registry;
pub mod resolver;

pub use binding::KeyBinding;
pub use combination::{Combination, Input, Modifiers, NamedInput, UNASSIGNED_INPUT};
pub use command::{KeyCommand, KeyCommandSet};
pub use error::{RegistryError, Result};
pub use parser::{ParseError, parse_combination};
pub use provider::{GlobalKeyBindingsProvider, KeyBindingsProvider, Provider, ProviderId};
pub use registry::{BindingRef, Conflict, IndexPath, KeyBindingsRegistry};
pub use resolver::{
    Decision, EditorSlot, EditorState, KeyBindingEditor, Outcome, ProposalResult, RevertCheck,
};
