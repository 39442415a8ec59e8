//! Typed error types for the key binding registry.

use crate::combination::Combination;
use crate::provider::ProviderId;
use thiserror::Error;

/// Errors returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A binding with this key is already registered under the provider with
    /// a different combination. Registration happens once with static data,
    /// so this is a programming error in the host.
    #[error(
        "Consistency error: attempted to register different key binding with same identifier '{key}' for provider '{provider}' (registered {existing}, new {new})"
    )]
    DuplicateKeyConflict {
        provider: ProviderId,
        key: String,
        existing: Combination,
        new: Combination,
    },

    /// No binding with this key is registered for the provider.
    #[error("No key binding with key '{key}' found for provider '{provider}'")]
    NotFound { provider: ProviderId, key: String },

    /// A positional accessor was given an index past the registered providers.
    #[error("Provider index {index} out of range ({count} provider(s) registered)")]
    ProviderIndexOutOfRange { index: usize, count: usize },
}

pub type Result<T> = std::result::Result<T, RegistryError>;
