#[cfg(feature = "app_utils")]
use std::path::PathBuf;

use crate::types::{EntityKind, NodeId};

/// Misuse of the scene graph. Picking and selection never produce these; they reduce every
/// failure to an empty result or a no-op.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("A scene node named {0:?} already exists")]
    DuplicateName(String),

    #[error("No scene node with id {0:?}")]
    NoSuchNode(NodeId),

    /// The root anchors the graph; it can be neither destroyed nor re-parented.
    #[error("The root node can't be destroyed")]
    RootImmutable,
}

/// A build action was refused by the game rules.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Not enough cash to build a {kind:?}: costs {cost}, have {cash}")]
    InsufficientFunds {
        kind: EntityKind,
        cost: u32,
        cash: u32,
    },

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Loading or saving settings failed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "app_utils")]
    #[error("Error encoding preferences: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[cfg(feature = "app_utils")]
    #[error("Error decoding preferences from {path}. Did the format change? {source}")]
    Decode {
        path: PathBuf,
        source: bincode::error::DecodeError,
    },

    #[error("Invalid resolution {0:?}; expected WIDTHxHEIGHT")]
    Resolution(String),
}
