//! Error taxonomy for model reads, mutations and writes.

use crate::catalog::{EntityKind, KindConstraint};
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised by the model engine.
///
/// Validation and merge errors are raised before any graph edge or index
/// entry is written, so a failed call leaves the model as it was.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to parse {}: {message}", document.display())]
    Parse { document: PathBuf, message: String },

    #[error("merge conflict: {path} is defined again by {}", document.display())]
    MergeConflict { path: String, document: PathBuf },

    #[error("name should not be empty for referrable {kind} entities")]
    NoShortName { kind: EntityKind },

    #[error("operation not possible: a node named '{name}' is already present in {parent}")]
    DuplicateChild { name: String, parent: String },

    #[error("operation not possible: path {path} is already taken")]
    DuplicatePath { path: String },

    #[error("operation not possible: {child} in {parent} should be an instance of {expected}")]
    InvalidChild {
        child: EntityKind,
        expected: KindConstraint,
        parent: String,
    },

    #[error("operation not possible: {target} set as '{slot}' should be an instance of {expected}")]
    InvalidReference {
        target: EntityKind,
        expected: KindConstraint,
        slot: String,
    },

    #[error(
        "file {} already exists; pass overwrite = true to replace it",
        path.display()
    )]
    FileExists { path: PathBuf },

    #[error("{kind} has no slot named '{slot}'")]
    UnknownSlot { kind: EntityKind, slot: String },

    #[error("slot '{slot}' of {kind} is not a {expected} slot")]
    SlotMismatch {
        kind: EntityKind,
        slot: String,
        expected: &'static str,
    },

    #[error("invalid value for '{slot}': {message}")]
    InvalidValue { slot: String, message: String },

    #[error("unknown entity handle {id}")]
    UnknownEntity { id: String },

    #[error("{entity} is already attached to the model")]
    AlreadyAttached { entity: String },

    #[error("{entity} is not attached to the model")]
    NotAttached { entity: String },

    #[error("moving {entity} below one of its own descendants would create a cycle")]
    CycleDetected { entity: String },

    #[error("operation not permitted on the model root")]
    RootEntity,

    #[error("no document is known to own {path}; assign one before saving")]
    NoSaveTarget { path: String },

    #[error("no model is loaded")]
    NoModel,

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fieldless classification of a [`ModelError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Parse,
    MergeConflict,
    NoShortName,
    DuplicateChild,
    DuplicatePath,
    InvalidChild,
    InvalidReference,
    FileExists,
    UnknownSlot,
    SlotMismatch,
    InvalidValue,
    UnknownEntity,
    AlreadyAttached,
    NotAttached,
    CycleDetected,
    RootEntity,
    NoSaveTarget,
    NoModel,
    Io,
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::Parse { .. } => ErrorKind::Parse,
            ModelError::MergeConflict { .. } => ErrorKind::MergeConflict,
            ModelError::NoShortName { .. } => ErrorKind::NoShortName,
            ModelError::DuplicateChild { .. } => ErrorKind::DuplicateChild,
            ModelError::DuplicatePath { .. } => ErrorKind::DuplicatePath,
            ModelError::InvalidChild { .. } => ErrorKind::InvalidChild,
            ModelError::InvalidReference { .. } => ErrorKind::InvalidReference,
            ModelError::FileExists { .. } => ErrorKind::FileExists,
            ModelError::UnknownSlot { .. } => ErrorKind::UnknownSlot,
            ModelError::SlotMismatch { .. } => ErrorKind::SlotMismatch,
            ModelError::InvalidValue { .. } => ErrorKind::InvalidValue,
            ModelError::UnknownEntity { .. } => ErrorKind::UnknownEntity,
            ModelError::AlreadyAttached { .. } => ErrorKind::AlreadyAttached,
            ModelError::NotAttached { .. } => ErrorKind::NotAttached,
            ModelError::CycleDetected { .. } => ErrorKind::CycleDetected,
            ModelError::RootEntity => ErrorKind::RootEntity,
            ModelError::NoSaveTarget { .. } => ErrorKind::NoSaveTarget,
            ModelError::NoModel => ErrorKind::NoModel,
            ModelError::Io { .. } => ErrorKind::Io,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ModelError::Io {
            path: path.into(),
            source,
        }
    }
}
