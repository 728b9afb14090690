use std::fmt::Display;

use parley_shared::{ChatId, EntityKind, IntegrationType, ProjectId, UserId, ValidationError};
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An action referenced an id that is not in the store.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// A caller-chosen id is already taken.
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: EntityKind, id: String },

    /// A name, email or other field failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The action needs a current user and none is selected.
    #[error("No current user selected")]
    NoCurrentUser,

    /// `update_user_settings` was called before a settings row existed.
    #[error("No settings record exists for user {0}")]
    SettingsMissing(UserId),

    #[error("Email already in use: {0}")]
    DuplicateEmail(String),

    #[error("User {user_id} already has a {kind} integration")]
    DuplicateIntegration {
        user_id: UserId,
        kind: IntegrationType,
    },

    /// A chat was linked to a project owned by another user.
    #[error("Project {project_id} does not belong to the owner of chat {chat_id}")]
    OwnershipMismatch {
        chat_id: ChatId,
        project_id: ProjectId,
    },

    /// Delete refused under the restrict policy.
    #[error("Cannot delete {kind} {id}: {dependents} dependent record(s) remain")]
    HasDependents {
        kind: EntityKind,
        id: String,
        dependents: usize,
    },

    /// JSON (de)serialization of a snapshot failed.
    #[error("Snapshot serialization error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// A snapshot parsed but breaks an invariant.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Unsupported schema version {found} (supported {min}..={max})")]
    UnsupportedSchemaVersion { found: u64, min: u32, max: u32 },

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),
}

impl StoreError {
    pub(crate) fn not_found(kind: EntityKind, id: &impl Display) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
