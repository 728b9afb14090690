//! # parley-store
//!
//! In-memory state container for the Parley chat workspace.
//!
//! [`AppStore`] owns every entity map (users, projects, chats, messages,
//! models, quick prompts, settings and integrations) together with the
//! UI/session pointers, and exposes the typed actions that are the only
//! permitted way to mutate them. Nothing here touches disk or network:
//! [`Snapshot`] turns the whole state into versioned JSON, and the
//! [`migrations`] module upgrades older snapshot shapes on load.

pub mod catalog;
pub mod chats;
pub mod clock;
pub mod config;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod projects;
pub mod settings;
pub mod snapshot;
pub mod store;
pub mod users;
pub mod views;

mod error;

pub use config::{DeletePolicy, StoreConfig};
pub use error::{Result, StoreError};
pub use models::*;
pub use snapshot::{SessionState, Snapshot};
pub use store::{AppStore, SharedStore};
pub use views::{ChatWithDetails, LastMessage, ListFilter, ProjectSummary, ProjectWithDetails};

pub use parley_shared::types::*;

#[cfg(test)]
pub(crate) mod testing;
