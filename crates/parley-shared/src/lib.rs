//! # parley-shared
//!
//! Types shared by every Parley crate: per-entity identifiers, the closed
//! string enums that make up the wire contract, naming rules and constants.

pub mod constants;
pub mod error;
pub mod naming;
pub mod types;

pub use error::{ParseEnumError, ValidationError};
pub use types::*;
