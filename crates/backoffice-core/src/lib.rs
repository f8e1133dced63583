//! Backoffice Core — identifiers and errors shared by every backoffice crate.
//!
//! This crate has no internal backoffice dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`ids`]: Principal and record identifiers

pub mod error;
pub mod ids;

pub use error::{Error, Result};
pub use ids::{PrincipalId, RecordId};
