//! # backoffice-storage
//!
//! Repository abstraction for backoffice entities.
//!
//! The relational store is an external collaborator; this crate describes the
//! narrow surface the access layer needs from it:
//! - [`Entity`]: what a storable record must expose (kind name, id, creation time)
//! - [`Predicate`] / [`Order`]: filter and ordering expressions
//! - [`Repository`]: find / find-one / create / merge / save / delete
//! - [`MemoryRepository`]: a process-local store, used by the server and tests
//! - [`spy::SpyRepository`]: a call-recording wrapper for tests

#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod entity;
pub mod error;
pub mod memory;
pub mod predicate;
pub mod spy;
pub mod traits;

pub use entity::{Entity, Patch, PROTECTED_FIELDS};
pub use error::{Error, Result};
pub use memory::MemoryRepository;
pub use predicate::{Order, Predicate};
pub use traits::{DeleteResult, Repository};
