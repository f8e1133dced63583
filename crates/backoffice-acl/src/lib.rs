//! # backoffice-acl
//!
//! Access control for the backoffice.
//!
//! This crate implements the authorization model:
//! - [`catalog`]: the fixed `(resource, action, scope)` vocabulary and its
//!   `"<resource>:<action>:<scope>"` keys, plus idempotent seeding
//! - [`model`]: the `User` and `Role` records that carry role assignments
//! - [`identity`]: principal lookup and effective permission sets, with a
//!   short-lived per-principal cache
//! - [`scope`]: the any-over-own resolver that turns a base permission and a
//!   permission set into an effective [`Scope`]
//! - [`seed`]: default roles

#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod identity;
pub mod model;
pub mod scope;
pub mod seed;

pub use catalog::{Action, BasePermission, Permission, PermissionKey, Scope};
pub use error::{Error, Result};
pub use identity::{IdentityResolver, PermissionCache, Principal};
pub use model::{Role, User};
pub use scope::{PermissionSet, resolve_scope};
