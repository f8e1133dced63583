//! The concrete resources mounted by the server.
//!
//! Each submodule exposes a `spec` constructor returning the
//! [`ResourceSpec`](crate::resource::ResourceSpec) the factory needs.

pub mod calculations;
pub mod permissions;
pub mod roles;
pub mod users;
