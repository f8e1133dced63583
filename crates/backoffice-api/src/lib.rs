//! # backoffice-api
//!
//! HTTP API for the backoffice.
//!
//! This crate wires the access layer to axum:
//! - [`resource`] and [`factory`]: declarative resource descriptions and the
//!   generic handler factory that enforces `any`/`own` scope on every
//!   list/create/get/update/delete
//! - [`hooks`] and [`audit`]: post-commit mutation hooks, including the audit
//!   recorder and permission-cache invalidation
//! - [`resources`]: users, roles, permissions and calculations
//! - [`routes`]: registration, login, `/me` and the dashboard summary
//! - [`context`], [`config`], [`server`]: application state, settings and
//!   the HTTP server

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod audit;
pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod factory;
pub mod hooks;
pub mod resource;
pub mod resources;
pub mod routes;
pub mod seed;
pub mod server;

pub use config::{Config, ConfigError};
pub use context::{AppContext, Repositories};
pub use error::{ApiError, Result};
pub use factory::{Grant, ResourceHandlers};
pub use resource::{Operation, Ownership, ResourceSpec, SaveStep};
pub use server::{Server, router};
