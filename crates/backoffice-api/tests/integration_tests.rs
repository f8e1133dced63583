//! Integration test suite for backoffice-api.
//!
//! Exercises the handler factory against real and spying repositories, and
//! the assembled router end to end through `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;
mod integration;
