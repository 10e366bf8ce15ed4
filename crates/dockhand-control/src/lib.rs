//! # dockhand-control
//!
//! The gate in front of every container operation.
//!
//! - [`access`]: authentication and role checks.
//! - [`audit`]: the append-only record of mutating actions.
//! - [`credentials`]: the user store that turns a login into an [`Actor`].
//! - [`orchestrator`]: composes the above with provisioning and the runtime.
//!
//! [`Actor`]: dockhand_common::types::Actor

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod access;
pub mod audit;
pub mod credentials;
pub mod orchestrator;
