//! # dockhand-provision
//!
//! Decides what may be created and prepares it:
//! - **Policy**: the closed image allowlist, name and port validation, and
//!   the name availability pre-check.
//! - **Site**: static HTML assets bind-mounted into static-site containers.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod policy;
pub mod site;
