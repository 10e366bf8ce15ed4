//! Container runtime access for the dockhand control plane.
//!
//! [`backend::RuntimeClient`] is the seam between the orchestrator and the
//! container engine; [`backend::docker::DockerBackend`] implements it over
//! the Docker Engine API. [`metrics`] turns raw stats counters into the
//! percentages and megabytes shown to operators.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod backend;
pub mod metrics;
