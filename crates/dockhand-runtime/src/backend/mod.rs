//! Runtime client abstraction.
//!
//! Every call blocks on I/O against the runtime's control API and takes a
//! [`CancellationToken`] so a caller that gives up can abort the request.
//! No implementation retries; each failure is surfaced once.

pub mod docker;

use dockhand_common::error::Result;
use dockhand_common::types::{ContainerDetail, ContainerId, ContainerSummary, RunSpec, StatsSample};
use tokio_util::sync::CancellationToken;

/// Selects which containers a listing returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Include containers that are not running.
    pub include_stopped: bool,
    /// Only return the container with exactly this name.
    pub name: Option<String>,
}

impl ListFilter {
    /// Every container regardless of state.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            include_stopped: true,
            name: None,
        }
    }

    /// The container named `name`, in any state.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            include_stopped: true,
            name: Some(name.into()),
        }
    }

    /// Returns whether `summary` passes the name constraint.
    ///
    /// Runtime name filters are pattern matches, so backends apply this
    /// exact comparison on top of whatever the runtime returned.
    #[must_use]
    pub fn matches(&self, summary: &ContainerSummary) -> bool {
        self.name.as_deref().is_none_or(|name| summary.name == name)
    }
}

/// Blocking client for the container runtime's control API.
///
/// Implementors translate runtime responses into the workspace's view
/// types and classify failures into [`DockhandError`] variants:
/// unknown names become `NotFound`, duplicate names at create become
/// `NameConflict`, host port bind failures become `PortInUse`.
///
/// [`DockhandError`]: dockhand_common::error::DockhandError
pub trait RuntimeClient: Send + Sync {
    /// Lists containers matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be queried.
    fn list(&self, filter: &ListFilter, cancel: &CancellationToken) -> Result<Vec<ContainerSummary>>;

    /// Inspects a single container.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no container has this name.
    fn inspect(&self, name: &str, cancel: &CancellationToken) -> Result<ContainerDetail>;

    /// Creates a container and, when `spec.detach` is set, starts it.
    ///
    /// A container whose start fails is removed again before returning.
    ///
    /// # Errors
    ///
    /// Returns `NameConflict` if the name is taken, `PortInUse` if the
    /// host port cannot be bound, or `Runtime` for other failures.
    fn create(&self, spec: &RunSpec, cancel: &CancellationToken) -> Result<ContainerId>;

    /// Starts a stopped or created container.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no container has this name.
    fn start(&self, name: &str, cancel: &CancellationToken) -> Result<()>;

    /// Stops a running container.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no container has this name.
    fn stop(&self, name: &str, cancel: &CancellationToken) -> Result<()>;

    /// Removes a container, killing it first when `force` is set.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no container has this name.
    fn remove(&self, name: &str, force: bool, cancel: &CancellationToken) -> Result<()>;

    /// Returns the last `lines` lines of combined stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no container has this name.
    fn tail_logs(&self, name: &str, lines: usize, cancel: &CancellationToken) -> Result<String>;

    /// Takes one non-streaming stats snapshot.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no container has this name.
    fn sample_stats(&self, name: &str, cancel: &CancellationToken) -> Result<StatsSample>;
}
