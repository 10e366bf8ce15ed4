//! Container operations behind the access gate.
//!
//! Every operation authorizes first. Mutating operations then run the
//! provisioning policy, call the runtime, and record exactly one audit
//! entry on success. Rejections leave no audit entry and no container.

use std::sync::Arc;

use dockhand_common::constants::{DEFAULT_LOG_TAIL, LOGS_NOT_FOUND_PLACEHOLDER};
use dockhand_common::error::{DockhandError, Result};
use dockhand_common::types::{Actor, AuditEntry, ContainerDetail, ContainerId, ContainerSummary};
use dockhand_provision::policy;
use dockhand_provision::site::SiteAssetWriter;
use dockhand_runtime::backend::{ListFilter, RuntimeClient};
use dockhand_runtime::metrics::{self, StatsSnapshot};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::access::{Access, authorize};
use crate::audit::AuditLog;

/// Parameters of a create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    /// Name of the new container.
    pub name: String,
    /// Host port to publish the application on.
    pub host_port: u16,
    /// Allowlisted image reference.
    pub image: String,
    /// Page title for static sites.
    pub title: String,
    /// Page body for static sites.
    pub body: String,
}

/// Log tail as shown to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogsView {
    /// Log text, or a placeholder when the container is unknown.
    pub logs: String,
    /// Whether the container existed.
    #[serde(skip)]
    pub found: bool,
}

/// Composes access control, provisioning, the runtime, and the audit trail.
pub struct Orchestrator {
    runtime: Arc<dyn RuntimeClient>,
    audit: Arc<dyn AuditLog>,
    sites: SiteAssetWriter,
    log_tail_lines: usize,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("sites", &self.sites)
            .field("log_tail_lines", &self.log_tail_lines)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Wires the orchestrator to its collaborators.
    #[must_use]
    pub fn new(
        runtime: Arc<dyn RuntimeClient>,
        audit: Arc<dyn AuditLog>,
        sites: SiteAssetWriter,
    ) -> Self {
        Self {
            runtime,
            audit,
            sites,
            log_tail_lines: DEFAULT_LOG_TAIL,
        }
    }

    /// Sets the default number of log lines returned by [`Self::logs`].
    #[must_use]
    pub const fn with_log_tail(mut self, lines: usize) -> Self {
        self.log_tail_lines = lines;
        self
    }

    /// Lists every container, stopped ones included, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an authorization or runtime error.
    pub fn list(
        &self,
        actor: Option<&Actor>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ContainerSummary>> {
        let _ = authorize(actor, Access::Read)?;
        let mut containers = self.runtime.list(&ListFilter::all(), cancel)?;
        containers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(containers)
    }

    /// Returns the inspection record of `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown names, or an authorization or
    /// runtime error.
    pub fn detail(
        &self,
        actor: Option<&Actor>,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<ContainerDetail> {
        let _ = authorize(actor, Access::Read)?;
        self.runtime.inspect(name, cancel)
    }

    /// Returns the last `tail` log lines of `name` (the configured default
    /// when `None`). An unknown container yields a placeholder, not an error.
    ///
    /// # Errors
    ///
    /// Returns an authorization or runtime error.
    pub fn logs(
        &self,
        actor: Option<&Actor>,
        name: &str,
        tail: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<LogsView> {
        let _ = authorize(actor, Access::Read)?;
        let lines = tail.unwrap_or(self.log_tail_lines);
        match self.runtime.tail_logs(name, lines, cancel) {
            Ok(logs) => Ok(LogsView { logs, found: true }),
            Err(DockhandError::NotFound { .. }) => Ok(LogsView {
                logs: LOGS_NOT_FOUND_PLACEHOLDER.to_string(),
                found: false,
            }),
            Err(e) => Err(e),
        }
    }

    /// Returns current usage of `name`, or `None` if it is unknown.
    ///
    /// # Errors
    ///
    /// Returns an authorization or runtime error.
    pub fn stats(
        &self,
        actor: Option<&Actor>,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<StatsSnapshot>> {
        let _ = authorize(actor, Access::Read)?;
        match self.runtime.sample_stats(name, cancel) {
            Ok(sample) => Ok(Some(metrics::compute(&sample))),
            Err(DockhandError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Provisions and starts a new container.
    ///
    /// Image, name, and port are validated and the name is checked against
    /// the live listing before anything is written or created. Site assets
    /// are discarded only when the runtime refused without leaving a
    /// container behind. A runtime `NameConflict`, cancellation, or timeout
    /// keeps them, since another container may already mount them.
    ///
    /// # Errors
    ///
    /// Returns `UnknownImageType`, `InvalidInput`, `NameConflict`,
    /// `PortInUse`, a runtime error, or `AuditFailed` if the container was
    /// created but the audit entry could not be written.
    pub fn create(
        &self,
        actor: Option<&Actor>,
        request: &CreateRequest,
        cancel: &CancellationToken,
    ) -> Result<ContainerId> {
        let actor = authorize(actor, Access::Mutate)?;
        let profile = policy::validate_image(&request.image)?;
        policy::validate_name(&request.name)?;
        if request.host_port == 0 {
            return Err(DockhandError::InvalidInput {
                message: "host port must be between 1 and 65535".into(),
            });
        }
        policy::check_name_available(self.runtime.as_ref(), &request.name, cancel)?;

        let site_asset = if profile.uses_volume() {
            Some(
                self.sites
                    .write(&request.name, &request.title, &request.body)?,
            )
        } else {
            None
        };
        let spec = policy::build_run_spec(profile, &request.name, request.host_port, site_asset)?;

        let id = match self.runtime.create(&spec, cancel) {
            Ok(id) => id,
            Err(e) => {
                if profile.uses_volume() && leaves_no_container(&e) {
                    if let Err(cleanup) = self.sites.discard(&request.name) {
                        tracing::warn!(name = %request.name, error = %cleanup, "failed to discard site assets");
                    }
                }
                tracing::warn!(name = %request.name, image = %request.image, error = %e, "create rejected");
                return Err(e);
            }
        };
        tracing::info!(name = %request.name, id = id.short(), image = %request.image, "container created");
        self.audited(
            actor,
            format!("Created container {} ({})", request.name, request.image),
        )?;
        Ok(id)
    }

    /// Starts `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown names, an authorization or runtime
    /// error, or `AuditFailed`.
    pub fn start(&self, actor: Option<&Actor>, name: &str, cancel: &CancellationToken) -> Result<()> {
        let actor = authorize(actor, Access::Mutate)?;
        self.runtime.start(name, cancel)?;
        tracing::info!(name, "container started");
        self.audited(actor, format!("Started {name}"))
    }

    /// Stops `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown names, an authorization or runtime
    /// error, or `AuditFailed`.
    pub fn stop(&self, actor: Option<&Actor>, name: &str, cancel: &CancellationToken) -> Result<()> {
        let actor = authorize(actor, Access::Mutate)?;
        self.runtime.stop(name, cancel)?;
        tracing::info!(name, "container stopped");
        self.audited(actor, format!("Stopped {name}"))
    }

    /// Force-removes `name` whatever its state. Site assets are kept.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown names, an authorization or runtime
    /// error, or `AuditFailed`.
    pub fn delete(&self, actor: Option<&Actor>, name: &str, cancel: &CancellationToken) -> Result<()> {
        let actor = authorize(actor, Access::Mutate)?;
        self.runtime.remove(name, true, cancel)?;
        tracing::info!(name, "container removed");
        self.audited(actor, format!("Deleted {name}"))
    }

    /// Reads back the audit trail.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or the trail's read error.
    pub fn audit_entries(&self, actor: Option<&Actor>) -> Result<Vec<AuditEntry>> {
        let _ = authorize(actor, Access::Read)?;
        self.audit.entries()
    }

    fn audited(&self, actor: &Actor, action: String) -> Result<()> {
        match self.audit.record(actor, &action) {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::error!(user = %actor.username, %action, error = %e, "audit entry lost");
                Err(DockhandError::AuditFailed {
                    action,
                    source: Box::new(e),
                })
            }
        }
    }
}

/// Whether a create error proves no container was made. The backend rolls
/// back a container whose start failed before reporting `Runtime`.
const fn leaves_no_container(err: &DockhandError) -> bool {
    matches!(
        err,
        DockhandError::PortInUse { .. } | DockhandError::Runtime { .. }
    )
}
