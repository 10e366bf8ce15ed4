//! Domain primitive types used across the dockhand workspace.
//!
//! Container records here are live views derived from the runtime on every
//! request. Nothing in this module is cached or owned by the control plane.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::SHORT_ID_LENGTH;
use crate::error::DockhandError;

/// Runtime-assigned identifier of a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a new container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the stable short prefix shown to operators.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..SHORT_ID_LENGTH).unwrap_or(&self.0)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a container as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerStatus {
    /// Container has been created but not yet started.
    Created,
    /// Container is actively running.
    Running,
    /// Container processes are frozen.
    Paused,
    /// Container has exited or been stopped.
    Stopped,
    /// The runtime is tearing the container down.
    RemovedPending,
}

impl ContainerStatus {
    /// Maps a runtime state string (`created`, `running`, `exited`, ...)
    /// onto the control plane's status set.
    #[must_use]
    pub fn from_runtime_state(state: &str) -> Self {
        match state.to_ascii_lowercase().as_str() {
            "created" => Self::Created,
            "running" | "restarting" => Self::Running,
            "paused" => Self::Paused,
            "removing" => Self::RemovedPending,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Stopped => write!(f, "stopped"),
            Self::RemovedPending => write!(f, "removed-pending"),
        }
    }
}

/// One catalog row describing a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    /// Short prefix of the runtime-assigned id.
    pub id: String,
    /// Container name, unique among known containers.
    pub name: String,
    /// Current lifecycle status.
    pub status: ContainerStatus,
    /// Image tag, or the short image id when untagged.
    pub image: String,
    /// First published host port, empty when nothing is bound.
    pub port: String,
}

/// Mount attached to a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountInfo {
    /// Mount type (`bind`, `volume`, `tmpfs`).
    pub kind: String,
    /// Host-side source path or volume name.
    pub source: String,
    /// Path inside the container.
    pub destination: String,
    /// Whether the mount is read-only.
    pub read_only: bool,
}

/// Full inspection record of a single container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDetail {
    /// Catalog fields shared with [`ContainerSummary`].
    #[serde(flatten)]
    pub summary: ContainerSummary,
    /// Creation timestamp as reported by the runtime.
    pub created: String,
    /// Entrypoint command.
    pub command: Vec<String>,
    /// Port mappings rendered as `containerPort/proto → hostPort`.
    pub ports: Vec<String>,
    /// Mounts attached to the container.
    pub mounts: Vec<MountInfo>,
}

/// Raw counters from one runtime stats snapshot.
///
/// `precpu_*` values are the runtime's own previous sample, so a single
/// snapshot is enough to derive a usage rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSample {
    /// Current cumulative CPU time of the container.
    pub cpu_total: u64,
    /// Previous cumulative CPU time of the container.
    pub precpu_total: u64,
    /// Current cumulative host CPU time.
    pub system_cpu: u64,
    /// Previous cumulative host CPU time.
    pub presystem_cpu: u64,
    /// Memory in use, in bytes.
    pub memory_usage: u64,
    /// Memory limit, in bytes.
    pub memory_limit: u64,
}

/// Transport protocol of a container port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP.
    Tcp,
    /// UDP.
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

/// Read-only file or directory bind-mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeBinding {
    /// Absolute host path.
    pub host_path: PathBuf,
    /// Absolute path inside the container.
    pub container_path: String,
    /// Whether the binding is read-only.
    pub read_only: bool,
}

impl VolumeBinding {
    /// Renders the binding in the runtime's `host:container[:ro]` syntax.
    #[must_use]
    pub fn to_bind_string(&self) -> String {
        let mode = if self.read_only { ":ro" } else { "" };
        format!(
            "{}:{}{mode}",
            self.host_path.display(),
            self.container_path
        )
    }
}

/// Validated instructions for creating one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSpec {
    /// Image reference from the allowlist.
    pub image: String,
    /// Container name.
    pub name: String,
    /// Port the application listens on inside the container.
    pub container_port: u16,
    /// Protocol of `container_port`.
    pub protocol: Protocol,
    /// Host port published for `container_port`.
    pub host_port: u16,
    /// Whether the container is started in the background after creation.
    pub detach: bool,
    /// Optional static-content binding.
    pub volume: Option<VolumeBinding>,
}

impl RunSpec {
    /// Returns the runtime port key, e.g. `80/tcp`.
    #[must_use]
    pub fn port_key(&self) -> String {
        format!("{}/{}", self.container_port, self.protocol)
    }
}

/// Role of an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May read and mutate containers.
    Admin,
    /// May only read.
    Viewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl FromStr for Role {
    type Err = DockhandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            other => Err(DockhandError::InvalidInput {
                message: format!("unknown role '{other}' (expected admin or viewer)"),
            }),
        }
    }
}

/// Authenticated identity supplied by the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Login name.
    pub username: String,
    /// Granted role.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// One line of the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Local time the action was recorded.
    pub timestamp: String,
    /// Username of the acting identity.
    pub username: String,
    /// Free-text action description.
    pub action: String,
}
