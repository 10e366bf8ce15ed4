//! Shared fakes for orchestrator tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, missing_docs)]

use std::sync::{Arc, Mutex};

use dockhand_common::error::{DockhandError, Result};
use dockhand_common::types::{
    Actor, AuditEntry, ContainerDetail, ContainerId, ContainerStatus, ContainerSummary, Role,
    RunSpec, StatsSample,
};
use dockhand_control::audit::AuditLog;
use dockhand_control::orchestrator::Orchestrator;
use dockhand_provision::site::SiteAssetWriter;
use dockhand_runtime::backend::{ListFilter, RuntimeClient};
use tokio_util::sync::CancellationToken;

/// Runtime calls observed by [`FakeRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Inspect(String),
    Create(RunSpec),
    Start(String),
    Stop(String),
    Remove(String),
    Logs(String, usize),
    Stats(String),
}

/// In-memory runtime holding a container table.
#[derive(Default)]
pub struct FakeRuntime {
    containers: Mutex<Vec<ContainerSummary>>,
    calls: Mutex<Vec<Call>>,
    busy_ports: Mutex<Vec<u16>>,
    unlisted: Mutex<Vec<String>>,
    stats: Mutex<StatsSample>,
}

impl FakeRuntime {
    pub fn with(containers: &[(&str, ContainerStatus)]) -> Self {
        let runtime = Self::default();
        for (name, status) in containers {
            runtime.insert(name, *status);
        }
        runtime
    }

    pub fn insert(&self, name: &str, status: ContainerStatus) {
        self.containers.lock().unwrap().push(ContainerSummary {
            id: format!("{name}-id"),
            name: (*name).to_string(),
            status,
            image: "nginx:alpine".into(),
            port: String::new(),
        });
    }

    pub fn occupy_port(&self, port: u16) {
        self.busy_ports.lock().unwrap().push(port);
    }

    /// Keeps `name` out of listings while `create` still sees it, as when
    /// another create wins the name between the check and the create.
    pub fn hide_from_listing(&self, name: &str) {
        self.unlisted.lock().unwrap().push(name.to_string());
    }

    pub fn set_stats(&self, sample: StatsSample) {
        *self.stats.lock().unwrap() = sample;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Create(_)))
            .count()
    }

    pub fn status_of(&self, name: &str) -> Option<ContainerStatus> {
        self.containers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.status)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn set_status(&self, name: &str, status: ContainerStatus) -> Result<()> {
        let mut containers = self.containers.lock().unwrap();
        let container = containers
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| not_found(name))?;
        container.status = status;
        Ok(())
    }

    fn require(&self, name: &str) -> Result<ContainerSummary> {
        self.containers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }
}

fn not_found(name: &str) -> DockhandError {
    DockhandError::NotFound {
        kind: "container",
        id: name.to_string(),
    }
}

impl RuntimeClient for FakeRuntime {
    fn list(&self, filter: &ListFilter, _cancel: &CancellationToken) -> Result<Vec<ContainerSummary>> {
        self.record(Call::List);
        let unlisted = self.unlisted.lock().unwrap();
        Ok(self
            .containers
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !unlisted.contains(&c.name) && filter.matches(c))
            .cloned()
            .collect())
    }

    fn inspect(&self, name: &str, _cancel: &CancellationToken) -> Result<ContainerDetail> {
        self.record(Call::Inspect(name.to_string()));
        let summary = self.require(name)?;
        Ok(ContainerDetail {
            summary,
            created: "2024-01-01T00:00:00Z".into(),
            command: vec!["nginx".into()],
            ports: vec!["80/tcp → 8080".into()],
            mounts: Vec::new(),
        })
    }

    fn create(&self, spec: &RunSpec, cancel: &CancellationToken) -> Result<ContainerId> {
        self.record(Call::Create(spec.clone()));
        if cancel.is_cancelled() {
            return Err(DockhandError::Cancelled { operation: "create" });
        }
        if self.require(&spec.name).is_ok() {
            return Err(DockhandError::NameConflict {
                name: spec.name.clone(),
            });
        }
        if self.busy_ports.lock().unwrap().contains(&spec.host_port) {
            return Err(DockhandError::PortInUse {
                port: spec.host_port,
            });
        }
        self.insert(&spec.name, ContainerStatus::Running);
        Ok(ContainerId::new(format!("{}-id", spec.name)))
    }

    fn start(&self, name: &str, _cancel: &CancellationToken) -> Result<()> {
        self.record(Call::Start(name.to_string()));
        self.set_status(name, ContainerStatus::Running)
    }

    fn stop(&self, name: &str, _cancel: &CancellationToken) -> Result<()> {
        self.record(Call::Stop(name.to_string()));
        self.set_status(name, ContainerStatus::Stopped)
    }

    fn remove(&self, name: &str, _force: bool, _cancel: &CancellationToken) -> Result<()> {
        self.record(Call::Remove(name.to_string()));
        let mut containers = self.containers.lock().unwrap();
        let before = containers.len();
        containers.retain(|c| c.name != name);
        if containers.len() == before {
            return Err(not_found(name));
        }
        Ok(())
    }

    fn tail_logs(&self, name: &str, lines: usize, _cancel: &CancellationToken) -> Result<String> {
        self.record(Call::Logs(name.to_string(), lines));
        let _ = self.require(name)?;
        Ok(format!("{name} log line\n"))
    }

    fn sample_stats(&self, name: &str, _cancel: &CancellationToken) -> Result<StatsSample> {
        self.record(Call::Stats(name.to_string()));
        let _ = self.require(name)?;
        Ok(*self.stats.lock().unwrap())
    }
}

/// Audit trail kept in memory; can be switched to fail every append.
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
    failing: Mutex<bool>,
}

impl MemoryAuditLog {
    pub fn fail_appends(&self) {
        *self.failing.lock().unwrap() = true;
    }

    pub fn snapshot(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl AuditLog for MemoryAuditLog {
    fn record(&self, actor: &Actor, action: &str) -> Result<AuditEntry> {
        if *self.failing.lock().unwrap() {
            return Err(DockhandError::Io {
                path: "actions.log".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        let entry = AuditEntry {
            timestamp: "2024-01-01 00:00:00.000000".into(),
            username: actor.username.clone(),
            action: action.to_string(),
        };
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    fn entries(&self) -> Result<Vec<AuditEntry>> {
        Ok(self.snapshot())
    }
}

/// Orchestrator wired to fakes plus a temporary sites root.
pub struct Harness {
    pub runtime: Arc<FakeRuntime>,
    pub audit: Arc<MemoryAuditLog>,
    pub orchestrator: Orchestrator,
    pub sites: SiteAssetWriter,
    pub cancel: CancellationToken,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(runtime: FakeRuntime) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let runtime = Arc::new(runtime);
        let audit = Arc::new(MemoryAuditLog::default());
        let sites = SiteAssetWriter::new(dir.path().join("sites"));
        let orchestrator = Orchestrator::new(
            Arc::clone(&runtime) as Arc<dyn RuntimeClient>,
            Arc::clone(&audit) as Arc<dyn AuditLog>,
            sites.clone(),
        );
        Self {
            runtime,
            audit,
            orchestrator,
            sites,
            cancel: CancellationToken::new(),
            _dir: dir,
        }
    }
}

pub fn admin() -> Actor {
    Actor::new("ada", Role::Admin)
}

pub fn viewer() -> Actor {
    Actor::new("val", Role::Viewer)
}
