//! Docker Engine backend.
//!
//! Talks to the engine through `bollard` and drives each request to
//! completion on a private I/O runtime, so callers see a plain blocking
//! API. Each call is raced against the caller's cancellation token and the
//! configured deadline; whichever fires first drops the in-flight request.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, StatsOptions, StopContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::models::{ContainerInspectResponse, HostConfig, MountPoint, PortBinding, PortMap};
use dockhand_common::config::DockhandConfig;
use dockhand_common::constants::SHORT_IMAGE_ID_LENGTH;
use dockhand_common::error::{DockhandError, Result};
use dockhand_common::types::{
    ContainerDetail, ContainerId, ContainerStatus, ContainerSummary, MountInfo, RunSpec,
    StatsSample,
};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use super::{ListFilter, RuntimeClient};

/// Runtime error fragments that mean the requested host port is taken.
///
/// The engine reports bind failures only as free text inside a generic
/// server error, so this list is matched after status-code classification.
const PORT_CONFLICT_PATTERNS: &[&str] = &["port is already allocated", "address already in use"];

/// [`RuntimeClient`] backed by a Docker-compatible engine.
///
/// Methods block the calling thread and must not be invoked from inside
/// an async task.
pub struct DockerBackend {
    docker: Docker,
    runtime: tokio::runtime::Runtime,
    timeout: Duration,
    stop_timeout_secs: i64,
}

impl DockerBackend {
    /// Connects to the engine named by `config.docker_host`, or to the
    /// local defaults (`DOCKER_HOST`, then the standard socket).
    ///
    /// # Errors
    ///
    /// Returns an error if the I/O runtime cannot be started or the
    /// endpoint is malformed.
    pub fn connect(config: &DockhandConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("dockhand-runtime-io")
            .enable_all()
            .build()
            .map_err(|e| DockhandError::Runtime {
                message: format!("cannot start I/O runtime: {e}"),
            })?;
        let docker = {
            let _guard = runtime.enter();
            connect_docker(config.docker_host.as_deref(), config.request_timeout_secs)?
        };
        tracing::info!(
            host = config.docker_host.as_deref().unwrap_or("local defaults"),
            "connected to container runtime"
        );
        Ok(Self {
            docker,
            runtime,
            timeout: Duration::from_secs(config.request_timeout_secs),
            stop_timeout_secs: config.stop_timeout_secs,
        })
    }

    /// Drives `fut` to completion unless `cancel` fires or the deadline
    /// passes first.
    fn call<T>(
        &self,
        operation: &'static str,
        target: &str,
        cancel: &CancellationToken,
        fut: impl Future<Output = std::result::Result<T, BollardError>>,
    ) -> Result<T> {
        tracing::debug!(operation, target, "runtime call");
        let timeout = self.timeout;
        let outcome = self.runtime.block_on(async {
            tokio::select! {
                () = cancel.cancelled() => None,
                res = tokio::time::timeout(timeout, fut) => Some(res),
            }
        });
        match outcome {
            None => Err(DockhandError::Cancelled { operation }),
            Some(Err(_)) => Err(DockhandError::Timeout {
                operation,
                seconds: timeout.as_secs(),
            }),
            Some(Ok(res)) => res.map_err(|e| classify(operation, target, e)),
        }
    }

    /// Resolves the display name of the image behind a container.
    fn image_display(
        &self,
        image_id: &str,
        reference: Option<&str>,
        cancel: &CancellationToken,
    ) -> String {
        if image_id.is_empty() {
            return reference.map(display_image).unwrap_or_default();
        }
        match self.call("inspect_image", image_id, cancel, self.docker.inspect_image(image_id)) {
            Ok(image) => image
                .repo_tags
                .and_then(|tags| tags.into_iter().next())
                .unwrap_or_else(|| short_image_id(image_id)),
            Err(e) => {
                tracing::debug!(image_id, error = %e, "image inspection failed");
                reference.map_or_else(|| short_image_id(image_id), display_image)
            }
        }
    }
}

impl RuntimeClient for DockerBackend {
    fn list(&self, filter: &ListFilter, cancel: &CancellationToken) -> Result<Vec<ContainerSummary>> {
        let mut filters = HashMap::new();
        if let Some(name) = &filter.name {
            let _ = filters.insert("name".to_string(), vec![anchored_name_pattern(name)]);
        }
        let options = ListContainersOptions::<String> {
            all: filter.include_stopped,
            filters,
            ..Default::default()
        };
        let containers = self.call(
            "list",
            filter.name.as_deref().unwrap_or("*"),
            cancel,
            self.docker.list_containers(Some(options)),
        )?;
        Ok(containers
            .into_iter()
            .map(summary_from_listing)
            .filter(|s| filter.matches(s))
            .collect())
    }

    fn inspect(&self, name: &str, cancel: &CancellationToken) -> Result<ContainerDetail> {
        let response = self.call(
            "inspect",
            name,
            cancel,
            self.docker
                .inspect_container(name, None::<InspectContainerOptions>),
        )?;
        let image_id = response.image.clone().unwrap_or_default();
        let reference = response.config.as_ref().and_then(|c| c.image.clone());
        let image = self.image_display(&image_id, reference.as_deref(), cancel);
        Ok(detail_from_inspection(response, image))
    }

    fn create(&self, spec: &RunSpec, cancel: &CancellationToken) -> Result<ContainerId> {
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };
        let created = self.call(
            "create",
            &spec.name,
            cancel,
            self.docker.create_container(Some(options), container_config(spec)),
        )?;
        for warning in &created.warnings {
            tracing::warn!(name = %spec.name, %warning, "runtime warning on create");
        }
        let id = ContainerId::new(created.id);
        tracing::debug!(id = %id.short(), name = %spec.name, image = %spec.image, "container created");

        if !spec.detach {
            return Ok(id);
        }

        if let Err(e) = self.start(&spec.name, cancel) {
            // Rollback must run even when the caller's token has fired.
            let rollback = CancellationToken::new();
            if let Err(cleanup) = self.remove(&spec.name, true, &rollback) {
                tracing::error!(name = %spec.name, error = %cleanup, "rollback of failed start did not complete");
            } else {
                tracing::info!(name = %spec.name, "removed container after failed start");
            }
            return Err(refine_port_conflict(e, spec.host_port));
        }
        Ok(id)
    }

    fn start(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        let docker = &self.docker;
        self.call("start", name, cancel, async move {
            match docker
                .start_container(name, None::<StartContainerOptions<String>>)
                .await
            {
                Err(BollardError::DockerResponseServerError {
                    status_code: 304, ..
                }) => Ok(()),
                other => other,
            }
        })?;
        tracing::debug!(name, "container started");
        Ok(())
    }

    fn stop(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        let docker = &self.docker;
        let options = StopContainerOptions {
            t: self.stop_timeout_secs,
        };
        self.call("stop", name, cancel, async move {
            match docker.stop_container(name, Some(options)).await {
                Err(BollardError::DockerResponseServerError {
                    status_code: 304, ..
                }) => Ok(()),
                other => other,
            }
        })?;
        tracing::debug!(name, "container stopped");
        Ok(())
    }

    fn remove(&self, name: &str, force: bool, cancel: &CancellationToken) -> Result<()> {
        let options = RemoveContainerOptions {
            force,
            ..Default::default()
        };
        self.call(
            "remove",
            name,
            cancel,
            self.docker.remove_container(name, Some(options)),
        )?;
        tracing::debug!(name, force, "container removed");
        Ok(())
    }

    fn tail_logs(&self, name: &str, lines: usize, cancel: &CancellationToken) -> Result<String> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: lines.to_string(),
            ..Default::default()
        };
        let mut stream = Box::pin(self.docker.logs(name, Some(options)));
        self.call("logs", name, cancel, async move {
            let mut text = String::new();
            while let Some(chunk) = stream.next().await {
                text.push_str(&String::from_utf8_lossy(&chunk?.into_bytes()));
            }
            Ok(text)
        })
    }

    fn sample_stats(&self, name: &str, cancel: &CancellationToken) -> Result<StatsSample> {
        // one_shot would leave the previous-sample counters empty.
        let options = StatsOptions {
            stream: false,
            one_shot: false,
        };
        let mut stream = Box::pin(self.docker.stats(name, Some(options)));
        let stats = self.call("stats", name, cancel, async move {
            stream.next().await.transpose()
        })?;
        let stats = stats.ok_or_else(|| DockhandError::Runtime {
            message: format!("runtime returned no stats sample for {name}"),
        })?;
        Ok(StatsSample {
            cpu_total: stats.cpu_stats.cpu_usage.total_usage,
            precpu_total: stats.precpu_stats.cpu_usage.total_usage,
            system_cpu: stats.cpu_stats.system_cpu_usage.unwrap_or_default(),
            presystem_cpu: stats.precpu_stats.system_cpu_usage.unwrap_or_default(),
            memory_usage: stats.memory_stats.usage.unwrap_or_default(),
            memory_limit: stats.memory_stats.limit.unwrap_or_default(),
        })
    }
}

fn connect_docker(host: Option<&str>, timeout_secs: u64) -> Result<Docker> {
    let connected = match host {
        None => Docker::connect_with_local_defaults(),
        Some(h) if h.starts_with("unix://") => {
            Docker::connect_with_unix(h, timeout_secs, bollard::API_DEFAULT_VERSION)
        }
        Some(h) if h.starts_with("tcp://") || h.starts_with("http://") => {
            Docker::connect_with_http(h, timeout_secs, bollard::API_DEFAULT_VERSION)
        }
        Some(h) => {
            return Err(DockhandError::Config {
                message: format!("unsupported docker_host '{h}' (expected unix://, tcp:// or http://)"),
            });
        }
    };
    connected.map_err(|e| DockhandError::Runtime {
        message: format!("cannot connect to container runtime: {e}"),
    })
}

/// Maps a transport or server error onto the workspace taxonomy.
///
/// Status codes take precedence; message text is only inspected later, by
/// [`refine_port_conflict`], for the one case the engine does not encode.
fn classify(operation: &'static str, target: &str, err: BollardError) -> DockhandError {
    match err {
        // A 404 on create names the image, not the container.
        BollardError::DockerResponseServerError {
            status_code: 404, ..
        } if operation != "create" => DockhandError::NotFound {
            kind: "container",
            id: target.to_string(),
        },
        BollardError::DockerResponseServerError {
            status_code: 409, ..
        } if operation == "create" => DockhandError::NameConflict {
            name: target.to_string(),
        },
        BollardError::DockerResponseServerError { message, .. } => {
            DockhandError::Runtime { message }
        }
        other => DockhandError::Runtime {
            message: other.to_string(),
        },
    }
}

/// Turns a generic runtime failure into `PortInUse` when its text reports a
/// host port bind conflict.
fn refine_port_conflict(err: DockhandError, host_port: u16) -> DockhandError {
    match err {
        DockhandError::Runtime { message } if is_port_conflict(&message) => {
            DockhandError::PortInUse { port: host_port }
        }
        other => other,
    }
}

fn is_port_conflict(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    PORT_CONFLICT_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Builds an anchored runtime name filter; runtime names carry a leading `/`.
fn anchored_name_pattern(name: &str) -> String {
    format!("^/{}$", name.replace('.', "\\."))
}

fn container_config(spec: &RunSpec) -> Config<String> {
    let port_key = spec.port_key();
    let exposed_ports = HashMap::from([(port_key.clone(), HashMap::new())]);
    let port_bindings: PortMap = HashMap::from([(
        port_key,
        Some(vec![PortBinding {
            host_ip: None,
            host_port: Some(spec.host_port.to_string()),
        }]),
    )]);
    let host_config = HostConfig {
        port_bindings: Some(port_bindings),
        binds: spec.volume.as_ref().map(|v| vec![v.to_bind_string()]),
        ..Default::default()
    };
    Config {
        image: Some(spec.image.clone()),
        exposed_ports: Some(exposed_ports),
        host_config: Some(host_config),
        ..Default::default()
    }
}

fn summary_from_listing(container: bollard::models::ContainerSummary) -> ContainerSummary {
    let id = ContainerId::new(container.id.unwrap_or_default());
    let name = container
        .names
        .as_deref()
        .and_then(<[String]>::first)
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_default();
    let port = container
        .ports
        .unwrap_or_default()
        .iter()
        .find_map(|p| p.public_port)
        .map(|p| p.to_string())
        .unwrap_or_default();
    let image = match (container.image.as_deref(), container.image_id.as_deref()) {
        (Some(reference), _) => display_image(reference),
        (None, Some(image_id)) => short_image_id(image_id),
        (None, None) => String::new(),
    };
    ContainerSummary {
        id: id.short().to_string(),
        name,
        status: container
            .state
            .as_deref()
            .map_or(ContainerStatus::Stopped, ContainerStatus::from_runtime_state),
        image,
        port,
    }
}

fn detail_from_inspection(response: ContainerInspectResponse, image: String) -> ContainerDetail {
    let id = ContainerId::new(response.id.unwrap_or_default());
    let ports = port_mappings(
        response
            .network_settings
            .and_then(|n| n.ports)
            .unwrap_or_default(),
    );
    let port = ports
        .iter()
        .find_map(|m| m.rsplit(" → ").next())
        .unwrap_or_default()
        .to_string();
    let status = response
        .state
        .and_then(|s| s.status)
        .map_or(ContainerStatus::Stopped, |s| {
            ContainerStatus::from_runtime_state(&s.to_string())
        });
    ContainerDetail {
        summary: ContainerSummary {
            id: id.short().to_string(),
            name: response
                .name
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_default(),
            status,
            image,
            port,
        },
        created: response.created.unwrap_or_default(),
        command: response.config.and_then(|c| c.cmd).unwrap_or_default(),
        ports,
        mounts: response
            .mounts
            .unwrap_or_default()
            .into_iter()
            .map(mount_info)
            .collect(),
    }
}

/// Renders bound ports as `containerPort/proto → hostPort`, ordered by
/// container port number, then protocol.
fn port_mappings(ports: PortMap) -> Vec<String> {
    let mut mappings: Vec<(String, String)> = ports
        .into_iter()
        .filter_map(|(key, bindings)| {
            let host_port = bindings?.into_iter().find_map(|b| b.host_port)?;
            Some((key, host_port))
        })
        .collect();
    mappings.sort_by(|(a, _), (b, _)| port_key(a).cmp(&port_key(b)));
    mappings
        .into_iter()
        .map(|(key, host)| format!("{key} → {host}"))
        .collect()
}

/// Splits `80/tcp` into `(80, "tcp")`. Unparseable keys sort last.
fn port_key(key: &str) -> (u16, &str, &str) {
    let (port, proto) = key.split_once('/').unwrap_or((key, ""));
    (port.parse().unwrap_or(u16::MAX), proto, key)
}

fn mount_info(mount: MountPoint) -> MountInfo {
    MountInfo {
        kind: mount.typ.map(|t| t.to_string()).unwrap_or_default(),
        source: mount.source.unwrap_or_default(),
        destination: mount.destination.unwrap_or_default(),
        read_only: !mount.rw.unwrap_or(true),
    }
}

/// Shows an image reference as given, or its short id when it is a digest.
fn display_image(reference: &str) -> String {
    if reference.starts_with("sha256:") {
        short_image_id(reference)
    } else {
        reference.to_string()
    }
}

/// `sha256:` plus the first hex characters of an image digest.
fn short_image_id(image_id: &str) -> String {
    let hex = image_id.strip_prefix("sha256:").unwrap_or(image_id);
    let short = hex.get(..SHORT_IMAGE_ID_LENGTH).unwrap_or(hex);
    format!("sha256:{short}")
}

#[cfg(test)]
mod tests {
    use bollard::models::{Port, PortTypeEnum};
    use dockhand_common::types::{Protocol, VolumeBinding};

    use super::*;

    fn server_error(status_code: u16, message: &str) -> BollardError {
        BollardError::DockerResponseServerError {
            status_code,
            message: message.into(),
        }
    }

    #[test]
    fn not_found_maps_to_container_not_found() {
        let err = classify("stop", "web1", server_error(404, "No such container: web1"));
        assert!(matches!(err, DockhandError::NotFound { id, .. } if id == "web1"));
    }

    #[test]
    fn not_found_on_create_is_a_runtime_error() {
        let err = classify("create", "web1", server_error(404, "No such image: foo:latest"));
        assert!(matches!(err, DockhandError::Runtime { message } if message.contains("No such image")));
    }

    #[test]
    fn conflict_on_create_is_a_name_conflict() {
        let err = classify("create", "web1", server_error(409, "name already in use"));
        assert!(matches!(err, DockhandError::NameConflict { name } if name == "web1"));
    }

    #[test]
    fn port_allocation_failure_is_refined() {
        let err = classify(
            "start",
            "web1",
            server_error(
                500,
                "driver failed programming external connectivity: Bind for 0.0.0.0:8080 failed: port is already allocated",
            ),
        );
        assert!(matches!(refine_port_conflict(err, 8080), DockhandError::PortInUse { port: 8080 }));
    }

    #[test]
    fn other_runtime_failures_are_not_refined() {
        let err = classify("start", "web1", server_error(500, "oci runtime error"));
        assert!(matches!(refine_port_conflict(err, 8080), DockhandError::Runtime { .. }));
    }

    #[test]
    fn name_pattern_is_anchored_and_escaped() {
        assert_eq!(anchored_name_pattern("web.v2"), "^/web\\.v2$");
    }

    #[test]
    fn config_binds_port_and_read_only_volume() {
        let spec = RunSpec {
            image: "nginx:alpine".into(),
            name: "web1".into(),
            container_port: 80,
            protocol: Protocol::Tcp,
            host_port: 8080,
            detach: true,
            volume: Some(VolumeBinding {
                host_path: "/data/sites/web1/index.html".into(),
                container_path: "/usr/share/nginx/html/index.html".into(),
                read_only: true,
            }),
        };
        let config = container_config(&spec);
        assert_eq!(config.image.as_deref(), Some("nginx:alpine"));
        assert!(config.exposed_ports.unwrap().contains_key("80/tcp"));
        let host = config.host_config.unwrap();
        let binding = &host.port_bindings.unwrap()["80/tcp"];
        assert_eq!(
            binding.as_ref().unwrap()[0].host_port.as_deref(),
            Some("8080")
        );
        assert_eq!(
            host.binds.unwrap(),
            vec!["/data/sites/web1/index.html:/usr/share/nginx/html/index.html:ro".to_string()]
        );
    }

    #[test]
    fn listing_row_uses_first_name_and_public_port() {
        let container = bollard::models::ContainerSummary {
            id: Some("4f66ad9a0b2e3c4d5e6f".into()),
            names: Some(vec!["/web1".into()]),
            image: Some("nginx:alpine".into()),
            state: Some("exited".into()),
            ports: Some(vec![Port {
                ip: Some("0.0.0.0".into()),
                private_port: 80,
                public_port: Some(8080),
                typ: Some(PortTypeEnum::TCP),
            }]),
            ..Default::default()
        };
        let row = summary_from_listing(container);
        assert_eq!(row.id, "4f66ad9a0b2e");
        assert_eq!(row.name, "web1");
        assert_eq!(row.status, ContainerStatus::Stopped);
        assert_eq!(row.image, "nginx:alpine");
        assert_eq!(row.port, "8080");
    }

    #[test]
    fn untagged_image_falls_back_to_short_id() {
        assert_eq!(
            display_image("sha256:0123456789abcdef0123"),
            "sha256:0123456789"
        );
        assert_eq!(short_image_id("abc"), "sha256:abc");
    }

    #[test]
    fn port_mappings_are_sorted_and_skip_unbound() {
        let ports: PortMap = HashMap::from([
            (
                "8000/tcp".to_string(),
                Some(vec![PortBinding {
                    host_ip: Some("0.0.0.0".into()),
                    host_port: Some("9000".into()),
                }]),
            ),
            ("443/tcp".to_string(), None),
            (
                "80/tcp".to_string(),
                Some(vec![PortBinding {
                    host_ip: None,
                    host_port: Some("8080".into()),
                }]),
            ),
        ]);
        assert_eq!(
            port_mappings(ports),
            vec!["80/tcp → 8080".to_string(), "8000/tcp → 9000".to_string()]
        );
    }

    #[test]
    fn port_mappings_order_protocols_within_a_port() {
        let bound = |host: &str| {
            Some(vec![PortBinding {
                host_ip: None,
                host_port: Some(host.into()),
            }])
        };
        let ports: PortMap = HashMap::from([
            ("53/udp".to_string(), bound("5353")),
            ("9/tcp".to_string(), bound("9009")),
            ("53/tcp".to_string(), bound("5300")),
        ]);
        assert_eq!(
            port_mappings(ports),
            vec![
                "9/tcp → 9009".to_string(),
                "53/tcp → 5300".to_string(),
                "53/udp → 5353".to_string(),
            ]
        );
    }
}
