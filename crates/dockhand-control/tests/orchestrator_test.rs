//! Orchestrator behavior against an in-memory runtime.
//!
//! The runtime and audit trail are fakes injected through the constructor:
//! 1. Reads (listing order, placeholders, authentication)
//! 2. Create (policy ordering, assets, rollback-free rejections)
//! 3. Authorization (viewers and anonymous callers change nothing)
//! 4. Lifecycle transitions and their audit entries

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

mod common;

use common::{Call, FakeRuntime, Harness, admin, viewer};
use dockhand_common::error::DockhandError;
use dockhand_common::types::{ContainerStatus, Role, StatsSample};
use dockhand_control::orchestrator::CreateRequest;

fn request(name: &str, image: &str, port: u16) -> CreateRequest {
    CreateRequest {
        name: name.into(),
        host_port: port,
        image: image.into(),
        title: "Hello".into(),
        body: "Welcome".into(),
    }
}

// ── Reads ──────────────────────────────────────────────────────────

#[test]
fn listing_is_sorted_by_name() {
    let h = Harness::new(FakeRuntime::with(&[
        ("zeta", ContainerStatus::Running),
        ("alpha", ContainerStatus::Stopped),
        ("mid", ContainerStatus::Created),
    ]));
    let names: Vec<_> = h
        .orchestrator
        .list(Some(&viewer()), &h.cancel)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["alpha", "mid", "zeta"]);
}

#[test]
fn reads_require_authentication() {
    let h = Harness::new(FakeRuntime::with(&[("web1", ContainerStatus::Running)]));
    assert!(matches!(
        h.orchestrator.list(None, &h.cancel),
        Err(DockhandError::Unauthenticated)
    ));
    assert!(matches!(
        h.orchestrator.detail(None, "web1", &h.cancel),
        Err(DockhandError::Unauthenticated)
    ));
    assert!(h.runtime.calls().is_empty());
}

#[test]
fn detail_of_unknown_container_is_not_found() {
    let h = Harness::new(FakeRuntime::default());
    assert!(matches!(
        h.orchestrator.detail(Some(&viewer()), "ghost", &h.cancel),
        Err(DockhandError::NotFound { .. })
    ));
}

#[test]
fn logs_use_default_tail_and_placeholder_when_missing() {
    let h = Harness::new(FakeRuntime::with(&[("web1", ContainerStatus::Running)]));
    let view = h
        .orchestrator
        .logs(Some(&viewer()), "web1", None, &h.cancel)
        .unwrap();
    assert!(view.found);
    assert_eq!(view.logs, "web1 log line\n");
    assert!(h.runtime.calls().contains(&Call::Logs("web1".into(), 100)));

    let missing = h
        .orchestrator
        .logs(Some(&viewer()), "ghost", Some(5), &h.cancel)
        .unwrap();
    assert!(!missing.found);
    assert_eq!(missing.logs, "Container not found");
    assert_eq!(
        serde_json::to_value(&missing).unwrap(),
        serde_json::json!({"logs": "Container not found"})
    );
}

#[test]
fn stats_are_computed_and_empty_when_missing() {
    let h = Harness::new(FakeRuntime::with(&[("web1", ContainerStatus::Running)]));
    h.runtime.set_stats(StatsSample {
        cpu_total: 200,
        precpu_total: 100,
        system_cpu: 2000,
        presystem_cpu: 1000,
        memory_usage: 104_857_600,
        memory_limit: 209_715_200,
    });
    let snapshot = h
        .orchestrator
        .stats(Some(&viewer()), "web1", &h.cancel)
        .unwrap()
        .expect("snapshot");
    assert!((snapshot.cpu_percent - 10.0).abs() < f64::EPSILON);
    assert!((snapshot.mem_usage_mb - 100.0).abs() < f64::EPSILON);
    assert!((snapshot.mem_limit_mb - 200.0).abs() < f64::EPSILON);

    assert!(h
        .orchestrator
        .stats(Some(&viewer()), "ghost", &h.cancel)
        .unwrap()
        .is_none());
}

// ── Create ─────────────────────────────────────────────────────────

#[test]
fn create_static_site_writes_assets_mounts_them_and_audits() {
    let h = Harness::new(FakeRuntime::default());
    let id = h
        .orchestrator
        .create(Some(&admin()), &request("web1", "nginx:alpine", 8080), &h.cancel)
        .unwrap();
    assert_eq!(id.as_str(), "web1-id");
    assert_eq!(h.runtime.status_of("web1"), Some(ContainerStatus::Running));

    let index = h.sites.site_dir("web1").join("index.html");
    let page = std::fs::read_to_string(&index).unwrap();
    assert!(page.contains("<h1>Hello</h1>"));

    let spec = h
        .runtime
        .calls()
        .into_iter()
        .find_map(|c| match c {
            Call::Create(spec) => Some(spec),
            _ => None,
        })
        .expect("create call");
    assert_eq!(spec.port_key(), "80/tcp");
    assert_eq!(spec.host_port, 8080);
    let volume = spec.volume.expect("volume");
    assert!(volume.read_only);
    assert!(volume.host_path.is_absolute());
    assert_eq!(volume.container_path, "/usr/share/nginx/html/index.html");

    let entries = h.audit.snapshot();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].username, "ada");
    assert_eq!(entries[0].action, "Created container web1 (nginx:alpine)");
}

#[test]
fn create_application_image_has_no_volume() {
    let h = Harness::new(FakeRuntime::default());
    let _ = h
        .orchestrator
        .create(Some(&admin()), &request("api", "data-web:latest", 9000), &h.cancel)
        .unwrap();
    let spec = h
        .runtime
        .calls()
        .into_iter()
        .find_map(|c| match c {
            Call::Create(spec) => Some(spec),
            _ => None,
        })
        .expect("create call");
    assert_eq!(spec.port_key(), "8000/tcp");
    assert!(spec.volume.is_none());
    assert!(!h.sites.site_dir("api").exists());
}

#[test]
fn duplicate_name_is_rejected_without_create_call() {
    for status in [
        ContainerStatus::Running,
        ContainerStatus::Stopped,
        ContainerStatus::Created,
    ] {
        let h = Harness::new(FakeRuntime::with(&[("web1", status)]));
        let err = h
            .orchestrator
            .create(Some(&admin()), &request("web1", "nginx:alpine", 8080), &h.cancel)
            .unwrap_err();
        assert!(matches!(err, DockhandError::NameConflict { ref name } if name == "web1"));
        assert_eq!(h.runtime.create_calls(), 0);
        assert!(!h.sites.site_dir("web1").exists());
        assert!(h.audit.snapshot().is_empty());
    }
}

#[test]
fn unknown_image_is_rejected_before_any_side_effect() {
    let h = Harness::new(FakeRuntime::default());
    let err = h
        .orchestrator
        .create(Some(&admin()), &request("web1", "unknown:latest", 8080), &h.cancel)
        .unwrap_err();
    assert!(matches!(err, DockhandError::UnknownImageType { .. }));
    assert_eq!(err.user_message(), "Unknown application type");
    assert!(h.runtime.calls().is_empty());
    assert!(!h.sites.root().exists());
    assert!(h.audit.snapshot().is_empty());
}

#[test]
fn invalid_name_and_port_are_rejected_before_runtime() {
    let h = Harness::new(FakeRuntime::default());
    for req in [
        request("../etc", "nginx:alpine", 8080),
        request("web1", "nginx:alpine", 0),
    ] {
        assert!(matches!(
            h.orchestrator.create(Some(&admin()), &req, &h.cancel),
            Err(DockhandError::InvalidInput { .. })
        ));
    }
    assert!(h.runtime.calls().is_empty());
}

#[test]
fn port_in_use_discards_assets_and_leaves_no_audit() {
    let h = Harness::new(FakeRuntime::default());
    h.runtime.occupy_port(8080);
    let err = h
        .orchestrator
        .create(Some(&admin()), &request("web1", "nginx:alpine", 8080), &h.cancel)
        .unwrap_err();
    assert!(matches!(err, DockhandError::PortInUse { port: 8080 }));
    assert_eq!(err.user_message(), "Port already in use");
    assert!(!h.sites.site_dir("web1").exists());
    assert_eq!(h.runtime.status_of("web1"), None);
    assert!(h.audit.snapshot().is_empty());
}

#[test]
fn cancelled_create_surfaces_cancellation() {
    let h = Harness::new(FakeRuntime::default());
    h.cancel.cancel();
    let err = h
        .orchestrator
        .create(Some(&admin()), &request("api", "devops-web:latest", 9000), &h.cancel)
        .unwrap_err();
    assert!(matches!(err, DockhandError::Cancelled { .. }));
    assert!(h.audit.snapshot().is_empty());
}

#[test]
fn runtime_name_conflict_keeps_the_winners_site_assets() {
    let h = Harness::new(FakeRuntime::with(&[("web1", ContainerStatus::Running)]));
    h.runtime.hide_from_listing("web1");
    let err = h
        .orchestrator
        .create(Some(&admin()), &request("web1", "nginx:alpine", 8080), &h.cancel)
        .unwrap_err();
    assert!(matches!(err, DockhandError::NameConflict { .. }));
    assert_eq!(h.runtime.create_calls(), 1);
    assert!(h.sites.site_dir("web1").join("index.html").exists());
    assert!(h.audit.snapshot().is_empty());
}

#[test]
fn cancelled_static_site_create_keeps_site_assets() {
    let h = Harness::new(FakeRuntime::default());
    h.cancel.cancel();
    let err = h
        .orchestrator
        .create(Some(&admin()), &request("web1", "nginx:alpine", 8080), &h.cancel)
        .unwrap_err();
    assert!(matches!(err, DockhandError::Cancelled { .. }));
    assert!(h.sites.site_dir("web1").join("index.html").exists());
    assert!(h.audit.snapshot().is_empty());
}

// ── Authorization ──────────────────────────────────────────────────

#[test]
fn viewer_cannot_mutate_and_nothing_happens() {
    let h = Harness::new(FakeRuntime::with(&[("web1", ContainerStatus::Running)]));
    let actor = viewer();
    let results = [
        h.orchestrator
            .create(Some(&actor), &request("web2", "nginx:alpine", 8081), &h.cancel)
            .map(|_| ()),
        h.orchestrator.start(Some(&actor), "web1", &h.cancel),
        h.orchestrator.stop(Some(&actor), "web1", &h.cancel),
        h.orchestrator.delete(Some(&actor), "web1", &h.cancel),
    ];
    for result in results {
        let err = result.unwrap_err();
        assert!(matches!(err, DockhandError::Forbidden { required: Role::Admin, .. }));
        assert_eq!(err.user_message(), "Admin access required");
    }
    assert!(h.runtime.calls().is_empty());
    assert!(!h.sites.root().exists());
    assert!(h.audit.snapshot().is_empty());
}

#[test]
fn anonymous_mutation_is_unauthenticated() {
    let h = Harness::new(FakeRuntime::with(&[("web1", ContainerStatus::Running)]));
    assert!(matches!(
        h.orchestrator.stop(None, "web1", &h.cancel),
        Err(DockhandError::Unauthenticated)
    ));
    assert!(h.runtime.calls().is_empty());
}

// ── Lifecycle and audit ────────────────────────────────────────────

#[test]
fn lifecycle_on_unknown_name_is_not_found_without_audit() {
    let h = Harness::new(FakeRuntime::default());
    let actor = admin();
    for result in [
        h.orchestrator.start(Some(&actor), "ghost", &h.cancel),
        h.orchestrator.stop(Some(&actor), "ghost", &h.cancel),
        h.orchestrator.delete(Some(&actor), "ghost", &h.cancel),
    ] {
        assert!(matches!(result, Err(DockhandError::NotFound { .. })));
    }
    assert!(h.audit.snapshot().is_empty());
}

#[test]
fn each_successful_transition_is_audited_once() {
    let h = Harness::new(FakeRuntime::default());
    let actor = admin();
    let _ = h
        .orchestrator
        .create(Some(&actor), &request("web1", "nginx:alpine", 8080), &h.cancel)
        .unwrap();
    h.orchestrator.stop(Some(&actor), "web1", &h.cancel).unwrap();
    assert_eq!(h.runtime.status_of("web1"), Some(ContainerStatus::Stopped));
    h.orchestrator.start(Some(&actor), "web1", &h.cancel).unwrap();
    assert_eq!(h.runtime.status_of("web1"), Some(ContainerStatus::Running));
    h.orchestrator.delete(Some(&actor), "web1", &h.cancel).unwrap();
    assert_eq!(h.runtime.status_of("web1"), None);
    assert!(h.runtime.calls().contains(&Call::Remove("web1".into())));

    let actions: Vec<_> = h.audit.snapshot().into_iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        [
            "Created container web1 (nginx:alpine)",
            "Stopped web1",
            "Started web1",
            "Deleted web1",
        ]
    );
    assert!(h.audit.snapshot().iter().all(|e| e.username == "ada"));
}

#[test]
fn audit_failure_is_surfaced_as_storage_failure() {
    let h = Harness::new(FakeRuntime::with(&[("web1", ContainerStatus::Stopped)]));
    h.audit.fail_appends();
    let err = h
        .orchestrator
        .start(Some(&admin()), "web1", &h.cancel)
        .unwrap_err();
    assert!(matches!(err, DockhandError::AuditFailed { ref action, .. } if action == "Started web1"));
    assert!(err.is_local_storage_failure());
    assert_eq!(h.runtime.status_of("web1"), Some(ContainerStatus::Running));
}

#[test]
fn audit_trail_is_readable_by_viewers() {
    let h = Harness::new(FakeRuntime::with(&[("web1", ContainerStatus::Running)]));
    h.orchestrator.stop(Some(&admin()), "web1", &h.cancel).unwrap();
    let entries = h.orchestrator.audit_entries(Some(&viewer())).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(matches!(
        h.orchestrator.audit_entries(None),
        Err(DockhandError::Unauthenticated)
    ));
}
