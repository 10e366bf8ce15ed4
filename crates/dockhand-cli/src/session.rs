//! Per-invocation wiring: configuration, login, and the orchestrator.

use std::sync::Arc;

use dockhand_common::config::DockhandConfig;
use dockhand_common::constants;
use dockhand_common::types::Actor;
use dockhand_control::audit::FileAuditLog;
use dockhand_control::credentials::{self, JsonCredentialStore};
use dockhand_control::orchestrator::Orchestrator;
use dockhand_provision::site::SiteAssetWriter;
use dockhand_runtime::backend::docker::DockerBackend;
use tokio_util::sync::CancellationToken;

use crate::commands::GlobalArgs;
use crate::output;

/// Everything a container command needs.
pub struct Session {
    /// Orchestrator wired to the Docker engine.
    pub orchestrator: Orchestrator,
    /// Logged-in identity, if credentials were given.
    pub actor: Option<Actor>,
    /// Cancelled on Ctrl+C.
    pub cancel: CancellationToken,
}

/// Loads the configuration selected by `--config` or the default file.
///
/// # Errors
///
/// Returns an error if the file exists but is invalid.
pub fn load_config(global: &GlobalArgs) -> anyhow::Result<DockhandConfig> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(constants::default_config_file);
    let config = DockhandConfig::load(&path).map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::debug!(path = %path.display(), data_dir = %config.data_dir.display(), "configuration loaded");
    Ok(config)
}

/// Opens a session: logs in, connects to the engine, and installs the
/// Ctrl+C handler.
///
/// # Errors
///
/// Returns an error if configuration, login, or connection fails.
pub fn open(global: &GlobalArgs) -> anyhow::Result<Session> {
    let config = load_config(global)?;
    let actor = login(&config, global)?;

    let runtime = DockerBackend::connect(&config).map_err(output::report)?;
    let orchestrator = Orchestrator::new(
        Arc::new(runtime),
        Arc::new(FileAuditLog::new(&config.audit_log)),
        SiteAssetWriter::new(&config.sites_dir),
    )
    .with_log_tail(config.log_tail_lines);

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    ctrlc::set_handler(move || token.cancel())
        .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;

    Ok(Session {
        orchestrator,
        actor,
        cancel,
    })
}

/// Resolves `--user`/`--password` into an actor. No user means an
/// anonymous session, which the orchestrator rejects.
fn login(config: &DockhandConfig, global: &GlobalArgs) -> anyhow::Result<Option<Actor>> {
    let Some(username) = global.user.as_deref() else {
        return Ok(None);
    };
    let Some(password) = global.password.as_deref() else {
        anyhow::bail!(
            "password required for {username}: pass --password or set {}",
            constants::PASSWORD_ENV
        );
    };
    let store = JsonCredentialStore::new(&config.users_file);
    let actor = credentials::authenticate(&store, username, password).map_err(output::report_login)?;
    Ok(Some(actor))
}
