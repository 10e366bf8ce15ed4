//! Global configuration model for the dockhand control plane.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{DockhandError, Result};

/// Root configuration for the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockhandConfig {
    /// Base directory for dockhand state and data.
    pub data_dir: PathBuf,
    /// Append-only audit trail.
    pub audit_log: PathBuf,
    /// Root of the per-container static site directories.
    pub sites_dir: PathBuf,
    /// JSON credential store.
    pub users_file: PathBuf,
    /// Runtime endpoint (`unix://...` or `tcp://...`). Local defaults when unset.
    pub docker_host: Option<String>,
    /// Deadline for a single runtime API call.
    pub request_timeout_secs: u64,
    /// Grace period before a stopping container is killed.
    pub stop_timeout_secs: i64,
    /// Default number of log lines returned by a tail request.
    pub log_tail_lines: usize,
}

impl DockhandConfig {
    /// Builds the default layout rooted at `data_dir`.
    #[must_use]
    pub fn rooted_at(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            audit_log: data_dir.join("logs").join(constants::AUDIT_LOG_FILE),
            sites_dir: data_dir.join(constants::SITES_DIR),
            users_file: data_dir.join(constants::USERS_FILE),
            data_dir,
            docker_host: None,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            stop_timeout_secs: constants::DEFAULT_STOP_TIMEOUT_SECS,
            log_tail_lines: constants::DEFAULT_LOG_TAIL,
        }
    }

    /// Loads the configuration at `path`, or the defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if it holds an unusable value.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| DockhandError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: ConfigFile = serde_json::from_str(&content)?;
        let config = file.resolve();
        config.validate()?;
        Ok(config)
    }

    /// Checks values that serde cannot reject on its own.
    ///
    /// # Errors
    ///
    /// Returns [`DockhandError::Config`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(DockhandError::Config {
                message: "request_timeout_secs must be greater than zero".into(),
            });
        }
        if self.log_tail_lines == 0 {
            return Err(DockhandError::Config {
                message: "log_tail_lines must be greater than zero".into(),
            });
        }
        if self.stop_timeout_secs < 0 {
            return Err(DockhandError::Config {
                message: "stop_timeout_secs must not be negative".into(),
            });
        }
        Ok(())
    }
}

/// On-disk form of [`DockhandConfig`]; unset paths derive from `data_dir`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    audit_log: Option<PathBuf>,
    sites_dir: Option<PathBuf>,
    users_file: Option<PathBuf>,
    docker_host: Option<String>,
    request_timeout_secs: Option<u64>,
    stop_timeout_secs: Option<i64>,
    log_tail_lines: Option<usize>,
}

impl ConfigFile {
    fn resolve(self) -> DockhandConfig {
        let base = self
            .data_dir
            .map_or_else(DockhandConfig::default, DockhandConfig::rooted_at);
        DockhandConfig {
            audit_log: self.audit_log.unwrap_or(base.audit_log),
            sites_dir: self.sites_dir.unwrap_or(base.sites_dir),
            users_file: self.users_file.unwrap_or(base.users_file),
            docker_host: self.docker_host.or(base.docker_host),
            request_timeout_secs: self.request_timeout_secs.unwrap_or(base.request_timeout_secs),
            stop_timeout_secs: self.stop_timeout_secs.unwrap_or(base.stop_timeout_secs),
            log_tail_lines: self.log_tail_lines.unwrap_or(base.log_tail_lines),
            data_dir: base.data_dir,
        }
    }
}

impl Default for DockhandConfig {
    fn default() -> Self {
        Self::rooted_at(constants::data_dir().clone())
    }
}
