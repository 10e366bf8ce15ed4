//! Append-only audit trail of mutating actions.
//!
//! One line per action, `timestamp | username | action`, in local time.
//! Lines are appended with a single write while holding both an in-process
//! mutex and an exclusive advisory lock on the file, so concurrent writers
//! in this or another process never interleave partial lines.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use dockhand_common::constants::AUDIT_FIELD_SEPARATOR;
use dockhand_common::error::{DockhandError, Result};
use dockhand_common::types::{Actor, AuditEntry};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Durable record of who did what.
pub trait AuditLog: Send + Sync {
    /// Appends one entry for `actor` and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be made durable.
    fn record(&self, actor: &Actor, action: &str) -> Result<AuditEntry>;

    /// Reads back every entry, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the trail cannot be read.
    fn entries(&self) -> Result<Vec<AuditEntry>>;
}

/// Audit trail stored as a plain text file.
#[derive(Debug)]
pub struct FileAuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileAuditLog {
    /// Opens (lazily) the trail at `path`. The file and its parent
    /// directory are created on the first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the file backing this trail.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_for_append(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DockhandError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| DockhandError::Io {
                path: self.path.clone(),
                source: e,
            })
    }

    fn append_line(&self, line: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let file = self.open_for_append()?;
        let mut file = lock_exclusive(file, &self.path)?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| DockhandError::Io {
                path: self.path.clone(),
                source: e,
            })
    }
}

impl AuditLog for FileAuditLog {
    fn record(&self, actor: &Actor, action: &str) -> Result<AuditEntry> {
        let entry = AuditEntry {
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            username: single_line(&actor.username),
            action: single_line(action),
        };
        self.append_line(&format_line(&entry))?;
        tracing::debug!(user = %entry.username, action = %entry.action, "audit entry recorded");
        Ok(entry)
    }

    fn entries(&self) -> Result<Vec<AuditEntry>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(DockhandError::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                let entry = parse_line(line);
                if entry.is_none() {
                    tracing::warn!(line, "skipping malformed audit line");
                }
                entry
            })
            .collect())
    }
}

#[cfg(unix)]
fn lock_exclusive(file: File, path: &Path) -> Result<nix::fcntl::Flock<File>> {
    nix::fcntl::Flock::lock(file, nix::fcntl::FlockArg::LockExclusive).map_err(|(_, errno)| {
        DockhandError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::from(errno),
        }
    })
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn lock_exclusive(file: File, _path: &Path) -> Result<File> {
    Ok(file)
}

/// Renders an entry as one newline-terminated line.
#[must_use]
pub fn format_line(entry: &AuditEntry) -> String {
    format!(
        "{ts}{sep}{user}{sep}{action}\n",
        ts = entry.timestamp,
        user = entry.username,
        action = entry.action,
        sep = AUDIT_FIELD_SEPARATOR,
    )
}

/// Parses one line written by [`format_line`]. The action may itself
/// contain the separator.
#[must_use]
pub fn parse_line(line: &str) -> Option<AuditEntry> {
    let mut fields = line.splitn(3, AUDIT_FIELD_SEPARATOR);
    let timestamp = fields.next()?;
    let username = fields.next()?;
    let action = fields.next()?;
    Some(AuditEntry {
        timestamp: timestamp.to_string(),
        username: username.to_string(),
        action: action.to_string(),
    })
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
