//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Default base directory for dockhand data when no home directory is usable.
pub const SYSTEM_DATA_DIR: &str = "/var/lib/dockhand";

/// Returns the data directory, preferring `$HOME/.dockhand` and
/// falling back to `/var/lib/dockhand`.
fn resolve_data_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        let user_dir = PathBuf::from(home).join(".dockhand");
        if std::fs::create_dir_all(&user_dir).is_ok() {
            return user_dir;
        }
    }
    PathBuf::from(SYSTEM_DATA_DIR)
}

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the resolved data directory for this session.
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(resolve_data_dir)
}

/// Returns the default configuration file path.
pub fn default_config_file() -> PathBuf {
    data_dir().join("config.json")
}

/// File name of the append-only audit trail, under `logs/`.
pub const AUDIT_LOG_FILE: &str = "actions.log";

/// Directory holding one sub-directory of static assets per site container.
pub const SITES_DIR: &str = "sites";

/// File name of the credential store.
pub const USERS_FILE: &str = "users.json";

/// Separator between the fields of an audit line.
pub const AUDIT_FIELD_SEPARATOR: &str = " | ";

/// Number of characters kept from a runtime-assigned container id.
pub const SHORT_ID_LENGTH: usize = 12;

/// Number of hex characters kept from an image digest in short ids.
pub const SHORT_IMAGE_ID_LENGTH: usize = 10;

/// Default number of log lines returned by a tail request.
pub const DEFAULT_LOG_TAIL: usize = 100;

/// Default deadline for a single runtime API call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default grace period given to a container on stop before it is killed.
pub const DEFAULT_STOP_TIMEOUT_SECS: i64 = 10;

/// Text returned in place of logs when the container does not exist.
pub const LOGS_NOT_FOUND_PLACEHOLDER: &str = "Container not found";

/// Environment variable carrying the operator password for the CLI.
pub const PASSWORD_ENV: &str = "DOCKHAND_PASSWORD";
