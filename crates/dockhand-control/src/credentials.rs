//! User accounts and login.
//!
//! Passwords are stored as Argon2 PHC strings, never in clear text.

use std::path::{Path, PathBuf};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use dockhand_common::error::{DockhandError, Result};
use dockhand_common::types::{Actor, Role};
use serde::{Deserialize, Serialize};

const MAX_USERNAME_LENGTH: usize = 64;

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique login name.
    pub username: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Privilege level.
    pub role: Role,
}

/// Source of user accounts.
pub trait CredentialStore: Send + Sync {
    /// Looks up an account by exact username.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Checks `password` against the stored hash.
    fn verify_password(&self, user: &UserRecord, password: &str) -> bool;
}

/// Resolves a login into an [`Actor`].
///
/// Unknown users and wrong passwords are indistinguishable to the caller.
///
/// # Errors
///
/// Returns [`DockhandError::Unauthenticated`] on any mismatch, or the
/// store's error if it cannot be read.
pub fn authenticate(store: &dyn CredentialStore, username: &str, password: &str) -> Result<Actor> {
    match store.find_by_username(username)? {
        Some(user) if store.verify_password(&user, password) => {
            tracing::debug!(user = username, role = %user.role, "login accepted");
            Ok(Actor::new(user.username, user.role))
        }
        _ => {
            tracing::warn!(user = username, "login rejected");
            Err(DockhandError::Unauthenticated)
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersFile {
    users: Vec<UserRecord>,
}

/// Accounts kept in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonCredentialStore {
    path: PathBuf,
}

impl JsonCredentialStore {
    /// Uses the file at `path`. A missing file means no accounts.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<UsersFile> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(UsersFile::default()),
            Err(e) => Err(DockhandError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn save(&self, users: &UsersFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DockhandError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(users)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| DockhandError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| DockhandError::Io {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Adds an account.
    ///
    /// # Errors
    ///
    /// Returns [`DockhandError::Credentials`] for an invalid or duplicate
    /// username, or an I/O error if the file cannot be written.
    pub fn add_user(&self, username: &str, password: &str, role: Role) -> Result<()> {
        validate_username(username)?;
        if password.is_empty() {
            return Err(DockhandError::Credentials {
                message: "password must not be empty".into(),
            });
        }
        let mut users = self.load()?;
        if users.users.iter().any(|u| u.username == username) {
            return Err(DockhandError::Credentials {
                message: format!("user {username} already exists"),
            });
        }
        users.users.push(UserRecord {
            username: username.to_string(),
            password_hash: hash_password(password)?,
            role,
        });
        self.save(&users)?;
        tracing::info!(user = username, %role, "user added");
        Ok(())
    }

    /// Lists every account.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn users(&self) -> Result<Vec<UserRecord>> {
        Ok(self.load()?.users)
    }
}

impl CredentialStore for JsonCredentialStore {
    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .load()?
            .users
            .into_iter()
            .find(|u| u.username == username))
    }

    fn verify_password(&self, user: &UserRecord, password: &str) -> bool {
        PasswordHash::new(&user.password_hash).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }
}

/// Hashes `password` with a fresh random salt.
///
/// # Errors
///
/// Returns [`DockhandError::Credentials`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DockhandError::Credentials {
            message: format!("failed to hash password: {e}"),
        })
}

/// Usernames end up in the audit trail, so separators and control
/// characters are refused.
fn validate_username(username: &str) -> Result<()> {
    let valid = !username.is_empty()
        && username.len() <= MAX_USERNAME_LENGTH
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '@'));
    if valid {
        Ok(())
    } else {
        Err(DockhandError::Credentials {
            message: format!("invalid username '{username}'"),
        })
    }
}
