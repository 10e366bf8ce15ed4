//! Authentication and role checks.

use dockhand_common::error::{DockhandError, Result};
use dockhand_common::types::{Actor, Role};

/// Privilege an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Reading container state: any authenticated identity.
    Read,
    /// Changing container state: administrators only.
    Mutate,
}

impl Access {
    /// Role that satisfies this access level.
    #[must_use]
    pub const fn required_role(self) -> Role {
        match self {
            Self::Read => Role::Viewer,
            Self::Mutate => Role::Admin,
        }
    }
}

/// Rejects requests without an identity.
///
/// # Errors
///
/// Returns [`DockhandError::Unauthenticated`] when `actor` is `None`.
pub fn require_authenticated(actor: Option<&Actor>) -> Result<&Actor> {
    actor.ok_or(DockhandError::Unauthenticated)
}

/// Rejects identities whose role does not cover `required`.
///
/// # Errors
///
/// Returns [`DockhandError::Forbidden`] naming the actor and the role.
pub fn require_role(actor: &Actor, required: Role) -> Result<()> {
    match (actor.role, required) {
        (Role::Admin, _) | (Role::Viewer, Role::Viewer) => Ok(()),
        (Role::Viewer, Role::Admin) => Err(DockhandError::Forbidden {
            username: actor.username.clone(),
            required,
        }),
    }
}

/// Runs both checks for `access` and returns the authorized actor.
///
/// # Errors
///
/// Returns `Unauthenticated` or `Forbidden`.
pub fn authorize(actor: Option<&Actor>, access: Access) -> Result<&Actor> {
    let actor = require_authenticated(actor)?;
    require_role(actor, access.required_role())?;
    Ok(actor)
}
