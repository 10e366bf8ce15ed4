//! `dockhand user` — Manage user accounts.
//!
//! Accounts live in the local users file and are managed by whoever can
//! write it; no login is required.

use clap::{Args, Subcommand};
use dockhand_common::types::Role;
use dockhand_control::credentials::JsonCredentialStore;

use crate::commands::GlobalArgs;
use crate::output;
use crate::session;

/// Arguments for the `user` command.
#[derive(Args, Debug)]
pub struct UserArgs {
    /// Account action.
    #[command(subcommand)]
    pub action: UserAction,
}

/// Account actions.
#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Add an account. The password is read from `--password` or the
    /// password environment variable.
    Add {
        /// Login name.
        username: String,
        /// Privilege level: `admin` or `viewer`.
        #[arg(long)]
        role: Role,
    },
    /// List accounts.
    List,
}

/// Executes the `user` command.
///
/// # Errors
///
/// Returns an error if the users file cannot be read or written, or the
/// account is invalid.
pub fn execute(args: UserArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = session::load_config(global)?;
    let store = JsonCredentialStore::new(&config.users_file);

    match args.action {
        UserAction::Add { username, role } => {
            let Some(password) = global.password.as_deref() else {
                anyhow::bail!(
                    "password required: pass --password or set {}",
                    dockhand_common::constants::PASSWORD_ENV
                );
            };
            store
                .add_user(&username, password, role)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            output::confirm(&format!("Added {role} {username}"));
        }
        UserAction::List => {
            let users = store.users().map_err(|e| anyhow::anyhow!("{e}"))?;
            if global.json {
                let rows: Vec<_> = users
                    .iter()
                    .map(|u| serde_json::json!({ "username": u.username, "role": u.role }))
                    .collect();
                return output::print_json(&rows);
            }
            for u in &users {
                println!("{:<24} {}", u.username, u.role);
            }
        }
    }
    Ok(())
}
