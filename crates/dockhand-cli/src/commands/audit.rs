//! `dockhand audit` — Print the audit trail.

use clap::Args;

use crate::commands::GlobalArgs;
use crate::output::{self, DIM, RESET};
use crate::session;

/// Arguments for the `audit` command.
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Only show the last N entries.
    #[arg(short = 'n', long)]
    pub last: Option<usize>,

    /// Only show entries by this user.
    #[arg(long)]
    pub by: Option<String>,
}

/// Executes the `audit` command.
///
/// # Errors
///
/// Returns an error if login fails or the trail cannot be read.
pub fn execute(args: &AuditArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let session = session::open(global)?;
    let mut entries = session
        .orchestrator
        .audit_entries(session.actor.as_ref())
        .map_err(output::report)?;

    if let Some(user) = &args.by {
        entries.retain(|e| &e.username == user);
    }
    if let Some(last) = args.last {
        let skip = entries.len().saturating_sub(last);
        let _ = entries.drain(..skip);
    }

    if global.json {
        return output::print_json(&entries);
    }
    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }
    for e in &entries {
        println!("{DIM}{}{RESET}  {:<16} {}", e.timestamp, e.username, e.action);
    }
    Ok(())
}
