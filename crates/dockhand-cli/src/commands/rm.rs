//! `dockhand rm` — Force-remove a container.

use clap::Args;

use crate::commands::GlobalArgs;
use crate::output;
use crate::session;

/// Arguments for the `rm` command.
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Container name.
    pub name: String,
}

/// Executes the `rm` command.
///
/// # Errors
///
/// Returns an error if login fails, the container does not exist, or the
/// audit trail could not be written.
pub fn execute(args: &RmArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let session = session::open(global)?;
    session
        .orchestrator
        .delete(session.actor.as_ref(), &args.name, &session.cancel)
        .map_err(output::report)?;
    output::confirm(&format!("Removed {}", args.name));
    Ok(())
}
