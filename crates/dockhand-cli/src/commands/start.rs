//! `dockhand start` — Start a stopped container.

use clap::Args;

use crate::commands::GlobalArgs;
use crate::output;
use crate::session;

/// Arguments for the `start` command.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Container name.
    pub name: String,
}

/// Executes the `start` command.
///
/// # Errors
///
/// Returns an error if login fails, the container does not exist, or the
/// audit trail could not be written.
pub fn execute(args: &StartArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let session = session::open(global)?;
    session
        .orchestrator
        .start(session.actor.as_ref(), &args.name, &session.cancel)
        .map_err(output::report)?;
    output::confirm(&format!("Started {}", args.name));
    Ok(())
}
