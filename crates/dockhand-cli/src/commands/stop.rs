//! `dockhand stop` — Stop a running container.

use clap::Args;

use crate::commands::GlobalArgs;
use crate::output;
use crate::session;

/// Arguments for the `stop` command.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Container name.
    pub name: String,
}

/// Executes the `stop` command.
///
/// # Errors
///
/// Returns an error if login fails, the container does not exist, or the
/// audit trail could not be written.
pub fn execute(args: &StopArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let session = session::open(global)?;
    session
        .orchestrator
        .stop(session.actor.as_ref(), &args.name, &session.cancel)
        .map_err(output::report)?;
    output::confirm(&format!("Stopped {}", args.name));
    Ok(())
}
