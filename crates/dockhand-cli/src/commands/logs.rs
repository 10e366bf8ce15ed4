//! `dockhand logs` — View container logs.

use clap::Args;

use crate::commands::GlobalArgs;
use crate::output;
use crate::session;

/// Arguments for the `logs` command.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Container name.
    pub name: String,

    /// Number of lines from the end of the output (defaults to the
    /// configured tail).
    #[arg(short = 'n', long)]
    pub tail: Option<usize>,
}

/// Executes the `logs` command.
///
/// An unknown container prints a placeholder rather than failing.
///
/// # Errors
///
/// Returns an error if login or the runtime call fails.
pub fn execute(args: &LogsArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let session = session::open(global)?;
    let view = session
        .orchestrator
        .logs(session.actor.as_ref(), &args.name, args.tail, &session.cancel)
        .map_err(output::report)?;

    if global.json {
        return output::print_json(&view);
    }
    if view.logs.is_empty() {
        println!("No logs available for container: {}", args.name);
    } else if view.logs.ends_with('\n') {
        print!("{}", view.logs);
    } else {
        println!("{}", view.logs);
    }
    Ok(())
}
