//! `dockhand ps` — List containers.

use clap::Args;

use crate::commands::GlobalArgs;
use crate::output::{self, BOLD, RESET};
use crate::session;

/// Arguments for the `ps` command.
#[derive(Args, Debug)]
pub struct PsArgs {
    /// Only show running containers.
    #[arg(short, long)]
    pub running: bool,
}

/// Executes the `ps` command.
///
/// Lists every container known to the engine, sorted by name.
///
/// # Errors
///
/// Returns an error if login or the listing fails.
pub fn execute(args: &PsArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let session = session::open(global)?;
    let containers = session
        .orchestrator
        .list(session.actor.as_ref(), &session.cancel)
        .map_err(output::report)?;

    let shown: Vec<_> = containers
        .into_iter()
        .filter(|c| !args.running || c.status == dockhand_common::types::ContainerStatus::Running)
        .collect();

    if global.json {
        return output::print_json(&shown);
    }
    if shown.is_empty() {
        println!("No containers found.");
        return Ok(());
    }

    println!(
        "{BOLD}{:<14} {:<24} {:<16} {:<28} {:<8}{RESET}",
        "CONTAINER ID", "NAME", "STATUS", "IMAGE", "PORT"
    );
    for c in &shown {
        let port = if c.port.is_empty() { "-" } else { c.port.as_str() };
        println!(
            "{:<14} {:<24} {}{:<16}{RESET} {:<28} {:<8}",
            c.id,
            c.name,
            output::status_color(c.status),
            c.status.to_string(),
            c.image,
            port
        );
    }
    Ok(())
}
