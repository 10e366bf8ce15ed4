//! `dockhand inspect` — Show the full record of one container.

use clap::Args;

use crate::commands::GlobalArgs;
use crate::output::{self, BOLD, RESET};
use crate::session;

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Container name.
    pub name: String,
}

/// Executes the `inspect` command.
///
/// # Errors
///
/// Returns an error if login fails or the container does not exist.
pub fn execute(args: &InspectArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let session = session::open(global)?;
    let detail = session
        .orchestrator
        .detail(session.actor.as_ref(), &args.name, &session.cancel)
        .map_err(output::report)?;

    if global.json {
        return output::print_json(&detail);
    }

    let summary = &detail.summary;
    println!("{BOLD}{}{RESET}", summary.name);
    println!("  ID:       {}", summary.id);
    println!(
        "  Status:   {}{}{RESET}",
        output::status_color(summary.status),
        summary.status
    );
    println!("  Image:    {}", summary.image);
    println!("  Created:  {}", detail.created);
    println!("  Command:  {}", detail.command.join(" "));
    if detail.ports.is_empty() {
        println!("  Ports:    -");
    } else {
        println!("  Ports:");
        for mapping in &detail.ports {
            println!("    {mapping}");
        }
    }
    if !detail.mounts.is_empty() {
        println!("  Mounts:");
        for m in &detail.mounts {
            let mode = if m.read_only { "ro" } else { "rw" };
            println!("    {} {} → {} ({mode})", m.kind, m.source, m.destination);
        }
    }
    Ok(())
}
