//! `dockhand stats` — Show resource usage of a container.

use clap::Args;

use crate::commands::GlobalArgs;
use crate::output;
use crate::session;

/// Arguments for the `stats` command.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Container name.
    pub name: String,
}

/// Executes the `stats` command.
///
/// # Errors
///
/// Returns an error if login or the runtime call fails.
pub fn execute(args: &StatsArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let session = session::open(global)?;
    let snapshot = session
        .orchestrator
        .stats(session.actor.as_ref(), &args.name, &session.cancel)
        .map_err(output::report)?;

    if global.json {
        return match snapshot {
            Some(s) => output::print_json(&s),
            None => output::print_json(&serde_json::json!({})),
        };
    }
    let Some(s) = snapshot else {
        println!("No stats available for container: {}", args.name);
        return Ok(());
    };
    println!("CPU:     {:.2}%", s.cpu_percent);
    println!(
        "Memory:  {} / {}",
        output::format_megabytes(s.mem_usage_mb),
        output::format_megabytes(s.mem_limit_mb)
    );
    Ok(())
}
