//! CLI command definitions and dispatch.

pub mod audit;
pub mod create;
pub mod inspect;
pub mod logs;
pub mod ps;
pub mod rm;
pub mod start;
pub mod stats;
pub mod stop;
pub mod user;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// dockhand — control plane for single-host containers.
#[derive(Parser, Debug)]
#[command(name = "dockhand", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options accepted before or after any subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to the configuration file.
    #[arg(long, global = true, env = "DOCKHAND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Username to act as.
    #[arg(long, short = 'u', global = true, env = "DOCKHAND_USER")]
    pub user: Option<String>,

    /// Password for `--user`.
    #[arg(
        long,
        global = true,
        env = dockhand_common::constants::PASSWORD_ENV,
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Print structured JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit diagnostics as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List containers, stopped ones included.
    Ps(ps::PsArgs),
    /// Show the full record of one container.
    Inspect(inspect::InspectArgs),
    /// Show the last lines of a container's output.
    Logs(logs::LogsArgs),
    /// Show CPU and memory usage of a container.
    Stats(stats::StatsArgs),
    /// Provision and start a container from an allowlisted image.
    Create(create::CreateArgs),
    /// Start a stopped container.
    Start(start::StartArgs),
    /// Stop a running container.
    Stop(stop::StopArgs),
    /// Force-remove a container.
    Rm(rm::RmArgs),
    /// Print the audit trail.
    Audit(audit::AuditArgs),
    /// Manage user accounts.
    User(user::UserArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let global = &cli.global;
    match cli.command {
        Command::Ps(args) => ps::execute(&args, global),
        Command::Inspect(args) => inspect::execute(&args, global),
        Command::Logs(args) => logs::execute(&args, global),
        Command::Stats(args) => stats::execute(&args, global),
        Command::Create(args) => create::execute(args, global),
        Command::Start(args) => start::execute(&args, global),
        Command::Stop(args) => stop::execute(&args, global),
        Command::Rm(args) => rm::execute(&args, global),
        Command::Audit(args) => audit::execute(&args, global),
        Command::User(args) => user::execute(args, global),
    }
}
