//! # dockhand
//!
//! Control plane for single-host containers.
//! Lists, provisions, and drives the lifecycle of containers from a vetted
//! set of images, with role checks and an audit trail on every change.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod commands;
mod output;
mod session;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if cli.global.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    commands::execute(cli)
}
