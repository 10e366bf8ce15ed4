//! `dockhand create` — Provision and start a container.

use clap::Args;
use dockhand_control::orchestrator::CreateRequest;
use dockhand_provision::policy::{self, IMAGE_PROFILES};

use crate::commands::GlobalArgs;
use crate::output::{self, BOLD, DIM, RESET};
use crate::session;

/// Arguments for the `create` command.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Name of the new container.
    #[arg(long)]
    pub name: String,

    /// Host port to publish the application on.
    #[arg(long, value_parser = policy::parse_host_port)]
    pub port: u16,

    /// Image to run: `nginx:alpine`, `data-web:latest` or `devops-web:latest`.
    #[arg(long)]
    pub image: String,

    /// Page title, for static site images.
    #[arg(long, default_value = "")]
    pub title: String,

    /// Page body, for static site images.
    #[arg(long, default_value = "")]
    pub body: String,
}

/// Executes the `create` command.
///
/// # Errors
///
/// Returns the rejection message (name taken, unknown image, port in use,
/// engine error) or a hard error if the audit trail could not be written.
pub fn execute(args: CreateArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let session = session::open(global)?;
    let request = CreateRequest {
        name: args.name,
        host_port: args.port,
        image: args.image,
        title: args.title,
        body: args.body,
    };
    let id = match session
        .orchestrator
        .create(session.actor.as_ref(), &request, &session.cancel)
    {
        Ok(id) => id,
        Err(e @ dockhand_common::error::DockhandError::UnknownImageType { .. }) => {
            let known: Vec<_> = IMAGE_PROFILES.iter().map(|p| p.image).collect();
            eprintln!("  {DIM}Allowed images: {}{RESET}", known.join(", "));
            return Err(output::report(e));
        }
        Err(e) => return Err(output::report(e)),
    };

    if global.json {
        return output::print_json(&serde_json::json!({
            "id": id.as_str(),
            "name": request.name,
            "port": request.host_port,
        }));
    }
    output::confirm(&format!(
        "Created {BOLD}{}{RESET} ({}) on port {}",
        request.name,
        id.short(),
        request.host_port
    ));
    Ok(())
}
