//! Image allowlist and run specification policy.
//!
//! The allowlist is closed: an image reference outside [`IMAGE_PROFILES`]
//! is rejected before any file or runtime call is made.

use std::path::PathBuf;

use dockhand_common::error::{DockhandError, Result};
use dockhand_common::types::{Protocol, RunSpec, VolumeBinding};
use dockhand_runtime::backend::{ListFilter, RuntimeClient};
use tokio_util::sync::CancellationToken;

/// Longest container name accepted; names double as directory names.
const MAX_NAME_LENGTH: usize = 128;

/// How an allowlisted image is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKind {
    /// Web server serving a generated page from the given document path.
    StaticSite {
        /// Path of the index file inside the container.
        document_path: &'static str,
    },
    /// Self-contained application image; nothing is mounted.
    Application,
}

/// Provisioning rules for one allowlisted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageProfile {
    /// Exact image reference.
    pub image: &'static str,
    /// Port the application listens on inside the container.
    pub container_port: u16,
    /// Protocol of `container_port`.
    pub protocol: Protocol,
    /// Whether a static site volume is generated and mounted.
    pub kind: AppKind,
}

impl ImageProfile {
    /// Returns whether containers of this image need site assets.
    #[must_use]
    pub const fn uses_volume(&self) -> bool {
        matches!(self.kind, AppKind::StaticSite { .. })
    }
}

/// The images dockhand will provision.
pub const IMAGE_PROFILES: &[ImageProfile] = &[
    ImageProfile {
        image: "nginx:alpine",
        container_port: 80,
        protocol: Protocol::Tcp,
        kind: AppKind::StaticSite {
            document_path: "/usr/share/nginx/html/index.html",
        },
    },
    ImageProfile {
        image: "data-web:latest",
        container_port: 8000,
        protocol: Protocol::Tcp,
        kind: AppKind::Application,
    },
    ImageProfile {
        image: "devops-web:latest",
        container_port: 8000,
        protocol: Protocol::Tcp,
        kind: AppKind::Application,
    },
];

/// Looks up the profile for `image`.
///
/// # Errors
///
/// Returns [`DockhandError::UnknownImageType`] for images outside the allowlist.
pub fn validate_image(image: &str) -> Result<&'static ImageProfile> {
    IMAGE_PROFILES
        .iter()
        .find(|p| p.image == image)
        .ok_or_else(|| DockhandError::UnknownImageType {
            image: image.to_string(),
        })
}

/// Checks `name` against the runtime's container name grammar
/// (`[a-zA-Z0-9][a-zA-Z0-9_.-]+`).
///
/// # Errors
///
/// Returns [`DockhandError::InvalidInput`] describing the problem.
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(DockhandError::InvalidInput {
            message: format!("container name '{name}' {reason}"),
        })
    };
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return invalid("is empty");
    };
    if !first.is_ascii_alphanumeric() {
        return invalid("must start with a letter or digit");
    }
    if name.len() < 2 {
        return invalid("must be at least two characters long");
    }
    if name.len() > MAX_NAME_LENGTH {
        return invalid("is too long");
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')) {
        return invalid("may only contain letters, digits, '_', '.' and '-'");
    }
    Ok(())
}

/// Parses a host port supplied as text.
///
/// # Errors
///
/// Returns [`DockhandError::InvalidInput`] unless the value is in `1..=65535`.
pub fn parse_host_port(raw: &str) -> Result<u16> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(DockhandError::InvalidInput {
            message: format!("host port '{raw}' must be a number between 1 and 65535"),
        }),
    }
}

/// Rejects `name` if the runtime already knows a container by that name.
///
/// This is a fast-path check only. Another caller may take the name between
/// this check and the create call; the runtime's own duplicate-name error
/// at create time remains the authority.
///
/// # Errors
///
/// Returns [`DockhandError::NameConflict`] if the name is taken, or the
/// runtime's error if the listing fails.
pub fn check_name_available(
    runtime: &dyn RuntimeClient,
    name: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    let existing = runtime.list(&ListFilter::named(name), cancel)?;
    if existing.iter().any(|c| c.name == name) {
        return Err(DockhandError::NameConflict {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Assembles the run specification for a validated request.
///
/// `site_asset` must be supplied for static-site profiles and is ignored
/// for application profiles.
///
/// # Errors
///
/// Returns [`DockhandError::InvalidInput`] if a static-site profile is
/// given no asset path.
pub fn build_run_spec(
    profile: &ImageProfile,
    name: &str,
    host_port: u16,
    site_asset: Option<PathBuf>,
) -> Result<RunSpec> {
    let volume = match (profile.kind, site_asset) {
        (AppKind::StaticSite { document_path }, Some(host_path)) => Some(VolumeBinding {
            host_path,
            container_path: document_path.to_string(),
            read_only: true,
        }),
        (AppKind::StaticSite { .. }, None) => {
            return Err(DockhandError::InvalidInput {
                message: format!("{} requires site assets", profile.image),
            });
        }
        (AppKind::Application, _) => None,
    };
    Ok(RunSpec {
        image: profile.image.to_string(),
        name: name.to_string(),
        container_port: profile.container_port,
        protocol: profile.protocol,
        host_port,
        detach: true,
        volume,
    })
}
