//! Static site assets for web server containers.
//!
//! Each static-site container gets its own directory under the sites root,
//! named after the container, holding a single generated `index.html`.
//! Directories are never shared between names, so concurrent creates of
//! different containers do not contend.

use std::path::{Path, PathBuf};

use dockhand_common::error::{DockhandError, Result};

/// File name of the generated page.
pub const INDEX_FILE: &str = "index.html";

/// Writes generated pages under a fixed root directory.
#[derive(Debug, Clone)]
pub struct SiteAssetWriter {
    root: PathBuf,
}

impl SiteAssetWriter {
    /// Creates a writer rooted at `root`. Nothing is created on disk yet.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the sites root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory holding assets for `container_name`.
    #[must_use]
    pub fn site_dir(&self, container_name: &str) -> PathBuf {
        self.root.join(container_name)
    }

    /// Generates the page for `container_name` and returns the absolute
    /// host path of the written file, ready to be bind-mounted.
    ///
    /// `title` and `body` are inserted into the page as given.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn write(&self, container_name: &str, title: &str, body: &str) -> Result<PathBuf> {
        let dir = self.site_dir(container_name);
        // create_dir_all already treats an existing directory as success.
        std::fs::create_dir_all(&dir).map_err(|e| DockhandError::Io {
            path: dir.clone(),
            source: e,
        })?;

        let index = dir.join(INDEX_FILE);
        std::fs::write(&index, render_page(container_name, title, body)).map_err(|e| {
            DockhandError::Io {
                path: index.clone(),
                source: e,
            }
        })?;

        let absolute = std::path::absolute(&index).map_err(|e| DockhandError::Io {
            path: index.clone(),
            source: e,
        })?;
        tracing::info!(name = container_name, path = %absolute.display(), "site assets written");
        Ok(absolute)
    }

    /// Removes the assets of `container_name`. A missing directory is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    pub fn discard(&self, container_name: &str) -> Result<()> {
        let dir = self.site_dir(container_name);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::debug!(name = container_name, "site assets discarded");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DockhandError::Io { path: dir, source: e }),
        }
    }
}

fn render_page(container_name: &str, title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>
<html>
<head><title>{title}</title></head>
<body>
<h1>{title}</h1>
<p>{body}</p>
<hr>
<p><b>Container:</b> {container_name}</p>
</body>
</html>
"
    )
}
