use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory name the scanner expects to be pointed at.
pub const BYTECODE_DIR_NAME: &str = "bytecode_modules";

/// Depth-first search for the compiled module directory of an extracted
/// project.
#[derive(Debug, Clone)]
pub struct ModuleLocator {
    marker: String,
    follow_links: bool,
}

impl Default for ModuleLocator {
    fn default() -> Self {
        Self {
            marker: BYTECODE_DIR_NAME.to_string(),
            follow_links: false,
        }
    }
}

impl ModuleLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the directory name searched for.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Return the first directory named after the marker, visiting children
    /// in file-name order, pre-order. `root` itself is never a candidate.
    ///
    /// Unreadable entries are logged and skipped; `None` means the scanner
    /// has nothing to run against.
    pub fn locate(&self, root: &Path) -> Option<PathBuf> {
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(self.follow_links)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(
                        root = %root.display(),
                        error = %err,
                        "skipping unreadable entry while locating modules"
                    );
                    continue;
                }
            };

            if entry.file_type().is_dir() && entry.file_name() == self.marker.as_str() {
                debug!(path = %entry.path().display(), "bytecode modules located");
                return Some(entry.into_path());
            }
        }

        debug!(root = %root.display(), marker = %self.marker, "no module directory found");
        None
    }

    /// Runs [`ModuleLocator::locate`] on the blocking pool.
    pub async fn locate_async(&self, root: PathBuf) -> Option<PathBuf> {
        let locator = self.clone();
        match tokio::task::spawn_blocking(move || locator.locate(&root)).await {
            Ok(found) => found,
            Err(err) => {
                warn!(error = %err, "module locator task failed");
                None
            }
        }
    }
}
