//! Filesystem pools shared by every scan run and the retention sweep.

use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

/// Default name of the working-area pool, relative to the storage root.
pub const WORK_DIR_NAME: &str = "temp";
/// Default name of the result pool, relative to the storage root.
pub const RESULT_DIR_NAME: &str = "results";

const UPLOAD_DIR_NAME: &str = "upload";
const EXTRACT_DIR_NAME: &str = "extracted";

/// The two shared pool directories. Injected everywhere instead of relying on
/// process-relative paths so tests can point at isolated temporary roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoots {
    work_root: PathBuf,
    result_root: PathBuf,
}

impl StorageRoots {
    pub fn new(
        work_root: impl Into<PathBuf>,
        result_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            work_root: work_root.into(),
            result_root: result_root.into(),
        }
    }

    /// `temp/` and `results/` beneath a single base directory.
    pub fn under(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self::new(base.join(WORK_DIR_NAME), base.join(RESULT_DIR_NAME))
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }

    pub fn result_root(&self) -> &Path {
        &self.result_root
    }

    /// Both pools, in sweep order.
    pub fn pools(&self) -> [&Path; 2] {
        [&self.work_root, &self.result_root]
    }

    /// Create both pool directories if they are missing.
    pub async fn ensure(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.work_root).await?;
        tokio::fs::create_dir_all(&self.result_root).await?;
        Ok(())
    }

    /// Allocate a fresh, uniquely named working area inside the work pool.
    pub async fn allocate_working_area(&self) -> Result<WorkingArea> {
        let id = Uuid::new_v4();
        let root = self.work_root.join(id.to_string());
        tokio::fs::create_dir_all(root.join(UPLOAD_DIR_NAME)).await?;
        debug!(work_id = %id, path = %root.display(), "working area allocated");
        Ok(WorkingArea { id, root })
    }
}

/// Per-upload subtree of the work pool.
#[derive(Debug, Clone)]
pub struct WorkingArea {
    id: Uuid,
    root: PathBuf,
}

impl WorkingArea {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the uploaded archive itself is persisted: `upload/<name>`, never
    /// a sibling of [`Self::extract_dir`].
    pub fn archive_path(&self, file_name: &str) -> PathBuf {
        self.root.join(UPLOAD_DIR_NAME).join(file_name)
    }

    /// Destination of the extracted archive contents.
    pub fn extract_dir(&self) -> PathBuf {
        self.root.join(EXTRACT_DIR_NAME)
    }
}
