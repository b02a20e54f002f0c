//! End-to-end handling of one uploaded archive.
//!
//! `submit` runs intake, extraction, location, scanning and collection
//! strictly in order. The first failing stage aborts the run; nothing is
//! retried.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::archive::{ExtractionSummary, extract_archive};
use crate::error::{PipelineError, Result};
use crate::locator::ModuleLocator;
use crate::results::{ResultId, ResultStore};
use crate::scanner::{ScannerBackend, ScannerInvoker};
use crate::storage::StorageRoots;

/// One uploaded archive as received from the transport.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Successful outcome of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub result_id: ResultId,
    pub work_id: Uuid,
    pub module_dir: PathBuf,
    pub extraction: ExtractionSummary,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Reduce a client supplied name to its final path component.
///
/// Both separators are honoured since browsers on Windows may send full
/// paths. Returns `None` for names with nothing usable left.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match last {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// Directory searched first inside the extracted tree: the archive's base
/// name without its extension (`project.zip` -> `project`).
fn archive_stem(file_name: &str) -> Option<&str> {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct ScanPipeline {
    storage: StorageRoots,
    locator: ModuleLocator,
    invoker: ScannerInvoker,
    results: ResultStore,
}

impl ScanPipeline {
    pub fn new(storage: StorageRoots, backend: Arc<dyn ScannerBackend>) -> Self {
        let invoker = ScannerInvoker::new(backend, storage.result_root());
        let results = ResultStore::new(storage.result_root());
        Self {
            storage,
            locator: ModuleLocator::default(),
            invoker,
            results,
        }
    }

    pub fn storage(&self) -> &StorageRoots {
        &self.storage
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    #[instrument(skip_all, fields(file_name = %upload.file_name, bytes = upload.bytes.len()))]
    pub async fn submit(&self, upload: Upload) -> Result<ScanReport> {
        let file_name = sanitize_file_name(&upload.file_name).ok_or_else(|| {
            PipelineError::InvalidUpload(format!(
                "unusable file name {:?}",
                upload.file_name
            ))
        })?;

        self.storage.ensure().await?;
        let area = self.storage.allocate_working_area().await?;
        let work_id = area.id();

        let archive_path = area.archive_path(&file_name);
        tokio::fs::write(&archive_path, &upload.bytes).await?;
        info!(%work_id, path = %archive_path.display(), "upload persisted");

        let extract_dir = area.extract_dir();
        let extraction = extract_archive(archive_path.clone(), extract_dir.clone()).await?;

        let module_dir = self.find_modules(&file_name, extract_dir).await?;

        let result_id = self.invoker.invoke(&module_dir).await?;
        let bytes = self.results.read(&result_id).await?;

        info!(%work_id, %result_id, bytes = bytes.len(), "scan pipeline finished");
        Ok(ScanReport {
            result_id,
            work_id,
            module_dir,
            extraction,
            bytes,
        })
    }
}

impl ScanPipeline {
    /// Search `extracted/<stem>` first, then the whole extracted tree. A stem
    /// directory that is itself the module directory is returned as is.
    async fn find_modules(&self, file_name: &str, extract_dir: PathBuf) -> Result<PathBuf> {
        if let Some(stem) = archive_stem(file_name) {
            let stem_dir = extract_dir.join(stem);
            if is_dir(&stem_dir).await {
                if stem == self.locator.marker() {
                    return Ok(stem_dir);
                }
                if let Some(found) = self.locator.locate_async(stem_dir).await {
                    return Ok(found);
                }
            }
        }

        debug!(path = %extract_dir.display(), "searching whole extracted tree");
        self.locator
            .locate_async(extract_dir.clone())
            .await
            .ok_or(PipelineError::LocatorNotFound {
                searched: extract_dir,
            })
    }
}
