use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

/// What an extraction wrote to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    pub files: usize,
    pub directories: usize,
}

/// Expand a zip archive into `dest`, preserving relative entry paths.
///
/// Any entry whose name would resolve outside `dest` (absolute paths, `..`
/// components) aborts the whole extraction.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<ExtractionSummary> {
    let file = fs::File::open(archive_path).map_err(|e| {
        PipelineError::extraction(archive_path, format!("failed to open archive: {e}"))
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        PipelineError::extraction(archive_path, format!("invalid or corrupt zip: {e}"))
    })?;

    fs::create_dir_all(dest).map_err(|e| {
        PipelineError::extraction(archive_path, format!("failed to create {}: {e}", dest.display()))
    })?;

    let mut summary = ExtractionSummary::default();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| {
            PipelineError::extraction(archive_path, format!("failed to read entry {index}: {e}"))
        })?;

        let relative: PathBuf = match entry.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => {
                return Err(PipelineError::extraction(
                    archive_path,
                    format!("unsafe entry path: {}", entry.name()),
                ));
            }
        };
        let target = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| write_error(archive_path, &target, e))?;
            summary.directories += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| write_error(archive_path, parent, e))?;
        }
        let mut out = fs::File::create(&target).map_err(|e| write_error(archive_path, &target, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| write_error(archive_path, &target, e))?;
        summary.files += 1;
        debug!(path = %relative.display(), "extracted entry");
    }

    info!(
        archive = %archive_path.display(),
        files = summary.files,
        directories = summary.directories,
        "archive extracted"
    );
    Ok(summary)
}

/// Runs [`extract_zip`] on the blocking pool.
pub async fn extract_archive(archive_path: PathBuf, dest: PathBuf) -> Result<ExtractionSummary> {
    let archive_for_error = archive_path.clone();
    tokio::task::spawn_blocking(move || extract_zip(&archive_path, &dest))
        .await
        .map_err(|e| {
            PipelineError::extraction(archive_for_error, format!("extraction task failed: {e}"))
        })?
}

fn write_error(archive: &Path, target: &Path, err: io::Error) -> PipelineError {
    PipelineError::extraction(archive, format!("failed to write {}: {err}", target.display()))
}
