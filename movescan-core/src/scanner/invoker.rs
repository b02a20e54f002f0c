use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::ScannerBackend;
use crate::error::Result;
use crate::results::ResultId;

/// Pairs every scanner run with a freshly generated result identifier.
#[derive(Debug, Clone)]
pub struct ScannerInvoker {
    backend: Arc<dyn ScannerBackend>,
    result_root: PathBuf,
}

impl ScannerInvoker {
    pub fn new(backend: Arc<dyn ScannerBackend>, result_root: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            result_root: result_root.into(),
        }
    }

    /// Scan `module_dir` into `<result-root>/<id>.json` and return `id`.
    ///
    /// On failure nothing is returned and a partially written report is
    /// removed, so a failed run never leaves a readable artifact behind.
    pub async fn invoke(&self, module_dir: &Path) -> Result<ResultId> {
        let id = ResultId::generate();
        let output = self.result_root.join(id.file_name());

        match self.backend.run(module_dir, &output).await {
            Ok(run) => {
                info!(
                    result_id = %id,
                    elapsed_ms = run.elapsed.as_millis() as u64,
                    "scan completed"
                );
                Ok(id)
            }
            Err(err) => {
                discard_partial(&output).await;
                Err(err)
            }
        }
    }
}

async fn discard_partial(output: &Path) {
    match tokio::fs::remove_file(output).await {
        Ok(()) => debug!(path = %output.display(), "removed partial scan output"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            warn!(path = %output.display(), error = %err, "failed to remove partial scan output")
        }
    }
}
