use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Terminal failure of a single pipeline stage.
///
/// Every stage of a scan run maps its failure onto exactly one of these
/// variants; the orchestrator never retries and surfaces the first one it
/// sees.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Extraction failed for {archive}: {reason}")]
    Extraction { archive: PathBuf, reason: String },

    #[error("No bytecode_modules directory found under {searched}")]
    LocatorNotFound { searched: PathBuf },

    #[error("Scanner execution failed: {reason}")]
    ScanExecution { reason: String, output: String },

    #[error("Scanner did not finish within {timeout:?}")]
    ScanTimeout { timeout: Duration },

    #[error("Result not found: {0}")]
    ResultNotFound(String),

    #[error("Invalid result identifier: {0}")]
    InvalidResultId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn extraction(
        archive: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Extraction {
            archive: archive.into(),
            reason: reason.into(),
        }
    }

    /// Stable, machine readable name for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUpload(_) => "invalid_upload",
            Self::Extraction { .. } => "extraction",
            Self::LocatorNotFound { .. } => "locator_not_found",
            Self::ScanExecution { .. } => "scan_execution",
            Self::ScanTimeout { .. } => "scan_timeout",
            Self::ResultNotFound(_) => "result_not_found",
            Self::InvalidResultId(_) => "invalid_result_id",
            Self::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
