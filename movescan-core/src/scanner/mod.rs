//! Invocation of the external static analyzer.
//!
//! The analyzer is treated as an opaque capability: given a directory of
//! compiled modules and an output path, it writes a JSON report to that path.
//! [`ScannerBackend`] captures that contract so the pipeline can be driven by
//! the real subprocess ([`ProcessScanner`]) or by an in-process fake.

mod invoker;
mod process;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use invoker::ScannerInvoker;
pub use process::{ProcessScanner, platform_default_binary};

/// Diagnostics from one successful scanner run. Never parsed.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    /// Combined stdout and stderr.
    pub diagnostics: String,
    pub elapsed: Duration,
}

/// Runs the analyzer over `input`, writing its report to `output`.
#[async_trait]
pub trait ScannerBackend: Send + Sync + std::fmt::Debug {
    async fn run(&self, input: &Path, output: &Path) -> Result<ScanOutput>;
}
