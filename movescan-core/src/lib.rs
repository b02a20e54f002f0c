//! # Movescan Core
//!
//! Library behind the movescan upload service: it turns an uploaded archive
//! of compiled bytecode modules into a JSON report produced by an external
//! static analyzer, and keeps the on-disk pools from growing without bound.
//!
//! ## Overview
//!
//! - **Storage**: the two shared pools (working areas and results) as an
//!   injected [`StorageRoots`] value
//! - **Archive extraction**: zip unpacking that refuses entries escaping the
//!   destination
//! - **Module location**: depth-first search for the `bytecode_modules`
//!   directory
//! - **Scanning**: the [`ScannerBackend`] seam with a subprocess
//!   implementation bounded by a timeout
//! - **Results**: random [`ResultId`]s and the flat [`ResultStore`]
//! - **Retention**: a cancellable background sweep aligned to wall-clock
//!   period boundaries
//!
//! ## Example
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//! use movescan_core::{ProcessScanner, ScanPipeline, StorageRoots, Upload};
//!
//! # async fn run() -> movescan_core::Result<()> {
//! let scanner = ProcessScanner::new("./MoveScanner", Duration::from_secs(600));
//! let pipeline = ScanPipeline::new(StorageRoots::under("."), Arc::new(scanner));
//!
//! let bytes = std::fs::read("project.zip")?;
//! let report = pipeline.submit(Upload::new("project.zip", bytes)).await?;
//! println!("{} -> {} bytes", report.result_id, report.bytes.len());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod error;
pub mod locator;
pub mod pipeline;
pub mod results;
pub mod retention;
pub mod scanner;
pub mod storage;

pub use error::{PipelineError, Result};
pub use locator::{BYTECODE_DIR_NAME, ModuleLocator};
pub use pipeline::{ScanPipeline, ScanReport, Upload};
pub use results::{ResultId, ResultStore};
pub use retention::{
    DEFAULT_RETENTION_PERIOD, RetentionHandle, RetentionScheduler, RetentionState,
    RetentionStatus, SweepReport,
};
pub use scanner::{
    ProcessScanner, ScanOutput, ScannerBackend, ScannerInvoker, platform_default_binary,
};
pub use storage::{StorageRoots, WorkingArea};
