use std::{fmt, sync::Arc};

use movescan_core::{ProcessScanner, ResultStore, ScanPipeline, ScannerBackend};

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<ScanPipeline>,
}

impl AppState {
    /// State backed by the configured scanner executable.
    pub fn from_config(config: Arc<Config>) -> Self {
        let scanner = ProcessScanner::new(&config.scanner.binary, config.scanner.timeout);
        Self::with_backend(config, Arc::new(scanner))
    }

    pub fn with_backend(config: Arc<Config>, backend: Arc<dyn ScannerBackend>) -> Self {
        let pipeline = ScanPipeline::new(config.storage_roots(), backend);
        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn results(&self) -> &ResultStore {
        self.pipeline.results()
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
