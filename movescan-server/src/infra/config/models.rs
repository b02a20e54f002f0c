use std::path::{Path, PathBuf};
use std::time::Duration;

use movescan_core::StorageRoots;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;
pub const DEFAULT_SCANNER_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_TEMPLATES_DIR_NAME: &str = "templates";

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub scanner: ScannerConfig,
    pub retention: RetentionConfig,
    pub logging: LoggingConfig,
    pub metadata: ConfigMetadata,
}

impl Config {
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        self.storage.ensure_directories()
    }

    pub fn normalize_paths(&mut self) -> std::io::Result<()> {
        self.storage.normalize_paths()
    }

    pub fn storage_roots(&self) -> StorageRoots {
        StorageRoots::new(&self.storage.work_dir, &self.storage.result_dir)
    }

    pub fn templates_dir(&self) -> &Path {
        &self.storage.templates_dir
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub work_dir: PathBuf,
    pub result_dir: PathBuf,
    pub templates_dir: PathBuf,
}

impl StorageConfig {
    fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        std::fs::create_dir_all(&self.result_dir)?;
        Ok(())
    }

    fn normalize_paths(&mut self) -> std::io::Result<()> {
        self.work_dir = std::fs::canonicalize(&self.work_dir)?;
        self.result_dir = std::fs::canonicalize(&self.result_dir)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub binary: PathBuf,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RetentionConfig {
    pub enabled: bool,
    pub period: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Append-mode copy of every log line, in addition to stderr.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
