use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub storage: FileStorageConfig,
    #[serde(default)]
    pub scanner: FileScannerConfig,
    #[serde(default)]
    pub retention: FileRetentionConfig,
    #[serde(default)]
    pub logging: FileLoggingConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileStorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileScannerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<PathBuf>,
    /// Humantime string, e.g. `"10m"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileRetentionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileLoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub max_upload_bytes: Option<usize>,
    pub storage_root: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub result_dir: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub scanner_binary: Option<PathBuf>,
    pub scanner_timeout: Option<String>,
    pub retention_enabled: Option<bool>,
    pub retention_period: Option<String>,
    pub log_file: Option<PathBuf>,
    /// Variables that were set but could not be parsed, with their raw value.
    pub rejected: Vec<(&'static str, String)>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source instead of the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let path = |name: &str| text(name).map(PathBuf::from);

        let mut rejected = Vec::new();
        let server_port = parse_var("SERVER_PORT", text("SERVER_PORT"), &mut rejected, |s| {
            s.parse::<u16>().ok()
        });
        let max_upload_bytes =
            parse_var("MAX_UPLOAD_BYTES", text("MAX_UPLOAD_BYTES"), &mut rejected, |s| {
                s.parse::<usize>().ok()
            });
        let retention_enabled = parse_var(
            "RETENTION_ENABLED",
            text("RETENTION_ENABLED"),
            &mut rejected,
            parse_bool,
        );

        Self {
            config_path: path("MOVESCAN_CONFIG"),
            server_host: text("SERVER_HOST"),
            server_port,
            max_upload_bytes,
            storage_root: path("STORAGE_ROOT"),
            work_dir: path("WORK_DIR"),
            result_dir: path("RESULT_DIR"),
            templates_dir: path("TEMPLATES_DIR"),
            scanner_binary: path("SCANNER_BINARY"),
            scanner_timeout: text("SCANNER_TIMEOUT"),
            retention_enabled,
            retention_period: text("RETENTION_PERIOD"),
            log_file: path("LOG_FILE"),
            rejected,
        }
    }
}

fn parse_var<T>(
    name: &'static str,
    raw: Option<String>,
    rejected: &mut Vec<(&'static str, String)>,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = raw?;
    let value = parse(raw.trim());
    if value.is_none() {
        rejected.push((name, raw));
    }
    value
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
