use std::{fs, path::PathBuf, time::Duration};
use thiserror::Error;

use movescan_core::{
    DEFAULT_RETENTION_PERIOD, platform_default_binary,
    storage::{RESULT_DIR_NAME, WORK_DIR_NAME},
};

use super::{
    models::{
        Config, ConfigMetadata, DEFAULT_HOST, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT,
        DEFAULT_SCANNER_TIMEOUT, DEFAULT_TEMPLATES_DIR_NAME, LoggingConfig, RetentionConfig,
        ScannerConfig, ServerConfig, StorageConfig,
    },
    sources::{EnvConfig, FileConfig},
    validation::{self, ConfigWarnings},
};

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] = ["movescan.toml", "config/movescan.toml"];

#[derive(Debug, Default, Clone)]
struct ConfigLoaderOptions {
    config_path: Option<PathBuf>,
    env_file: Option<PathBuf>,
    /// Do not read any `.env` file.
    skip_env_file: bool,
    /// Use these values instead of the process environment.
    env: Option<EnvConfig>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn without_env_file(mut self) -> Self {
        self.options.skip_env_file = true;
        self
    }

    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.options.env = Some(env);
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;

        let env_config = match &self.options.env {
            Some(env) => env.clone(),
            None => EnvConfig::gather(),
        };

        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let (config, warnings) =
            self.compose_config(file_config, env_config, config_path, env_file_loaded)?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        if self.options.skip_env_file {
            return Ok(false);
        }

        let loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };

        match loaded {
            Ok(loaded) => Ok(loaded),
            Err(dotenvy::Error::Io(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env_config.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((None, None)),
            },
        };

        let contents = fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
            path: path.clone(),
            source: err,
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
        config_path: Option<PathBuf>,
        env_file_loaded: bool,
    ) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        if config_path.is_none() {
            warnings.push_with_hint(
                "No movescan.toml detected; using environment variables and defaults",
                "Pass --config or set MOVESCAN_CONFIG to load a configuration file",
            );
        }

        for (name, value) in &env.rejected {
            warnings.push_with_hint(
                format!("Ignoring unparsable {name}={value:?}; falling back to file or default"),
                format!("Fix or unset {name}"),
            );
        }

        let FileConfig {
            server: file_server,
            storage: file_storage,
            scanner: file_scanner,
            retention: file_retention,
            logging: file_logging,
        } = file_config.unwrap_or_default();

        let server = ServerConfig {
            host: env
                .server_host
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: env.server_port.or(file_server.port).unwrap_or(DEFAULT_PORT),
            max_upload_bytes: env
                .max_upload_bytes
                .or(file_server.max_upload_bytes)
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        };

        let root = env
            .storage_root
            .or(file_storage.root)
            .unwrap_or_else(|| PathBuf::from("."));
        let storage = StorageConfig {
            work_dir: env
                .work_dir
                .or(file_storage.work_dir)
                .unwrap_or_else(|| root.join(WORK_DIR_NAME)),
            result_dir: env
                .result_dir
                .or(file_storage.result_dir)
                .unwrap_or_else(|| root.join(RESULT_DIR_NAME)),
            templates_dir: env
                .templates_dir
                .or(file_storage.templates_dir)
                .unwrap_or_else(|| root.join(DEFAULT_TEMPLATES_DIR_NAME)),
            root,
        };

        let scanner = ScannerConfig {
            binary: env
                .scanner_binary
                .or(file_scanner.binary)
                .unwrap_or_else(platform_default_binary),
            timeout: parse_duration_field(
                "scanner.timeout",
                env.scanner_timeout.or(file_scanner.timeout),
                DEFAULT_SCANNER_TIMEOUT,
            )?,
        };

        let retention = RetentionConfig {
            enabled: env
                .retention_enabled
                .or(file_retention.enabled)
                .unwrap_or(true),
            period: parse_duration_field(
                "retention.period",
                env.retention_period.or(file_retention.period),
                DEFAULT_RETENTION_PERIOD,
            )?,
        };

        let logging = LoggingConfig {
            file: env.log_file.or(file_logging.file),
        };

        let metadata = ConfigMetadata {
            config_path,
            env_file_loaded,
        };

        let mut config = Config {
            server,
            storage,
            scanner,
            retention,
            logging,
            metadata,
        };

        config
            .ensure_directories()
            .map_err(|source| ConfigLoadError::Filesystem { source })?;
        config
            .normalize_paths()
            .map_err(|source| ConfigLoadError::Filesystem { source })?;

        warnings.extend(validation::apply_guard_rails(&mut config));

        Ok((config, warnings))
    }
}

fn parse_duration_field(
    field: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    match raw {
        None => Ok(default),
        Some(value) => humantime::parse_duration(value.trim()).map_err(|source| {
            ConfigLoadError::InvalidDuration {
                field,
                value,
                source,
            }
        }),
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid duration '{value}' for {field}")]
    InvalidDuration {
        field: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("storage initialization failed")]
    Filesystem {
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
