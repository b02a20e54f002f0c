use super::models::{Config, DEFAULT_SCANNER_TIMEOUT};
use movescan_core::DEFAULT_RETENTION_PERIOD;

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.items.iter().any(|w| w.message.contains(needle))
    }
}

/// Clamp unusable values back to defaults and flag setups that will start
/// but cannot scan or will never reclaim disk.
pub fn apply_guard_rails(config: &mut Config) -> ConfigWarnings {
    let mut warnings = ConfigWarnings::default();

    if config.scanner.timeout.is_zero() {
        config.scanner.timeout = DEFAULT_SCANNER_TIMEOUT;
        warnings.push_with_hint(
            "Scanner timeout of zero clamped to the default",
            "Set SCANNER_TIMEOUT or [scanner] timeout to a positive duration such as \"10m\"",
        );
    }

    if config.retention.period.is_zero() {
        config.retention.period = DEFAULT_RETENTION_PERIOD;
        warnings.push_with_hint(
            "Retention period of zero clamped to the default",
            "Set RETENTION_PERIOD or [retention] period to a positive duration such as \"1h\"",
        );
    }

    if !config.scanner.binary.is_file() {
        warnings.push_with_hint(
            format!(
                "Scanner binary {} not found; uploads will fail until it is installed",
                config.scanner.binary.display()
            ),
            "Set SCANNER_BINARY or [scanner] binary to the analyzer executable",
        );
    }

    if !config.retention.enabled {
        warnings.push_with_hint(
            "Retention sweep disabled; working areas and results are never reclaimed",
            "Set RETENTION_ENABLED=true unless disk usage is managed externally",
        );
    }

    if !config.storage.templates_dir.is_dir() {
        warnings.push(format!(
            "Templates directory {} does not exist; the index will list no templates",
            config.storage.templates_dir.display()
        ));
    }

    warnings
}
