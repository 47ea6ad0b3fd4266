//! Configuration loading and root folder resolution
//!
//! Two sources feed a running service:
//! 1. **TOML bootstrap file**: listen address, admin token, logging and
//!    aggregation parameters. Read once at startup.
//! 2. **Root folder**: holds `cleancity.db` and the `uploads/` directory.
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `CLEANCITY_ROOT_FOLDER` environment variable
//! 3. `root_folder` in the TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing config file is never fatal: defaults are used and a warning logged.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "CLEANCITY_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "cleancity.db";

/// Upload directory name inside the root folder
pub const UPLOADS_DIR: &str = "uploads";

/// Largest supported hotspot grid precision (decimal places)
pub const MAX_HOTSPOT_PRECISION: u32 = 6;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Root folder (database + uploads)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Token required on admin routes; `None` disables admin auth
    #[serde(default)]
    pub admin_token: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Query limits and hotspot grid precision
#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    /// Leaderboard size when the caller does not ask for one
    #[serde(default = "default_leaderboard_limit")]
    pub leaderboard_limit: usize,

    /// Hotspot bin count when the caller does not ask for one
    #[serde(default = "default_hotspot_limit")]
    pub hotspot_limit: usize,

    /// Decimal places coordinates are rounded to (3 ≈ 100m at the equator)
    #[serde(default = "default_hotspot_precision")]
    pub hotspot_precision: u32,

    /// Recent approved records returned when no limit is given
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    /// Hard cap on any caller-supplied limit
    #[serde(default = "default_max_query_limit")]
    pub max_query_limit: usize,
}

/// Built-in classifier model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Load the model at startup; when false the gateway stays "not ready"
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Category labels in model output order
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_leaderboard_limit() -> usize {
    20
}

fn default_hotspot_limit() -> usize {
    50
}

fn default_hotspot_precision() -> u32 {
    3
}

fn default_recent_limit() -> usize {
    100
}

fn default_max_query_limit() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_categories() -> Vec<String> {
    ["Plastic", "Paper", "Metal", "Organic"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            host: default_host(),
            port: default_port(),
            admin_token: None,
            logging: LoggingConfig::default(),
            aggregation: AggregationConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            leaderboard_limit: default_leaderboard_limit(),
            hotspot_limit: default_hotspot_limit(),
            hotspot_precision: default_hotspot_precision(),
            recent_limit: default_recent_limit(),
            max_query_limit: default_max_query_limit(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            categories: default_categories(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the services cannot run with
    pub fn validate(&self) -> Result<()> {
        let agg = &self.aggregation;
        if agg.hotspot_precision > MAX_HOTSPOT_PRECISION {
            return Err(Error::Config(format!(
                "aggregation.hotspot_precision must be 0..={}, got {}",
                MAX_HOTSPOT_PRECISION, agg.hotspot_precision
            )));
        }
        for (name, value) in [
            ("leaderboard_limit", agg.leaderboard_limit),
            ("hotspot_limit", agg.hotspot_limit),
            ("recent_limit", agg.recent_limit),
            ("max_query_limit", agg.max_query_limit),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("aggregation.{} must be >= 1", name)));
            }
        }
        if self.classifier.enabled && self.classifier.categories.is_empty() {
            return Err(Error::Config(
                "classifier.categories must not be empty when the classifier is enabled".to_string(),
            ));
        }
        if matches!(self.admin_token.as_deref(), Some(t) if t.trim().is_empty()) {
            return Err(Error::Config("admin_token must not be blank".to_string()));
        }
        Ok(())
    }
}

/// Load configuration from an explicit path, or the platform default path
///
/// An explicit path that cannot be read is an error. A missing default file
/// falls back to built-in defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        info!("Loaded config file: {}", path.display());
        return TomlConfig::from_toml_str(&content);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(&path)?;
            info!("Loaded config file: {}", path.display());
            TomlConfig::from_toml_str(&content)
        }
        _ => {
            warn!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// `~/.config/cleancity/config.toml` (platform equivalent elsewhere)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cleancity").join("config.toml"))
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("cleancity"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/cleancity"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("cleancity"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/cleancity"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("cleancity"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\cleancity"))
    } else {
        PathBuf::from("./cleancity_data")
    }
}

/// Resolves the root folder from CLI, environment, config and defaults
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    config_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_config(mut self, config: &TomlConfig) -> Self {
        self.config_value = config.root_folder.clone();
        self
    }

    /// Resolve following the priority order in the module docs
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.config_value {
            return path.clone();
        }

        default_root_folder()
    }
}

/// Creates the root folder layout on first run
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root and upload directories if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            info!("Creating root folder: {}", self.root_folder.display());
        }
        std::fs::create_dir_all(self.uploads_path())?;
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.root_folder.join(UPLOADS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.port, 5780);
        assert_eq!(config.host, "127.0.0.1");
        assert!(config.admin_token.is_none());
        assert_eq!(config.aggregation.leaderboard_limit, 20);
        assert_eq!(config.aggregation.hotspot_limit, 50);
        assert_eq!(config.aggregation.hotspot_precision, 3);
        assert_eq!(config.classifier.categories.len(), 4);
    }

    #[test]
    fn test_partial_sections() {
        let config = TomlConfig::from_toml_str(
            r#"
            port = 6000
            admin_token = "s3cret"

            [aggregation]
            hotspot_precision = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
        assert_eq!(config.aggregation.hotspot_precision, 2);
        assert_eq!(config.aggregation.hotspot_limit, 50);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_precision_out_of_range_rejected() {
        let err = TomlConfig::from_toml_str("[aggregation]\nhotspot_precision = 9\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = TomlConfig::from_toml_str("[aggregation]\nleaderboard_limit = 0\n").unwrap_err();
        assert!(err.to_string().contains("leaderboard_limit"));
    }

    #[test]
    fn test_blank_admin_token_rejected() {
        assert!(TomlConfig::from_toml_str("admin_token = \"  \"\n").is_err());
    }

    #[test]
    fn test_initializer_paths() {
        let init = RootFolderInitializer::new(PathBuf::from("/srv/cc"));
        assert_eq!(init.database_path(), PathBuf::from("/srv/cc/cleancity.db"));
        assert_eq!(init.uploads_path(), PathBuf::from("/srv/cc/uploads"));
    }
}
