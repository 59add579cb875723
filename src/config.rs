/*!
 * Configuration types for the file sorter
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SorterError};

/// Environment variable naming the bucket for non-numeric filenames
pub const DESTINATION1_ENV: &str = "DESTINATION1_BUCKET";
/// Environment variable naming the bucket for numeric filenames
pub const DESTINATION2_ENV: &str = "DESTINATION2_BUCKET";

/// Destination buckets for routed objects
///
/// Both names are required and non-empty; construction fails otherwise, so a
/// `RouterConfig` in hand is always usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RouterSection")]
pub struct RouterConfig {
    destination1: String,
    destination2: String,
}

/// Destination names from one configuration source, either possibly absent
///
/// Sources are layered with [`RouterSection::or`] and validated once at the
/// end with [`RouterSection::into_config`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouterSection {
    #[serde(default)]
    pub destination1: Option<String>,
    #[serde(default)]
    pub destination2: Option<String>,
}

impl RouterSection {
    pub fn new(destination1: Option<String>, destination2: Option<String>) -> Self {
        Self {
            destination1,
            destination2,
        }
    }

    /// Fill names missing (or blank) here from a lower-precedence source
    pub fn or(self, fallback: RouterSection) -> RouterSection {
        RouterSection {
            destination1: present(self.destination1).or(fallback.destination1),
            destination2: present(self.destination2).or(fallback.destination2),
        }
    }

    /// Validate the merged names
    pub fn into_config(self) -> Result<RouterConfig> {
        RouterConfig::from_parts(self.destination1, self.destination2)
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<RouterSection> for RouterConfig {
    type Error = SorterError;

    fn try_from(section: RouterSection) -> Result<Self> {
        section.into_config()
    }
}

impl RouterConfig {
    /// Create a validated configuration
    ///
    /// `destination1` receives non-numeric filenames, `destination2` numeric ones.
    pub fn new(destination1: impl Into<String>, destination2: impl Into<String>) -> Result<Self> {
        Self::from_parts(Some(destination1.into()), Some(destination2.into()))
    }

    /// Build from optional values, reporting the first one that is missing
    pub fn from_parts(destination1: Option<String>, destination2: Option<String>) -> Result<Self> {
        let destination1 = require(destination1, DESTINATION1_ENV)?;
        let destination2 = require(destination2, DESTINATION2_ENV)?;
        Ok(Self {
            destination1,
            destination2,
        })
    }

    /// Load from `DESTINATION1_BUCKET` and `DESTINATION2_BUCKET`
    pub fn from_env() -> Result<Self> {
        Self::from_parts(
            std::env::var(DESTINATION1_ENV).ok(),
            std::env::var(DESTINATION2_ENV).ok(),
        )
    }

    /// Bucket for non-numeric filenames
    pub fn destination1(&self) -> &str {
        &self.destination1
    }

    /// Bucket for numeric filenames
    pub fn destination2(&self) -> &str {
        &self.destination2
    }
}

fn require(value: Option<String>, name: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(SorterError::ConfigurationMissing {
            name: name.to_string(),
        }),
    }
}

/// Object store connection settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// AWS region (falls back to the default provider chain)
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint URL (for S3-compatible services like MinIO)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Path-style addressing (required for some S3-compatible services)
    #[serde(default)]
    pub force_path_style: bool,

    /// Per-operation timeout in seconds
    ///
    /// Unset (or 0) leaves calls bounded only by the invocation environment.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl StoreConfig {
    /// Apply `SORTER_S3_*` overrides from the environment
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(region) = std::env::var("SORTER_S3_REGION") {
            self.region = Some(region);
        }
        if let Ok(endpoint) = std::env::var("SORTER_S3_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Ok(flag) = std::env::var("SORTER_S3_FORCE_PATH_STYLE") {
            self.force_path_style = parse_bool(&flag).ok_or_else(|| {
                SorterError::InvalidConfig(format!(
                    "SORTER_S3_FORCE_PATH_STYLE must be true or false, got {:?}",
                    flag
                ))
            })?;
        }
        if let Ok(secs) = std::env::var("SORTER_S3_TIMEOUT_SECS") {
            self.timeout_seconds = Some(secs.parse().map_err(|_| {
                SorterError::InvalidConfig(format!(
                    "SORTER_S3_TIMEOUT_SECS must be a number of seconds, got {:?}",
                    secs
                ))
            })?);
        }
        Ok(self)
    }

    /// Operation timeout to install on the store client, if any
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.timeout_seconds
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(SorterError::InvalidConfig(format!(
                    "endpoint must be an http(s) URL, got {}",
                    endpoint
                )));
            }
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Log level setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,

    /// Emit JSON lines instead of the compact human format
    #[serde(default)]
    pub json: bool,

    /// Log file path (None = stderr)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// On-disk configuration file
///
/// ```toml
/// [router]
/// destination1 = "sorted-other"
/// destination2 = "sorted-numeric"
///
/// [store]
/// region = "eu-west-1"
///
/// [logging]
/// level = "debug"
/// json = true
/// ```
///
/// Every section is optional, and `[router]` may name only one bucket. The
/// file is the lowest-precedence source, so names are validated only after
/// flags and environment are layered over it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub router: RouterSection,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LogConfig,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SorterError::InvalidConfig(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| SorterError::InvalidConfig(e.message().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_new_accepts_both_names() {
        let config = RouterConfig::new("other", "numeric").unwrap();
        assert_eq!(config.destination1(), "other");
        assert_eq!(config.destination2(), "numeric");
    }

    #[test]
    fn test_missing_destination1() {
        let err = RouterConfig::from_parts(None, Some("numeric".to_string())).unwrap_err();
        match err {
            SorterError::ConfigurationMissing { name } => assert_eq!(name, DESTINATION1_ENV),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_destination2_is_missing() {
        let err = RouterConfig::new("other", "  ").unwrap_err();
        match err {
            SorterError::ConfigurationMissing { name } => assert_eq!(name, DESTINATION2_ENV),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_section_layering_fills_gaps() {
        let flags = RouterSection::new(Some("flag-other".to_string()), None);
        let file = RouterSection::new(
            Some("file-other".to_string()),
            Some("file-numeric".to_string()),
        );

        let config = flags.or(file).into_config().unwrap();
        assert_eq!(config.destination1(), "flag-other");
        assert_eq!(config.destination2(), "file-numeric");
    }

    #[test]
    fn test_section_blank_value_falls_through() {
        let flags = RouterSection::new(Some(" ".to_string()), Some("numeric".to_string()));
        let file = RouterSection::new(Some("file-other".to_string()), None);

        let config = flags.or(file).into_config().unwrap();
        assert_eq!(config.destination1(), "file-other");
    }

    #[test]
    fn test_store_config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.timeout_seconds, None);
        assert_eq!(config.operation_timeout(), None);
        assert!(!config.force_path_style);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_operation_timeout() {
        let config = StoreConfig {
            timeout_seconds: Some(120),
            ..Default::default()
        };
        assert_eq!(config.operation_timeout(), Some(Duration::from_secs(120)));

        let config = StoreConfig {
            timeout_seconds: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.operation_timeout(), None);
    }

    #[test]
    fn test_store_config_rejects_bad_endpoint() {
        let config = StoreConfig {
            endpoint: Some("localhost:4566".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Info.to_tracing_level(), tracing::Level::INFO);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }

    #[test]
    fn test_file_config_full() {
        let config = FileConfig::from_toml(
            r#"
            [router]
            destination1 = "sorted-other"
            destination2 = "sorted-numeric"

            [store]
            endpoint = "http://localhost:4566"
            force_path_style = true

            [logging]
            level = "debug"
            json = true
            "#,
        )
        .unwrap();

        let router = config.router.into_config().unwrap();
        assert_eq!(router.destination1(), "sorted-other");
        assert_eq!(router.destination2(), "sorted-numeric");
        assert_eq!(config.store.endpoint.as_deref(), Some("http://localhost:4566"));
        assert!(config.store.force_path_style);
        assert_eq!(config.store.timeout_seconds, None);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.logging.json);
    }

    #[test]
    fn test_file_config_empty() {
        let config = FileConfig::from_toml("").unwrap();
        assert_eq!(config.router, RouterSection::default());
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.logging, LogConfig::default());
    }

    #[test]
    fn test_file_config_partial_router_section() {
        let config = FileConfig::from_toml(
            r#"
            [router]
            destination1 = "sorted-other"
            "#,
        )
        .unwrap();
        assert_eq!(config.router.destination1.as_deref(), Some("sorted-other"));
        assert_eq!(config.router.destination2, None);

        match config.router.into_config().unwrap_err() {
            SorterError::ConfigurationMissing { name } => assert_eq!(name, DESTINATION2_ENV),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_file_config_timeout() {
        let config = FileConfig::from_toml("[store]\ntimeout_seconds = 90\n").unwrap();
        assert_eq!(config.store.operation_timeout(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_file_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[router]").unwrap();
        writeln!(file, "destination1 = \"a\"").unwrap();
        writeln!(file, "destination2 = \"b\"").unwrap();

        let config = FileConfig::from_file(file.path()).unwrap();
        assert_eq!(config.router.into_config().unwrap().destination2(), "b");
    }

    #[test]
    fn test_file_config_missing_file() {
        let err = FileConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, SorterError::InvalidConfig(_)));
    }
}
