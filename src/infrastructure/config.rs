//! Configuration infrastructure
//!
//! Contains configuration loading and management for the admissions crawler.
//!
//! The process takes no arguments. Everything tunable lives in an optional
//! JSON file in the user config directory; a missing or unreadable file falls
//! back to the defaults below.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Discovery and scheduling settings
    pub crawler: CrawlerConfig,

    /// HTTP transport settings
    pub http: HttpConfig,

    /// Column positions of the ranking table
    pub columns: ColumnLayout,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Discovery and scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Page listing every competition
    pub landing_url: String,

    /// Exact anchor text of general-admission competitions
    pub anchor_text: String,

    /// Required study form label (compared case-insensitively)
    pub form_label: String,

    /// Required education level label (compared case-insensitively)
    pub level_label: String,

    /// Root folder; each run writes into a `DDMMYYYY-HHMM` subfolder
    pub output_root: PathBuf,

    /// Maximum number of competition pages fetched at the same time
    pub max_concurrent_fetches: usize,

    /// Optional bound on the whole run; outstanding fetches are cancelled when it elapses
    pub run_timeout_seconds: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            landing_url: timacad::LANDING_PAGE.to_string(),
            anchor_text: timacad::GENERAL_ADMISSION_ANCHOR.to_string(),
            form_label: timacad::FULL_TIME_FORM_LABEL.to_string(),
            level_label: timacad::MASTERS_LEVEL_LABEL.to_string(),
            output_root: PathBuf::from(defaults::OUTPUT_ROOT),
            max_concurrent_fetches: defaults::MAX_CONCURRENT_FETCHES,
            run_timeout_seconds: None,
        }
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub request_timeout_seconds: u64,

    /// User agent string
    pub user_agent: String,

    /// Whether to follow redirects
    pub follow_redirects: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            user_agent: defaults::USER_AGENT.to_string(),
            follow_redirects: true,
        }
    }
}

/// Zero-based cell indices of the ranking table.
///
/// These mirror the layout of the published tables and are not derived from
/// the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub identifier: usize,
    pub total_score: usize,
    pub bonus_score: usize,
    pub document_status: usize,
    pub priority: usize,
}

impl ColumnLayout {
    /// Number of cells a row needs to satisfy every index
    pub fn required_cells(&self) -> usize {
        [
            self.identifier,
            self.total_score,
            self.bonus_score,
            self.document_status,
            self.priority,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            identifier: 1,
            total_score: 2,
            bonus_score: 5,
            document_status: 6,
            priority: 7,
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log file name inside the log directory
    pub file_name: String,

    /// Module-specific log level filters (e.g., "reqwest": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: true,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            module_filters: HashMap::new(),
        }
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    /// No configuration file exists
    Defaults,
    /// The file exists but could not be read or parsed
    Fallback(String),
}

impl ConfigSource {
    pub fn report(&self, path: &Path) {
        match self {
            Self::File => info!("Loaded configuration from: {:?}", path),
            Self::Defaults => info!("Configuration file not found, using defaults: {:?}", path),
            Self::Fallback(reason) => {
                warn!("⚠️  Failed to load configuration {:?}: {}", path, reason);
                warn!("⚠️  Falling back to default configuration");
            }
        }
    }
}

/// Loads and stores [`AppConfig`] as JSON
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Create a configuration manager pointing at the default config file
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    /// Create a configuration manager for an explicit file
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from file, using defaults if it doesn't exist or can't be parsed.
    ///
    /// Nothing is logged here since this usually runs before logging is
    /// installed; report the returned [`ConfigSource`] afterwards.
    pub async fn load_config(&self) -> (AppConfig, ConfigSource) {
        if !self.config_path.exists() {
            return (AppConfig::default(), ConfigSource::Defaults);
        }

        match self.read_config().await {
            Ok(config) => (config, ConfigSource::File),
            Err(e) => (AppConfig::default(), ConfigSource::Fallback(format!("{e:#}"))),
        }
    }

    async fn read_config(&self) -> Result<AppConfig> {
        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        serde_json::from_str::<AppConfig>(&content).context("Failed to parse configuration file")
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .with_context(|| format!("Failed to write configuration: {:?}", self.config_path))?;

        info!("Configuration saved to: {:?}", self.config_path);
        Ok(())
    }
}

/// Site specific constants of the admissions portal
pub mod timacad {
    /// Landing page with the full competition tree
    pub const LANDING_PAGE: &str = "https://www.timacad.ru/incoming/spiski-lits-podavshikh-dokumenty";

    /// Anchor text of general-admission competition links
    pub const GENERAL_ADMISSION_ANCHOR: &str = "на общих основаниях";

    /// Label of the full-time study form card
    pub const FULL_TIME_FORM_LABEL: &str = "очная форма обучения";

    /// Label of the master's level card
    pub const MASTERS_LEVEL_LABEL: &str = "магистратура";

    /// Class of the card containers forming the category tree
    pub const CARD_BODY_CLASS: &str = "card-body";

    /// Class of the ranking table header row
    pub const HEADER_ROW_CLASS: &str = "R13";

    /// Class of ranking table applicant rows
    pub const APPLICANT_ROW_CLASS: &str = "R0";

    /// Eligibility markers, matched against lower-cased page text
    pub mod markers {
        pub const MASTERS: &str = "уровень подготовки - магистратура";
        pub const FULL_TIME: &str = "форма обучения - очная";
        pub const BUDGET: &str = "основание поступления - бюджетная основа";
    }
}

/// Default values
pub mod defaults {
    /// Default maximum concurrent competition fetches
    pub const MAX_CONCURRENT_FETCHES: usize = 3;

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default user agent
    pub const USER_AGENT: &str = "timacad-crawler/0.1";

    /// Default output root, relative to the working directory
    pub const OUTPUT_ROOT: &str = "timacad_downloads";

    /// Session folder name format (local time)
    pub const SESSION_FOLDER_FORMAT: &str = "%d%m%Y-%H%M";

    /// Directory name under the user config directory
    pub const APP_DIR_NAME: &str = "timacad-crawler";

    /// Configuration file name
    pub const CONFIG_FILE_NAME: &str = "timacad_crawler_config.json";

    /// Log file name
    pub const LOG_FILE_NAME: &str = "crawler.log";
}
