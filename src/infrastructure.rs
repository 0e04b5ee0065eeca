//! Infrastructure layer for HTTP access, HTML parsing, and persistence
//!
//! This module provides the page fetcher, the landing and competition page
//! parsers, CSV output, configuration and logging.

pub mod config; // Configuration file, site constants and defaults
pub mod csv_sink; // CSV persistence of rankings
pub mod logging; // Logging infrastructure
pub mod parsing; // Landing and competition page parsers
pub mod parsing_error; // Extraction error types
pub mod simple_http_client;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager, ConfigSource, timacad};
pub use csv_sink::{CompetitionSink, CsvSink, SinkError, create_session_folder};
pub use logging::{get_log_directory, init_logging_with_config, log_system_info};
pub use parsing::{CategoryResolver, CompetitionOutcome, CompetitionParser, DiscoveryReport, PageParser};
pub use parsing_error::{ExtractionError, ParsingResult};
pub use simple_http_client::{FetchError, HttpClient, HttpClientConfig, PageFetcher};
