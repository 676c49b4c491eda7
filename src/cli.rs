//! Command-line interface parsing for statusboard
//!
//! This module handles parsing of CLI arguments using clap and validates
//! them into a [`StartupConfig`].

use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use clap::Parser;
use reqwest::Url;
use thiserror::Error;

use crate::clock::{format_date, ClockFace, DisplayVariant, DEFAULT_DATE_FORMAT};

/// Page URL used when none is given
pub const DEFAULT_PAGE_URL: &str = "http://127.0.0.1:5000/";

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The page URL does not parse
    #[error("Invalid page URL '{0}': {1}")]
    InvalidUrl(String, String),

    /// The page URL is not served over HTTP
    #[error("Unsupported page URL '{0}': expected an http:// or https:// URL")]
    UnsupportedScheme(String),

    /// The date format contains an unknown specifier
    #[error("Invalid date format: '{0}'")]
    InvalidDateFormat(String),
}

/// statusboard - clock, weather and departures for an e-ink style display
#[derive(Parser, Debug)]
#[command(name = "statusboard")]
#[command(about = "E-ink style status display: clock, weather and transit departures")]
#[command(version)]
pub struct Cli {
    /// URL of the status page
    ///
    /// The JSON endpoints are read from this URL's origin, and its query
    /// string is passed on to the departures endpoint unchanged.
    ///
    /// Examples:
    ///   statusboard http://board.local:5000/
    ///   statusboard "http://board.local:5000/?station=Garching"
    #[arg(value_name = "URL", default_value = DEFAULT_PAGE_URL)]
    pub url: String,

    /// Clock presentation: plain for e-ink panels, or a blinking separator
    #[arg(long, value_enum, default_value_t = DisplayVariant::Eink)]
    pub variant: DisplayVariant,

    /// Run the refresh loops without the terminal view and log to stderr
    #[arg(long)]
    pub headless: bool,

    /// Append logs to this file while the terminal view is shown
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// chrono format string for the date next to the time
    #[arg(long, value_name = "FORMAT", default_value = DEFAULT_DATE_FORMAT)]
    pub date_format: String,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Page the dashboard belongs to
    pub page_url: Url,
    /// Clock presentation
    pub face: ClockFace,
    /// Whether to skip the terminal view
    pub headless: bool,
    /// Explicit log file, if any
    pub log_file: Option<PathBuf>,
}

/// Parses the page URL argument.
///
/// # Returns
/// * `Ok(Url)` for an absolute http(s) URL
/// * `Err(CliError)` otherwise
pub fn parse_page_url(s: &str) -> Result<Url, CliError> {
    let url = Url::parse(s).map_err(|e| CliError::InvalidUrl(s.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(CliError::UnsupportedScheme(s.to_string())),
    }
}

/// Checks that a chrono format string only uses known specifiers and can
/// be applied to a local wall time (no zone specifiers)
pub fn validate_date_format(s: &str) -> Result<(), CliError> {
    let invalid = || CliError::InvalidDateFormat(s.to_string());
    if StrftimeItems::new(s).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }
    let sample = NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(invalid)?;
    format_date(sample, s).map(|_| ()).ok_or_else(invalid)
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if the URL or the date format is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let page_url = parse_page_url(&cli.url)?;
        validate_date_format(&cli.date_format)?;

        Ok(StartupConfig {
            page_url,
            face: ClockFace {
                variant: cli.variant,
                date_format: cli.date_format.clone(),
            },
            headless: cli.headless,
            log_file: cli.log_file.clone(),
        })
    }
}
