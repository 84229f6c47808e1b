//! Custom error types for gscholar-metrics.
//!
//! All library functions return `Result<T, ScholarError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for scraping and export operations.
#[derive(Debug, Error)]
pub enum ScholarError {
    /// Browser automation error (launch, navigation, script evaluation)
    #[error("Browser error: {0}")]
    Browser(String),

    /// HTML parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// CAPTCHA or "unusual traffic" page served instead of content
    #[error("CAPTCHA detected at {0}")]
    Captcha(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet (xlsx/xls/ods) read error
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<chromiumoxide::error::CdpError> for ScholarError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        ScholarError::Browser(err.to_string())
    }
}

impl From<calamine::Error> for ScholarError {
    fn from(err: calamine::Error) -> Self {
        ScholarError::Spreadsheet(err.to_string())
    }
}

/// Result type alias using `ScholarError`
pub type Result<T> = std::result::Result<T, ScholarError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| ScholarError::Parse(msg.to_string()))
    }
}
