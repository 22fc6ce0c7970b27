// ⚠️ Error taxonomy
// Load failures abort the session; everything else is rendered inline by the dashboard.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// DATA LOAD
// ============================================================================

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("Invoice source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Failed to read invoice source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse invoice source: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invoice source is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Malformed invoice on line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },
}

// ============================================================================
// DATES
// ============================================================================

/// A date column that could not be parsed, naming the record it came from
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {field} '{value}' on invoice {invoice_id} (row {row})")]
pub struct InvalidDateError {
    pub invoice_id: String,
    /// Zero-based position in the loaded table
    pub row: usize,
    pub field: &'static str,
    pub value: String,
}

// ============================================================================
// FORECAST
// ============================================================================

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Not enough history to forecast: {distinct_dates} distinct date(s), need at least 2")]
    InsufficientData { distinct_dates: usize },

    #[error("Forecast fitting failed: {0}")]
    Fitting(String),

    #[error(transparent)]
    InvalidDate(#[from] InvalidDateError),
}
