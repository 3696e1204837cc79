/*!
 * Error types for the sheetloc application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Error message from the API
        message: String,
        /// Delay suggested by the provider, if any
        retry_after_secs: Option<u64>,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Every attempt allowed by the retry policy failed
    #[error("Giving up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Description of the last failure
        last_error: String,
    },
}

impl ProviderError {
    /// Whether retrying the same request can reasonably succeed.
    ///
    /// Parse errors are deliberately excluded: an unparsable body is escalated at once.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::RateLimitExceeded { .. } => true,
            Self::ApiError { status_code, .. } => {
                *status_code >= 500 || *status_code == 408 || *status_code == 429
            }
            Self::ParseError(_) | Self::AuthenticationError(_) | Self::RetriesExhausted { .. } => false,
        }
    }

    /// Whether the provider asked us to slow down
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. })
            || matches!(self, Self::ApiError { status_code: 429, .. })
    }
}

/// Errors raised by a tabular store backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying file operation failed
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The requested sheet does not exist
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    /// A required column is missing from a sheet
    #[error("Missing column '{column}' in sheet '{sheet}'")]
    MissingColumn {
        /// Sheet name
        sheet: String,
        /// Column header that was expected
        column: String,
    },

    /// A write addressed a row that is not backed by data
    #[error("Row {row_index} is out of range for sheet '{sheet}'")]
    InvalidRow {
        /// Sheet name
        sheet: String,
        /// Physical row number
        row_index: usize,
    },
}

/// Errors raised while appending to the audit log
#[derive(Error, Debug)]
pub enum AuditError {
    /// Underlying file operation failed
    #[error("Audit log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding failed
    #[error("Audit log CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A status column held an unknown value
    #[error("Unknown audit status: {0}")]
    UnknownStatus(String),
}

/// Errors that abort a whole pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// None of the configured sheets exist in the store
    #[error("No valid sheets to process (configured: {0})")]
    NoValidSheets(String),

    /// The store could not be opened or listed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the tabular store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
