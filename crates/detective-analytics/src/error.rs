//! Analytics error types.

use detective_domain::DomainError;
use std::path::PathBuf;
use thiserror::Error;

/// Analytics errors.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// The CSV source is missing or cannot be read
    #[error("Data source unavailable: {}", path.display())]
    SourceUnavailable {
        /// Path that was tried
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// A field failed numeric coercion
    #[error("Parse error at row {row}: {source}")]
    Parse {
        /// 1-based data row (header excluded)
        row: usize,
        /// Domain-level cause
        #[source]
        source: DomainError,
    },

    /// DuckDB error
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Data conversion error
    #[error("Data conversion error: {0}")]
    Conversion(String),
}

impl AnalyticsError {
    /// Whether this error means the source could not be opened at all.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
