//! # Web Error Types
//!
//! Unified error handling for the report server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use detective_analytics::AnalyticsError;
use thiserror::Error;

/// Body served when the campaign CSV cannot be loaded
pub const SOURCE_UNAVAILABLE_MESSAGE: &str =
    "Error: Could not load the data file. Make sure the CSV is in the correct location.";

/// Web-level errors
#[derive(Debug, Error)]
pub enum WebError {
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    /// The campaign CSV is unavailable behind a machine-readable endpoint
    #[error("Data unavailable: {0}")]
    DataUnavailable(#[source] AnalyticsError),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl WebError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // A missing source is reported in the page body, not the status
            Self::Analytics(e) if e.is_source_unavailable() => StatusCode::OK,
            Self::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Analytics(_) | Self::Chart(_) | Self::Image(_) | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get error code for the JSON error body
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Analytics(AnalyticsError::SourceUnavailable { .. }) | Self::DataUnavailable(_) => {
                "SOURCE_UNAVAILABLE"
            }
            Self::Analytics(AnalyticsError::Parse { .. }) => "PARSE_ERROR",
            Self::Analytics(_) => "ANALYTICS_ERROR",
            Self::Chart(_) => "CHART_ERROR",
            Self::Image(_) => "IMAGE_ERROR",
            Self::Task(_) => "INTERNAL_ERROR",
        }
    }

    /// Keep a missing source from being served as page text on JSON and
    /// Markdown endpoints.
    pub fn for_api(err: AnalyticsError) -> Self {
        if err.is_source_unavailable() {
            Self::DataUnavailable(err)
        } else {
            Self::Analytics(err)
        }
    }
}

impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for WebError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        Self::Chart(err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let Self::Analytics(AnalyticsError::SourceUnavailable { path, .. }) = &self {
            tracing::warn!(path = %path.display(), "Campaign data source unavailable");
            return (status, SOURCE_UNAVAILABLE_MESSAGE).into_response();
        }

        tracing::error!(error = %self, code = self.error_code(), "Request failed");
        let body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "code": self.error_code(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Result type alias for web operations
pub type WebResult<T> = Result<T, WebError>;
