//! # Data Detective Web
//!
//! Single-page marketing performance report. Every request to `/` reloads the
//! campaign CSV, recomputes the platform aggregates, renders both charts and
//! serves them embedded in one HTML document.
//!
//! ## Routes
//!
//! - `GET /` report page with two inline PNG charts
//! - `GET /report.json` aggregates as JSON
//! - `GET /report.md` aggregates as Markdown
//! - `GET /health` liveness probe
//!
//! A missing CSV is shown as plain text with status 200 on `/`, and as a 503
//! JSON error on the report endpoints.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod charts;
pub mod config;
pub mod error;
pub mod page;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
};
use detective_analytics::{AnalyticsReport, MetricEngine};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::{WebError, WebResult};

/// Application state for Axum handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

/// Report page handler
pub async fn report_page(State(state): State<AppState>) -> WebResult<Html<String>> {
    let data_path = state.config.data_path.clone();
    let html = tokio::task::spawn_blocking(move || page::build_report_page(&data_path)).await??;
    Ok(Html(html))
}

/// Aggregates as JSON
pub async fn report_json(State(state): State<AppState>) -> WebResult<Json<AnalyticsReport>> {
    let report = load_report(state.config.data_path.clone()).await?;
    Ok(Json(report))
}

/// Aggregates as Markdown
pub async fn report_markdown(State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    let report = load_report(state.config.data_path.clone()).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        report.to_markdown(),
    ))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    "OK"
}

async fn load_report(data_path: PathBuf) -> WebResult<AnalyticsReport> {
    tokio::task::spawn_blocking(move || MetricEngine::from_source(&data_path)?.generate_report())
        .await?
        .map_err(WebError::for_api)
}

/// Build the Axum router
pub fn build_router(config: Config) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(report_page))
        .route("/report.json", get(report_json))
        .route("/report.md", get(report_markdown))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
