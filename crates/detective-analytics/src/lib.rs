//! # Data Detective Analytics
//!
//! Metric engine for marketing campaign performance. Loads campaign rows from
//! a CSV source, derives cost per conversion for every row, and aggregates it
//! by platform using an in-memory DuckDB connection.
//!
//! ## Features
//!
//! - CSV ingest with currency-formatted spend
//! - Mean cost per conversion by platform
//! - Total spend and conversions by platform
//! - JSON and Markdown reports

#![forbid(unsafe_code)]
#![warn(clippy::all, missing_docs)]

pub mod engine;
pub mod error;
pub mod reports;
pub mod source;

pub use engine::MetricEngine;
pub use error::AnalyticsError;
pub use reports::AnalyticsReport;
pub use source::load_records;
