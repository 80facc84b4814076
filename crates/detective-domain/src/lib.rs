//! # Data Detective - Domain Model
//!
//! Core value types for marketing campaign performance analysis. These types
//! are shared by the analytics engine and the web layer.
//!
//! A campaign row arrives as a [`Record`] with its ad spend still formatted
//! for humans (`"₹1,200"`). [`DerivedRecord::derive`] normalizes the spend and
//! attaches the cost per conversion; aggregates are reported per platform as
//! [`PlatformEfficiency`] and [`PlatformTotals`].

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Currency symbol stripped from formatted amounts
pub const CURRENCY_SYMBOL: char = '₹';

/// Thousands separator stripped from formatted amounts
pub const THOUSANDS_SEPARATOR: char = ',';

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A field could not be coerced into its numeric type
    #[error("Cannot parse {field} from '{value}'")]
    Parse { field: &'static str, value: String },
}

impl DomainError {
    pub fn parse(field: &'static str, value: impl Into<String>) -> Self {
        Self::Parse {
            field,
            value: value.into(),
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

// =============================================================================
// NORMALIZATION
// =============================================================================

/// Strip the currency symbol and thousands separators from `raw` and parse
/// what remains as a floating-point amount.
///
/// ```
/// assert_eq!(detective_domain::normalize_amount("₹1,200").unwrap(), 1200.0);
/// ```
pub fn normalize_amount(raw: &str) -> DomainResult<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != CURRENCY_SYMBOL && *c != THOUSANDS_SEPARATOR)
        .collect();
    let cleaned = cleaned.trim();

    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(amount),
        _ => Err(DomainError::parse("amount", raw)),
    }
}

/// Parse a conversion count. Counts are non-negative integers.
pub fn parse_count(raw: &str) -> DomainResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| DomainError::parse("count", raw))
}

/// Cost per conversion with a zero guard: `amount / count`, or `0.0` when
/// nothing converted.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn efficiency_ratio(amount: f64, count: u64) -> f64 {
    if count > 0 {
        amount / count as f64
    } else {
        0.0
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// One campaign row as read from the data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Grouping key (advertising platform)
    pub platform: String,
    /// Ad spend exactly as formatted in the source, e.g. `"₹12,500"`
    pub ad_spend: String,
    pub conversions: u64,
}

impl Record {
    pub fn new(platform: impl Into<String>, ad_spend: impl Into<String>, conversions: u64) -> Self {
        Self {
            platform: platform.into(),
            ad_spend: ad_spend.into(),
            conversions,
        }
    }
}

/// A [`Record`] with normalized spend and its cost per conversion
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    pub platform: String,
    pub ad_spend: f64,
    pub conversions: u64,
    pub cost_per_conversion: f64,
}

impl DerivedRecord {
    /// Normalize the spend of `record` and compute its cost per conversion.
    pub fn derive(record: &Record) -> DomainResult<Self> {
        let ad_spend = normalize_amount(&record.ad_spend)?;
        Ok(Self {
            platform: record.platform.clone(),
            ad_spend,
            conversions: record.conversions,
            cost_per_conversion: efficiency_ratio(ad_spend, record.conversions),
        })
    }
}

// =============================================================================
// AGGREGATES
// =============================================================================

/// Mean cost per conversion for one platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEfficiency {
    pub platform: String,
    pub avg_cost_per_conversion: f64,
}

/// Total spend and conversions for one platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformTotals {
    pub platform: String,
    pub total_ad_spend: f64,
    pub total_conversions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_currency_amount() {
        assert_eq!(normalize_amount("₹1,200").unwrap(), 1200.0);
        assert_eq!(normalize_amount("₹1,25,000.50").unwrap(), 125_000.5);
        assert_eq!(normalize_amount(" 800 ").unwrap(), 800.0);
    }

    #[test]
    fn test_normalize_rejects_non_numeric() {
        assert_eq!(
            normalize_amount("₹12k"),
            Err(DomainError::parse("amount", "₹12k"))
        );
        assert!(normalize_amount("₹").is_err());
        assert!(normalize_amount("").is_err());
        assert!(normalize_amount("inf").is_err());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(" 12 ").unwrap(), 12);
        assert_eq!(parse_count("-3"), Err(DomainError::parse("count", "-3")));
        assert!(parse_count("2.5").is_err());
    }

    #[test]
    fn test_efficiency_ratio_zero_guard() {
        assert_eq!(efficiency_ratio(1000.0, 2), 500.0);
        assert_eq!(efficiency_ratio(500.0, 0), 0.0);
        assert_eq!(efficiency_ratio(0.0, 0), 0.0);
    }

    #[test]
    fn test_derive_record() {
        let derived = DerivedRecord::derive(&Record::new("Google", "₹3,000", 3)).unwrap();
        assert_eq!(derived.platform, "Google");
        assert_eq!(derived.ad_spend, 3000.0);
        assert_eq!(derived.conversions, 3);
        assert_eq!(derived.cost_per_conversion, 1000.0);
    }

    #[test]
    fn test_derive_record_without_conversions() {
        let derived = DerivedRecord::derive(&Record::new("X", "₹500", 0)).unwrap();
        assert_eq!(derived.cost_per_conversion, 0.0);
    }

    #[test]
    fn test_derive_propagates_parse_error() {
        let err = DerivedRecord::derive(&Record::new("Meta", "N/A", 4)).unwrap_err();
        assert!(matches!(err, DomainError::Parse { field: "amount", .. }));
    }
}
