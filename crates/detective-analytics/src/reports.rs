//! Report generation for campaign aggregates.

use crate::engine::MetricEngine;
use crate::error::Result;
use detective_domain::{PlatformEfficiency, PlatformTotals};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Both platform aggregates for one pass over the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    /// RFC 3339 generation time
    pub generated_at: String,
    /// Rows that went into the aggregates
    pub record_count: usize,
    /// Mean cost per conversion, cheapest platform first
    pub cost_per_conversion: Vec<PlatformEfficiency>,
    /// Spend and conversion totals, ordered by platform
    pub platform_totals: Vec<PlatformTotals>,
}

impl MetricEngine {
    /// Generate the full analytics report.
    pub fn generate_report(&self) -> Result<AnalyticsReport> {
        Ok(AnalyticsReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            record_count: self.record_count(),
            cost_per_conversion: self.mean_efficiency_by_key()?,
            platform_totals: self.totals_by_key()?,
        })
    }

    /// Generate report as JSON string.
    pub fn generate_report_json(&self) -> Result<String> {
        let report = self.generate_report()?;
        serde_json::to_string_pretty(&report)
            .map_err(|e| crate::error::AnalyticsError::Conversion(e.to_string()))
    }

    /// Generate Markdown report.
    pub fn generate_report_markdown(&self) -> Result<String> {
        let report = self.generate_report()?;
        Ok(report.to_markdown())
    }
}

impl AnalyticsReport {
    /// Render the report as Markdown tables.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("# Marketing Performance Report\n\n");
        let _ = writeln!(md, "**Generated:** {}\n", self.generated_at);
        let _ = writeln!(md, "**Campaigns analysed:** {}\n", self.record_count);

        if !self.cost_per_conversion.is_empty() {
            md.push_str("## Average Cost Per Conversion\n\n");
            md.push_str("| Rank | Platform | Avg CPC |\n");
            md.push_str("|------|----------|---------|\n");
            for (i, row) in self.cost_per_conversion.iter().enumerate() {
                let _ = writeln!(
                    md,
                    "| {} | {} | ₹{:.0} |",
                    i + 1,
                    row.platform,
                    row.avg_cost_per_conversion
                );
            }
            md.push('\n');
        }

        if !self.platform_totals.is_empty() {
            md.push_str("## Spend vs Conversions\n\n");
            md.push_str("| Platform | Total Ad Spend | Total Conversions |\n");
            md.push_str("|----------|----------------|-------------------|\n");
            for row in &self.platform_totals {
                let _ = writeln!(
                    md,
                    "| {} | ₹{:.0} | {} |",
                    row.platform, row.total_ad_spend, row.total_conversions
                );
            }
            md.push('\n');
        }

        md
    }
}
