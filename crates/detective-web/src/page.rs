//! Report page assembly.

use crate::charts::{render_cost_per_conversion_chart, render_spend_vs_conversions_chart};
use crate::error::WebResult;
use detective_analytics::MetricEngine;
use std::path::Path;

const TEMPLATE: &str = include_str!("../templates/index.html");

/// Narrative shown above the charts.
///
/// These are written by an analyst against a known dataset and are not
/// recomputed from the aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insights {
    pub title: &'static str,
    pub best_roi: &'static str,
    pub needs_optimization: &'static str,
    pub recommendation: &'static str,
}

impl Default for Insights {
    fn default() -> Self {
        Self {
            title: "Data Detective: Marketing Performance Analysis",
            best_roi: "Google provides the best Return on Investment (ROI) with an average \
                       Cost Per Conversion (CPC) of approximately ₹801.",
            needs_optimization: "Instagram is the platform most in need of optimization, \
                                 driven by campaign CAM-09's extremely high CPC of ₹8,750.",
            recommendation: "My primary recommendation is to re-evaluate the Instagram \
                             strategy, specifically pausing CAM-09, and reallocating that \
                             budget toward our top-performing platform, Google, to maximize \
                             overall conversions.",
        }
    }
}

/// Load the campaign CSV, aggregate it, draw both charts and render the page.
///
/// Runs start to finish on the calling thread.
pub fn build_report_page(data_path: &Path) -> WebResult<String> {
    let engine = MetricEngine::from_source(data_path)?;
    let efficiency = engine.mean_efficiency_by_key()?;
    let totals = engine.totals_by_key()?;

    tracing::info!(
        records = engine.record_count(),
        platforms = totals.len(),
        "Aggregated campaign metrics"
    );

    let chart1 = render_cost_per_conversion_chart(&efficiency)?;
    let chart2 = render_spend_vs_conversions_chart(&totals)?;

    Ok(render_page(
        &Insights::default(),
        &chart1.to_base64(),
        &chart2.to_base64(),
    ))
}

/// Substitute insights and base64 chart payloads into the page template.
pub fn render_page(insights: &Insights, chart1: &str, chart2: &str) -> String {
    TEMPLATE
        .replace("{{title}}", &escape_html(insights.title))
        .replace("{{best_roi}}", &escape_html(insights.best_roi))
        .replace("{{needs_optimization}}", &escape_html(insights.needs_optimization))
        .replace("{{recommendation}}", &escape_html(insights.recommendation))
        .replace("{{chart1}}", chart1)
        .replace("{{chart2}}", chart2)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
