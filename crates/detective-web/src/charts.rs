//! Chart rendering to base64-encoded PNG.
//!
//! Both charts are drawn into an in-memory RGB buffer with plotters, encoded
//! as PNG and base64-encoded for a `data:` URI. Text is rasterized with the
//! DejaVu Sans faces bundled under `assets/`, registered once per process.

use crate::error::{WebError, WebResult};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use detective_domain::{PlatformEfficiency, PlatformTotals};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, register_font};
use std::io::Cursor;
use std::sync::OnceLock;

/// Pixel size of the cost-per-conversion bar chart
pub const COST_CHART_SIZE: (u32, u32) = (1000, 600);

/// Pixel size of the spend-vs-conversions chart
pub const TOTALS_CHART_SIZE: (u32, u32) = (1200, 700);

const FONT: &str = "sans-serif";
const FONT_REGULAR: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
const FONT_BOLD: &[u8] = include_bytes!("../assets/DejaVuSans-Bold.ttf");
const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const TOMATO: RGBColor = RGBColor(255, 99, 71);
const GRID: RGBColor = RGBColor(225, 225, 225);

/// Viridis anchor colors, interpolated per bar.
const VIRIDIS: [RGBColor; 5] = [
    RGBColor(68, 1, 84),
    RGBColor(59, 82, 139),
    RGBColor(33, 145, 140),
    RGBColor(94, 201, 98),
    RGBColor(253, 231, 37),
];

/// A rendered chart
#[derive(Debug, Clone)]
pub struct ChartImage {
    pub png: Vec<u8>,
}

impl ChartImage {
    /// Base64 text of the PNG bytes.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.png)
    }
}

static FONTS: OnceLock<Result<(), String>> = OnceLock::new();

/// Register the bundled faces under [`FONT`]. Safe to call repeatedly.
pub fn register_fonts() -> WebResult<()> {
    FONTS
        .get_or_init(|| {
            register_font(FONT, FontStyle::Normal, FONT_REGULAR)
                .map_err(|_| "bundled regular font is not a valid OpenType file".to_string())?;
            register_font(FONT, FontStyle::Bold, FONT_BOLD)
                .map_err(|_| "bundled bold font is not a valid OpenType file".to_string())?;
            Ok(())
        })
        .clone()
        .map_err(WebError::Chart)
}

/// Bar chart of mean cost per conversion, one bar per platform in the given
/// order, each bar annotated with its value.
pub fn render_cost_per_conversion_chart(data: &[PlatformEfficiency]) -> WebResult<ChartImage> {
    register_fonts()?;
    let (width, height) = COST_CHART_SIZE;
    let mut pixels = vec![0u8; pixel_len(COST_CHART_SIZE)];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let labels: Vec<&str> = data.iter().map(|e| e.platform.as_str()).collect();
        let y_max = axis_ceiling(data.iter().map(|e| e.avg_cost_per_conversion));

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Chart 1: Average Cost Per Conversion (ROI) by Platform",
                (FONT, 28.0).into_font().style(FontStyle::Bold),
            )
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d(
                (0..data.len().saturating_sub(1)).into_segmented(),
                0f64..y_max,
            )?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(GRID)
            .light_line_style(WHITE)
            .x_labels(labels.len().max(1))
            .x_label_formatter(&|v| segment_label(&labels, v))
            .y_label_formatter(&|v: &f64| format!("₹{v:.0}"))
            .x_desc("Platform")
            .y_desc("Average Cost Per Conversion (₹)")
            .axis_desc_style((FONT, 18.0).into_font())
            .draw()?;

        chart.draw_series(data.iter().enumerate().map(|(i, row)| {
            bar(
                i,
                data.len(),
                row.avg_cost_per_conversion,
                viridis(i, data.len()).filled(),
            )
        }))?;

        let annotation = TextStyle::from((FONT, 16.0).into_font().style(FontStyle::Bold))
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        let lift = y_max * 0.015;
        chart.draw_series(data.iter().enumerate().map(|(i, row)| {
            Text::new(
                format!("₹{:.0}", row.avg_cost_per_conversion),
                (SegmentValue::CenterOf(i), row.avg_cost_per_conversion + lift),
                annotation.clone(),
            )
        }))?;

        root.present()?;
    }

    encode_png(pixels, COST_CHART_SIZE)
}

/// Dual-axis chart: total spend as bars on the left axis, total conversions as
/// a marked line on the right axis.
pub fn render_spend_vs_conversions_chart(totals: &[PlatformTotals]) -> WebResult<ChartImage> {
    register_fonts()?;
    let (width, height) = TOTALS_CHART_SIZE;
    let mut pixels = vec![0u8; pixel_len(TOTALS_CHART_SIZE)];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let labels: Vec<&str> = totals.iter().map(|t| t.platform.as_str()).collect();
        let last = totals.len().saturating_sub(1);
        let spend_max = axis_ceiling(totals.iter().map(|t| t.total_ad_spend));
        let conversions_max = axis_ceiling(totals.iter().map(conversions_f64));

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Chart 2: Total Ad Spend vs. Total Conversions by Platform",
                (FONT, 28.0).into_font().style(FontStyle::Bold),
            )
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(100)
            .right_y_label_area_size(80)
            .build_cartesian_2d((0..last).into_segmented(), 0f64..spend_max)?
            .set_secondary_coord((0..last).into_segmented(), 0f64..conversions_max);

        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(GRID)
            .light_line_style(WHITE)
            .x_labels(labels.len().max(1))
            .x_label_formatter(&|v| segment_label(&labels, v))
            .y_label_formatter(&|v: &f64| format!("₹{v:.0}"))
            .y_label_style((FONT, 14.0).into_font().color(&SKY_BLUE))
            .x_desc("Platform")
            .y_desc("Total Ad Spend (₹)")
            .axis_desc_style((FONT, 18.0).into_font().color(&SKY_BLUE))
            .draw()?;

        chart
            .configure_secondary_axes()
            .y_label_formatter(&|v: &f64| format!("{v:.0}"))
            .label_style((FONT, 14.0).into_font().color(&TOMATO))
            .y_desc("Total Conversions")
            .axis_desc_style((FONT, 18.0).into_font().color(&TOMATO))
            .draw()?;

        chart.draw_series(
            totals
                .iter()
                .enumerate()
                .map(|(i, row)| bar(i, totals.len(), row.total_ad_spend, SKY_BLUE.filled())),
        )?;

        let points: Vec<_> = totals
            .iter()
            .enumerate()
            .map(|(i, row)| (SegmentValue::CenterOf(i), conversions_f64(row)))
            .collect();
        chart.draw_secondary_series(LineSeries::new(points.clone(), TOMATO.stroke_width(3)))?;
        chart.draw_secondary_series(
            points
                .into_iter()
                .map(|point| Circle::new(point, 6, TOMATO.filled())),
        )?;

        root.present()?;
    }

    encode_png(pixels, TOTALS_CHART_SIZE)
}

/// One bar spanning segment `index`, inset from its neighbours.
fn bar(
    index: usize,
    count: usize,
    value: f64,
    style: ShapeStyle,
) -> Rectangle<(SegmentValue<usize>, f64)> {
    let right = if index + 1 < count {
        SegmentValue::Exact(index + 1)
    } else {
        SegmentValue::Last
    };
    let mut bar = Rectangle::new([(SegmentValue::Exact(index), 0.0), (right, value)], style);
    bar.set_margin(0, 0, 12, 12);
    bar
}

fn segment_label(labels: &[&str], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            labels.get(*i).map(|s| (*s).to_string()).unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn conversions_f64(row: &PlatformTotals) -> f64 {
    row.total_conversions as f64
}

/// Upper bound for a value axis with headroom for annotations.
fn axis_ceiling(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0_f64, f64::max);
    if max > 0.0 { max * 1.15 } else { 1.0 }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn viridis(index: usize, count: usize) -> RGBColor {
    if count <= 1 {
        return VIRIDIS[VIRIDIS.len() / 2];
    }

    let position = index as f64 / (count - 1) as f64 * (VIRIDIS.len() - 1) as f64;
    let lower = (position.floor() as usize).min(VIRIDIS.len() - 1);
    let upper = (lower + 1).min(VIRIDIS.len() - 1);
    let t = position - lower as f64;

    let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    let (lo, hi) = (VIRIDIS[lower], VIRIDIS[upper]);
    RGBColor(lerp(lo.0, hi.0), lerp(lo.1, hi.1), lerp(lo.2, hi.2))
}

fn pixel_len((width, height): (u32, u32)) -> usize {
    width as usize * height as usize * 3
}

fn encode_png(pixels: Vec<u8>, (width, height): (u32, u32)) -> WebResult<ChartImage> {
    let image = image::RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| WebError::Chart("pixel buffer does not match chart size".to_string()))?;

    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, image::ImageFormat::Png)?;
    Ok(ChartImage {
        png: png.into_inner(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

    fn efficiency() -> Vec<PlatformEfficiency> {
        vec![
            PlatformEfficiency {
                platform: "Google".to_string(),
                avg_cost_per_conversion: 801.0,
            },
            PlatformEfficiency {
                platform: "Instagram".to_string(),
                avg_cost_per_conversion: 8750.0,
            },
        ]
    }

    fn totals() -> Vec<PlatformTotals> {
        vec![
            PlatformTotals {
                platform: "Google".to_string(),
                total_ad_spend: 40_000.0,
                total_conversions: 50,
            },
            PlatformTotals {
                platform: "Instagram".to_string(),
                total_ad_spend: 35_000.0,
                total_conversions: 4,
            },
        ]
    }

    #[test]
    fn test_cost_chart_is_png() {
        let chart = render_cost_per_conversion_chart(&efficiency()).unwrap();
        assert!(chart.png.starts_with(PNG_MAGIC));
        assert!(chart.to_base64().starts_with("iVBORw0KGgo"));
    }

    #[test]
    fn test_totals_chart_is_png() {
        let chart = render_spend_vs_conversions_chart(&totals()).unwrap();
        assert!(chart.png.starts_with(PNG_MAGIC));
    }

    #[test]
    fn test_single_platform_renders() {
        let one = &efficiency()[..1];
        assert!(render_cost_per_conversion_chart(one).is_ok());
        assert!(render_spend_vs_conversions_chart(&totals()[..1]).is_ok());
    }

    #[test]
    fn test_register_fonts_is_idempotent() {
        register_fonts().unwrap();
        register_fonts().unwrap();
    }

    #[test]
    fn test_platform_names_are_drawn() {
        let renamed: Vec<_> = efficiency()
            .into_iter()
            .map(|mut row| {
                row.platform = format!("{}-Ads", row.platform);
                row
            })
            .collect();

        let original = render_cost_per_conversion_chart(&efficiency()).unwrap();
        let relabelled = render_cost_per_conversion_chart(&renamed).unwrap();
        assert_ne!(original.png, relabelled.png);
    }

    #[test]
    fn test_annotations_are_drawn() {
        let mut shifted = efficiency();
        shifted[0].avg_cost_per_conversion = 802.0;

        let original = render_cost_per_conversion_chart(&efficiency()).unwrap();
        let reannotated = render_cost_per_conversion_chart(&shifted).unwrap();
        assert_ne!(original.png, reannotated.png);
    }

    #[test]
    fn test_segment_label() {
        let labels = ["Google", "Meta"];
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(1)), "Meta");
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(5)), "");
        assert_eq!(segment_label(&labels, &SegmentValue::Last), "");
    }

    #[test]
    fn test_axis_ceiling() {
        assert_eq!(axis_ceiling([].into_iter()), 1.0);
        assert!((axis_ceiling([100.0, 200.0].into_iter()) - 230.0).abs() < 1e-9);
    }

    #[test]
    fn test_viridis_endpoints() {
        assert_eq!(viridis(0, 4), VIRIDIS[0]);
        assert_eq!(viridis(3, 4), VIRIDIS[4]);
    }
}
