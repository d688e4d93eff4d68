//! Bar charts rendered to **SVG** or **PNG** with plotters.
//!
//! - Output format follows the file extension (`.svg`, anything else is PNG)
//! - One bar per entry, in the order given (no sorting)
//! - Labels need a font: one is registered on first use from `CRA_FONT` or a
//!   list of common system locations. Without a font, bars are still drawn but
//!   titles and tick labels are left out.

use crate::models::ChartPoint;
use anyhow::{Result, anyhow, bail};
use num_format::{Locale, ToFormattedString};
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const ENV_FONT: &str = "CRA_FONT";

/// `#3b82f6`
pub const BLUE: RGBColor = RGBColor(59, 130, 246);
/// `#6366f1`
pub const INDIGO: RGBColor = RGBColor(99, 102, 241);
/// `#10b981`
pub const EMERALD: RGBColor = RGBColor(16, 185, 129);

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONT_READY: OnceLock<bool> = OnceLock::new();

/// Register a "sans-serif" font once. `ab_glyph` does not discover OS fonts by itself.
pub fn fonts_available() -> bool {
    *FONT_READY.get_or_init(|| {
        let from_env = std::env::var_os(ENV_FONT).map(PathBuf::from);
        let candidates = from_env
            .into_iter()
            .chain(FONT_CANDIDATES.iter().map(PathBuf::from));
        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            // plotters keeps a 'static reference for the lifetime of the process.
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if plotters::style::register_font(
                "sans-serif",
                plotters::style::FontStyle::Normal,
                bytes,
            )
            .is_ok()
            {
                log::debug!("chart font: {}", path.display());
                return true;
            }
        }
        log::warn!("no usable font found, charts are drawn without labels (set {ENV_FONT})");
        false
    })
}

/// One labelled bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Presentation settings for [`plot_bars`].
#[derive(Debug, Clone)]
pub struct BarChartStyle {
    pub title: String,
    pub y_desc: String,
    /// Fixed upper bound for the y axis; `None` fits the data.
    pub y_max: Option<f64>,
    pub color: RGBColor,
}

impl Default for BarChartStyle {
    fn default() -> Self {
        Self {
            title: "Top Posts by Upvotes".to_string(),
            y_desc: "Upvotes".to_string(),
            y_max: None,
            color: BLUE,
        }
    }
}

/// Render the upvotes chart of a result set.
pub fn plot_series<P: AsRef<Path>>(
    series: &[ChartPoint],
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    let bars: Vec<Bar> = series
        .iter()
        .map(|p| Bar {
            label: p.label.clone(),
            value: p.value as f64,
        })
        .collect();
    plot_bars(&bars, out_path, width, height, &BarChartStyle::default())
}

/// Render `bars` left to right.
pub fn plot_bars<P: AsRef<Path>>(
    bars: &[Bar],
    out_path: P,
    width: u32,
    height: u32,
    style: &BarChartStyle,
) -> Result<()> {
    if bars.is_empty() {
        bail!("no data to plot");
    }
    if bars.iter().any(|b| !b.value.is_finite()) {
        bail!("bar values must be finite");
    }
    let with_text = fonts_available();
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();

    let data_max = bars.iter().map(|b| b.value).fold(0.0f64, f64::max);
    let y_max = match style.y_max {
        Some(m) if m > 0.0 => m.max(data_max),
        _ if data_max > 0.0 => data_max * 1.1,
        _ => 1.0,
    };

    if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
        let root = SVGBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_bars(root, bars, y_max, style, with_text)?;
    } else {
        let root = BitMapBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_bars(root, bars, y_max, style, with_text)?;
    }
    Ok(())
}

fn draw_bars<DB>(
    root: DrawingArea<DB, Shift>,
    bars: &[Bar],
    y_max: f64,
    style: &BarChartStyle,
    with_text: bool,
) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let n = bars.len();
    let mut builder = ChartBuilder::on(&root);
    builder.margin(16);
    if with_text {
        builder
            .caption(style.title.as_str(), (FontFamily::SansSerif, 22))
            .x_label_area_size(40)
            .y_label_area_size(64);
    }
    let mut chart = builder
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)
        .map_err(|e| anyhow!("{:?}", e))?;

    if with_text {
        let x_label_fmt = |x: &f64| {
            let r = x.round();
            if (x - r).abs() < 1e-6 && r >= 0.0 {
                bars.get(r as usize)
                    .map(|b| b.label.clone())
                    .unwrap_or_default()
            } else {
                String::new()
            }
        };
        let y_label_fmt = |v: &f64| {
            if y_max > 10.0 {
                (v.round() as i64).to_formatted_string(&Locale::en)
            } else {
                format!("{:.2}", v)
            }
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc(style.y_desc.as_str())
            .x_labels(n)
            .y_labels(6)
            .x_label_formatter(&x_label_fmt)
            .y_label_formatter(&y_label_fmt)
            .label_style((FontFamily::SansSerif, 12))
            .axis_desc_style((FontFamily::SansSerif, 14))
            .draw()
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    chart
        .draw_series(bars.iter().enumerate().map(|(i, b)| {
            let x = i as f64;
            Rectangle::new(
                [(x - 0.35, 0.0), (x + 0.35, b.value.max(0.0))],
                style.color.filled(),
            )
        }))
        .map_err(|e| anyhow!("{:?}", e))?;

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}
