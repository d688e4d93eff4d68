use cra_rs::ChartPoint;
use cra_rs::chart::{self, Bar, BarChartStyle};
use std::fs;
use tempfile::tempdir;

fn series(values: &[u64]) -> Vec<ChartPoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| ChartPoint {
            label: format!("#{}", i + 1),
            value: *v,
            tooltip_title: format!("Post {}", i + 1),
        })
        .collect()
}

#[test]
fn svg_output_is_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("upvotes.svg");
    chart::plot_series(&series(&[1200, 800, 45]), &path, 640, 360).unwrap();
    let svg = fs::read_to_string(&path).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("<rect"));
}

#[test]
fn png_output_is_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("upvotes.png");
    chart::plot_series(&series(&[3, 2, 1]), &path, 320, 200).unwrap();
    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[test]
fn all_zero_values_still_render() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("zeros.svg");
    chart::plot_series(&series(&[0, 0]), &path, 320, 200).unwrap();
    assert!(path.exists());
}

#[test]
fn empty_or_non_finite_input_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.svg");
    assert!(chart::plot_series(&[], &path, 320, 200).is_err());

    let bars = vec![Bar {
        label: "P@1".into(),
        value: f64::NAN,
    }];
    let style = BarChartStyle {
        y_max: Some(1.0),
        ..BarChartStyle::default()
    };
    assert!(chart::plot_bars(&bars, &path, 320, 200, &style).is_err());
}
