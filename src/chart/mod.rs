//! Declarative chart description and its renderers.
//!
//! A chart is one or more named [`Series`] plus a [`ChartSpec`]: title, axis
//! label, and a list of [`Annotation`] overlays. The overlays are
//! presentation configuration supplied by the metric preset, never computed
//! outputs. [`html`] renders the interactive document, [`svg`] the static
//! image; both consume the same description.

pub mod html;
pub mod svg;

use chrono::NaiveDate;

/// Line colors, one per series in order. Matches the muted palette of the
/// reference charts.
pub(crate) const PALETTE: &[&str] = &["#4c72b0", "#dd8452", "#55a868", "#c44e52", "#8172b3"];

/// A named line of (date, value) points, ascending by date.
#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub points: Vec<(NaiveDate, f64)>,
}

/// Stroke pattern for threshold lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dash {
    Solid,
    Dash,
    Dot,
}

/// One presentation overlay.
#[derive(Debug, Clone)]
pub enum Annotation {
    /// Horizontal threshold line across the full plot width.
    HLine {
        y: f64,
        dash: Dash,
        color: String,
        width: f64,
        opacity: f64,
    },
    /// Shaded rectangle over a date range; an open end extends to the last
    /// plotted date.
    VRect {
        start: NaiveDate,
        end: Option<NaiveDate>,
        fill: String,
        opacity: f64,
    },
    /// Static text placed at a data coordinate. Newlines break lines.
    Label { x: NaiveDate, y: f64, text: String },
}

/// Everything the renderers need besides the data itself.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    /// Chart title; newlines break lines.
    pub title: String,
    pub y_label: String,
    pub annotations: Vec<Annotation>,
}

/// Last plotted date across all series, used to close open-ended rectangles.
pub(crate) fn last_date(series: &[Series]) -> Option<NaiveDate> {
    series
        .iter()
        .flat_map(|s| s.points.iter().map(|(d, _)| *d))
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_date_spans_all_series() {
        let d = |day| NaiveDate::from_ymd_opt(2020, 1, day).unwrap();
        let series = vec![
            Series { name: "a".into(), points: vec![(d(1), 0.0), (d(9), 1.0)] },
            Series { name: "b".into(), points: vec![(d(4), 2.0)] },
        ];
        assert_eq!(last_date(&series), Some(d(9)));
        assert_eq!(last_date(&[]), None);
    }
}
