//! Static SVG chart artifact.
//!
//! A small line-chart exporter: axes, ticks, the series polylines, and the
//! annotation overlays, written as SVG markup. No rasterization.

use std::fmt::Write;

use chrono::NaiveDate;

use super::{Annotation, ChartSpec, Dash, PALETTE, Series, last_date};

/// Layout configuration for the SVG export.
#[derive(Debug, Clone)]
pub struct SvgChart {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub font_family: String,
    pub font_size: f64,
}

impl Default for SvgChart {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 520.0,
            margin_top: 80.0,
            margin_right: 40.0,
            margin_bottom: 50.0,
            margin_left: 70.0,
            font_family: "Helvetica, Arial, sans-serif".into(),
            font_size: 13.0,
        }
    }
}

impl Dash {
    fn svg(self) -> Option<&'static str> {
        match self {
            Dash::Solid => None,
            Dash::Dash => Some("8 4"),
            Dash::Dot => Some("2 3"),
        }
    }
}

impl SvgChart {
    /// Export the chart as an SVG document string.
    pub fn export(&self, series: &[Series], spec: &ChartSpec) -> String {
        let mut out = String::with_capacity(16 * 1024);

        write!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
             viewBox=\"0 0 {w} {h}\" font-family=\"{font}\">",
            w = self.width,
            h = self.height,
            font = self.font_family,
        )
        .unwrap();

        write!(
            out,
            "<rect width=\"{}\" height=\"{}\" fill=\"white\"/>",
            self.width, self.height
        )
        .unwrap();

        self.write_title(&mut out, &spec.title);

        let Some(x_domain) = x_domain(series) else {
            // Nothing to plot; emit the titled shell.
            out.push_str("</svg>");
            return out;
        };
        let y_domain = y_domain(series, &spec.annotations);

        let plot = PlotArea {
            left: self.margin_left,
            top: self.margin_top,
            right: self.width - self.margin_right,
            bottom: self.height - self.margin_bottom,
            x_domain,
            y_domain,
        };

        // Shaded ranges sit behind everything else.
        let end_date = last_date(series);
        for annotation in &spec.annotations {
            if let Annotation::VRect { start, end, fill, opacity } = annotation {
                let Some(end) = (*end).or(end_date) else { continue };
                self.write_vrect(&mut out, &plot, *start, end, fill, *opacity);
            }
        }

        self.write_axes(&mut out, &plot);

        for annotation in &spec.annotations {
            if let Annotation::HLine { y, dash, color, width, opacity } = annotation {
                self.write_hline(&mut out, &plot, *y, *dash, color, *width, *opacity);
            }
        }

        for (i, s) in series.iter().enumerate() {
            self.write_polyline(&mut out, &plot, s, PALETTE[i % PALETTE.len()]);
        }

        for annotation in &spec.annotations {
            if let Annotation::Label { x, y, text } = annotation {
                self.write_label(&mut out, &plot, *x, *y, text);
            }
        }

        self.write_y_axis_label(&mut out, &spec.y_label);

        if series.len() > 1 {
            self.write_legend(&mut out, series);
        }

        out.push_str("</svg>");
        out
    }

    fn write_title(&self, out: &mut String, title: &str) {
        for (i, line) in title.lines().enumerate() {
            write!(
                out,
                "<text x=\"{x}\" y=\"{y}\" text-anchor=\"middle\" font-size=\"18\">",
                x = self.width / 2.0,
                y = 26.0 + 22.0 * i as f64,
            )
            .unwrap();
            escape_into(out, line);
            out.push_str("</text>");
        }
    }

    fn write_axes(&self, out: &mut String, plot: &PlotArea) {
        let (y_min, y_max) = plot.y_domain;
        let (x_min, x_max) = plot.x_domain;

        // Horizontal gridlines with value ticks.
        let ticks = 5;
        for i in 0..=ticks {
            let value = y_min + (y_max - y_min) * i as f64 / ticks as f64;
            let y = plot.y_pos(value);
            write!(
                out,
                "<line x1=\"{x1:.1}\" y1=\"{y:.1}\" x2=\"{x2:.1}\" y2=\"{y:.1}\" \
                 stroke=\"#dddddd\" stroke-width=\"1\"/>",
                x1 = plot.left,
                x2 = plot.right,
            )
            .unwrap();
            write!(
                out,
                "<text x=\"{x:.1}\" y=\"{ty:.1}\" text-anchor=\"end\" font-size=\"{fs}\">{label}</text>",
                x = plot.left - 8.0,
                ty = y + 4.0,
                fs = self.font_size,
                label = tick_label(value, y_max - y_min),
            )
            .unwrap();
        }

        // Date ticks along the bottom.
        let span_days = (x_max - x_min).num_days().max(1);
        for i in 0..=ticks {
            let date = x_min + chrono::Duration::days(span_days * i as i64 / ticks as i64);
            let x = plot.x_pos(date);
            write!(
                out,
                "<text x=\"{x:.1}\" y=\"{y:.1}\" text-anchor=\"middle\" font-size=\"{fs}\">{label}</text>",
                y = plot.bottom + 20.0,
                fs = self.font_size,
                label = date.format("%d %b %Y"),
            )
            .unwrap();
        }

        // Axis frame.
        write!(
            out,
            "<line x1=\"{l:.1}\" y1=\"{t:.1}\" x2=\"{l:.1}\" y2=\"{b:.1}\" stroke=\"#333333\"/>\
             <line x1=\"{l:.1}\" y1=\"{b:.1}\" x2=\"{r:.1}\" y2=\"{b:.1}\" stroke=\"#333333\"/>",
            l = plot.left,
            t = plot.top,
            b = plot.bottom,
            r = plot.right,
        )
        .unwrap();
    }

    fn write_vrect(
        &self,
        out: &mut String,
        plot: &PlotArea,
        start: NaiveDate,
        end: NaiveDate,
        fill: &str,
        opacity: f64,
    ) {
        let (x_min, x_max) = plot.x_domain;
        let start = start.clamp(x_min, x_max);
        let end = end.clamp(x_min, x_max);
        if start >= end {
            return;
        }

        let x0 = plot.x_pos(start);
        let x1 = plot.x_pos(end);
        write!(
            out,
            "<rect x=\"{x0:.1}\" y=\"{y:.1}\" width=\"{w:.1}\" height=\"{h:.1}\" \
             fill=\"{fill}\" opacity=\"{opacity}\"/>",
            y = plot.top,
            w = x1 - x0,
            h = plot.bottom - plot.top,
        )
        .unwrap();
    }

    fn write_hline(
        &self,
        out: &mut String,
        plot: &PlotArea,
        value: f64,
        dash: Dash,
        color: &str,
        width: f64,
        opacity: f64,
    ) {
        let y = plot.y_pos(value);
        write!(
            out,
            "<line x1=\"{x1:.1}\" y1=\"{y:.1}\" x2=\"{x2:.1}\" y2=\"{y:.1}\" \
             stroke=\"{color}\" stroke-width=\"{width}\" opacity=\"{opacity}\"",
            x1 = plot.left,
            x2 = plot.right,
        )
        .unwrap();
        if let Some(pattern) = dash.svg() {
            write!(out, " stroke-dasharray=\"{pattern}\"").unwrap();
        }
        out.push_str("/>");
    }

    fn write_polyline(&self, out: &mut String, plot: &PlotArea, series: &Series, color: &str) {
        if series.points.is_empty() {
            return;
        }
        out.push_str("<polyline fill=\"none\" stroke-width=\"2\" points=\"");
        for (date, value) in &series.points {
            write!(out, "{:.1},{:.1} ", plot.x_pos(*date), plot.y_pos(*value)).unwrap();
        }
        write!(out, "\" stroke=\"{color}\"/>").unwrap();
    }

    fn write_label(&self, out: &mut String, plot: &PlotArea, x: NaiveDate, y: f64, text: &str) {
        let px = plot.x_pos(x);
        let py = plot.y_pos(y);
        write!(
            out,
            "<text x=\"{px:.1}\" y=\"{py:.1}\" text-anchor=\"middle\" font-size=\"{fs}\">",
            fs = self.font_size,
        )
        .unwrap();
        for (i, line) in text.lines().enumerate() {
            let dy = if i == 0 { "0" } else { "1.2em" };
            write!(out, "<tspan x=\"{px:.1}\" dy=\"{dy}\">").unwrap();
            escape_into(out, line);
            out.push_str("</tspan>");
        }
        out.push_str("</text>");
    }

    fn write_y_axis_label(&self, out: &mut String, label: &str) {
        if label.is_empty() {
            return;
        }
        let cy = self.height / 2.0;
        write!(
            out,
            "<text x=\"18\" y=\"{cy:.1}\" text-anchor=\"middle\" font-size=\"{fs}\" \
             transform=\"rotate(-90 18 {cy:.1})\">",
            fs = self.font_size,
        )
        .unwrap();
        escape_into(out, label);
        out.push_str("</text>");
    }

    fn write_legend(&self, out: &mut String, series: &[Series]) {
        let x = self.width - self.margin_right - 130.0;
        for (i, s) in series.iter().enumerate() {
            let y = self.margin_top + 18.0 * i as f64;
            write!(
                out,
                "<line x1=\"{x:.1}\" y1=\"{y:.1}\" x2=\"{x2:.1}\" y2=\"{y:.1}\" \
                 stroke=\"{color}\" stroke-width=\"2\"/>\
                 <text x=\"{tx:.1}\" y=\"{ty:.1}\" font-size=\"{fs}\">",
                x2 = x + 24.0,
                color = PALETTE[i % PALETTE.len()],
                tx = x + 30.0,
                ty = y + 4.0,
                fs = self.font_size,
            )
            .unwrap();
            escape_into(out, &s.name);
            out.push_str("</text>");
        }
    }
}

struct PlotArea {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
    x_domain: (NaiveDate, NaiveDate),
    y_domain: (f64, f64),
}

impl PlotArea {
    fn x_pos(&self, date: NaiveDate) -> f64 {
        let (x_min, x_max) = self.x_domain;
        let span = (x_max - x_min).num_days().max(1) as f64;
        let offset = (date - x_min).num_days() as f64;
        self.left + (self.right - self.left) * offset / span
    }

    fn y_pos(&self, value: f64) -> f64 {
        let (y_min, y_max) = self.y_domain;
        let span = y_max - y_min;
        self.bottom - (self.bottom - self.top) * (value - y_min) / span
    }
}

fn x_domain(series: &[Series]) -> Option<(NaiveDate, NaiveDate)> {
    let dates = || series.iter().flat_map(|s| s.points.iter().map(|(d, _)| *d));
    Some((dates().min()?, dates().max()?))
}

/// Value range covering the data, threshold lines, and label anchors, with
/// a small pad so lines never sit on the frame.
fn y_domain(series: &[Series], annotations: &[Annotation]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    let mut cover = |v: f64| {
        min = min.min(v);
        max = max.max(v);
    };

    for s in series {
        for (_, v) in &s.points {
            cover(*v);
        }
    }
    for annotation in annotations {
        match annotation {
            Annotation::HLine { y, .. } | Annotation::Label { y, .. } => cover(*y),
            Annotation::VRect { .. } => {}
        }
    }

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(0.5);
    (min - pad, max + pad)
}

fn tick_label(value: f64, range: f64) -> String {
    if range >= 10.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, d).unwrap()
    }

    fn sample_series() -> Vec<Series> {
        vec![Series {
            name: "divergence".into(),
            points: vec![(day(1), -2.0), (day(15), 3.0), (day(30), 1.0)],
        }]
    }

    fn plain_spec() -> ChartSpec {
        ChartSpec { title: "Title".into(), y_label: "Y".into(), annotations: vec![] }
    }

    #[test]
    fn test_svg_basic_structure() {
        let svg = SvgChart::default().export(&sample_series(), &plain_spec());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("xmlns"));
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn test_svg_without_data_is_a_titled_shell() {
        let svg = SvgChart::default().export(&[], &plain_spec());
        assert!(svg.contains(">Title</text>"));
        assert!(!svg.contains("<polyline"));
    }

    #[test]
    fn test_svg_escapes_text() {
        let spec = ChartSpec {
            title: "Cases < Deaths & more".into(),
            y_label: "Y".into(),
            annotations: vec![],
        };
        let svg = SvgChart::default().export(&sample_series(), &spec);
        assert!(svg.contains("Cases &lt; Deaths &amp; more"));
    }

    #[test]
    fn test_svg_annotations_are_drawn() {
        let spec = ChartSpec {
            title: "T".into(),
            y_label: "Y".into(),
            annotations: vec![
                Annotation::HLine {
                    y: 0.0,
                    dash: Dash::Dot,
                    color: "blue".into(),
                    width: 2.0,
                    opacity: 0.7,
                },
                Annotation::VRect {
                    start: day(10),
                    end: Some(day(20)),
                    fill: "green".into(),
                    opacity: 0.3,
                },
                Annotation::Label { x: day(15), y: 2.0, text: "First\nWave".into() },
            ],
        };
        let svg = SvgChart::default().export(&sample_series(), &spec);

        assert!(svg.contains("stroke-dasharray=\"2 3\""));
        assert!(svg.contains("fill=\"green\""));
        assert!(svg.contains("<tspan"));
        assert!(svg.contains(">First</tspan>"));
    }

    #[test]
    fn test_svg_multi_series_gets_a_legend() {
        let mut series = sample_series();
        series.push(Series { name: "Over80".into(), points: vec![(day(1), 1.0), (day(30), 4.0)] });

        let svg = SvgChart::default().export(&series, &plain_spec());
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains(">Over80</text>"));
    }
}
