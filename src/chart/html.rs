//! Interactive HTML chart artifact.
//!
//! The figure is serialized to plotly-shaped JSON and embedded in a
//! self-contained page that loads plotly.js from its CDN. Opening the file
//! in a browser gives the hover and zoom behavior of the reference charts.

use serde_json::{Value, json};

use super::{Annotation, ChartSpec, Dash, PALETTE, Series, last_date};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.32.0.min.js";

impl Dash {
    fn plotly(self) -> &'static str {
        match self {
            Dash::Solid => "solid",
            Dash::Dash => "dash",
            Dash::Dot => "dot",
        }
    }
}

/// Renders the chart as a complete HTML document.
pub fn render_html(series: &[Series], spec: &ChartSpec) -> String {
    let data: Vec<Value> = series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            json!({
                "type": "scatter",
                "mode": "lines",
                "name": s.name,
                "x": s.points.iter().map(|(d, _)| d.to_string()).collect::<Vec<_>>(),
                "y": s.points.iter().map(|(_, v)| *v).collect::<Vec<_>>(),
                "line": { "color": PALETTE[i % PALETTE.len()] },
            })
        })
        .collect();

    let end_date = last_date(series);
    let mut shapes: Vec<Value> = Vec::new();
    let mut labels: Vec<Value> = Vec::new();

    for annotation in &spec.annotations {
        match annotation {
            Annotation::HLine { y, dash, color, width, opacity } => shapes.push(json!({
                "type": "line",
                "xref": "paper", "x0": 0, "x1": 1,
                "yref": "y", "y0": y, "y1": y,
                "opacity": opacity,
                "line": { "color": color, "width": width, "dash": dash.plotly() },
            })),
            Annotation::VRect { start, end, fill, opacity } => {
                let Some(end) = (*end).or(end_date) else {
                    continue;
                };
                shapes.push(json!({
                    "type": "rect",
                    "xref": "x", "x0": start.to_string(), "x1": end.to_string(),
                    "yref": "paper", "y0": 0, "y1": 1,
                    "fillcolor": fill,
                    "opacity": opacity,
                    "line": { "width": 0 },
                }));
            }
            Annotation::Label { x, y, text } => labels.push(json!({
                "x": x.to_string(),
                "y": y,
                "text": text.replace('\n', "<br>"),
                "showarrow": false,
            })),
        }
    }

    let layout = json!({
        "title": {
            "text": spec.title.replace('\n', "<br>"),
            "x": 0.5,
            "font": { "family": "Helvetica", "color": "black", "size": 22 },
        },
        "font": { "family": "Helvetica", "color": "black", "size": 15 },
        "xaxis": { "title": "" },
        "yaxis": { "title": spec.y_label },
        "shapes": shapes,
        "annotations": labels,
    });

    let figure = json!({ "data": data, "layout": layout });

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <script src=\"{PLOTLY_CDN}\"></script>\n</head>\n<body>\n\
         <div id=\"chart\"></div>\n<script>\n\
         const figure = {figure};\n\
         Plotly.newPlot(\"chart\", figure.data, figure.layout, {{responsive: true}});\n\
         </script>\n</body>\n</html>\n"
    )
}
