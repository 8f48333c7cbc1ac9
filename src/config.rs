//! Per-metric run presets.
//!
//! Each preset bundles what distinguishes one invocation from another: the
//! API endpoint, the cohort partition, the date floor, output naming, and
//! the chart annotation overlays. The CLI can override the source, floor,
//! partition, and output directories per run.

use chrono::NaiveDate;

use crate::chart::{Annotation, ChartSpec, Dash};
use crate::cohort::Partition;
use crate::parser::MetricKind;

/// Configuration for one pipeline invocation.
#[derive(Debug, Clone)]
pub struct MetricConfig {
    pub kind: MetricKind,
    /// Short name used in filenames, column headers, and log fields.
    pub name: &'static str,
    /// Reference API endpoint.
    pub url: &'static str,
    pub partition: Partition,
    /// Merged rows before this date are dropped.
    pub date_floor: Option<NaiveDate>,
    pub data_dir: &'static str,
    pub charts_dir: &'static str,
    /// Artifact filename stem; the run date is appended.
    pub stem: &'static str,
    pub chart: ChartSpec,
}

/// Cases divergence: aligned on the rolling sum, floored at the date mass
/// testing was established.
pub fn cases() -> MetricConfig {
    MetricConfig {
        kind: MetricKind::Cases,
        name: "cases",
        url: "https://api.coronavirus.data.gov.uk/v2/data?areaType=nation&areaCode=E92000001&metric=newCasesBySpecimenDateAgeDemographics&format=csv",
        partition: Partition::under_over_80(),
        date_floor: Some(date(2020, 6, 1)),
        data_dir: "data/cases",
        charts_dir: "charts/cases",
        stem: "Cases_Divergence",
        chart: ChartSpec {
            title: "England: Proportion of Cases in Under/Over 80s\n\
                    Divergence Relative to Temporally Aligned Peaks"
                .into(),
            y_label: "Comparative Divergence".into(),
            annotations: vec![
                boundline(-5.0, Dash::Dot),
                boundline(5.0, Dash::Dot),
                boundline(0.0, Dash::Dash),
                Annotation::VRect {
                    start: date(2021, 1, 24),
                    end: None,
                    fill: "green".into(),
                    opacity: 0.3,
                },
                Annotation::Label {
                    x: date(2021, 2, 5),
                    y: 15.0,
                    text: "79.71%\nOver80s\n(1 dose)".into(),
                },
            ],
        },
    }
}

/// Deaths divergence: raw daily deaths, no date floor.
pub fn deaths() -> MetricConfig {
    MetricConfig {
        kind: MetricKind::Deaths,
        name: "deaths",
        url: "https://api.coronavirus.data.gov.uk/v2/data?areaType=nation&metric=newDeaths28DaysByDeathDateAgeDemographics&format=csv",
        partition: Partition::under_over_80(),
        date_floor: None,
        data_dir: "data/deaths",
        charts_dir: "charts/deaths",
        stem: "Deaths_Divergence",
        chart: ChartSpec {
            title: "England: Proportion of COVID Deaths in Under/Over 80s\n\
                    Comparative Divergence From Temporally Aligned Peaks"
                .into(),
            y_label: "Comparative Divergence".into(),
            annotations: vec![
                boundline(-13.0, Dash::Dot),
                boundline(10.0, Dash::Dot),
                boundline(0.0, Dash::Dash),
                Annotation::VRect {
                    start: date(2020, 3, 27),
                    end: Some(date(2020, 5, 2)),
                    fill: "green".into(),
                    opacity: 0.3,
                },
                Annotation::Label { x: date(2020, 4, 12), y: 25.0, text: "First\nWave".into() },
                Annotation::Label {
                    x: date(2020, 5, 2),
                    y: -25.0,
                    text: "Unrecorded\nDeaths".into(),
                },
                Annotation::VRect {
                    start: date(2021, 1, 24),
                    end: None,
                    fill: "green".into(),
                    opacity: 0.3,
                },
                Annotation::Label {
                    x: date(2021, 1, 21),
                    y: -25.0,
                    text: "Vaccine\nDivergence".into(),
                },
                Annotation::Label {
                    x: date(2021, 2, 5),
                    y: 23.0,
                    text: "79.71%\nOver80s\n(1 dose)".into(),
                },
            ],
        },
    }
}

/// Raw deaths view: four decade cohorts, unnormalized daily totals with the
/// lockdown periods shaded.
pub fn raw_deaths() -> MetricConfig {
    MetricConfig {
        kind: MetricKind::Deaths,
        name: "deaths",
        url: "https://api.coronavirus.data.gov.uk/v2/data?areaType=nation&metric=newDeaths28DaysByDeathDateAgeDemographics&format=csv",
        partition: Partition::by_decade(),
        date_floor: None,
        data_dir: "data/raw_deaths",
        charts_dir: "charts/raw_deaths",
        stem: "Deaths_Raw",
        chart: ChartSpec {
            title: "England: COVID Deaths".into(),
            y_label: "Deaths".into(),
            annotations: vec![
                Annotation::VRect {
                    start: date(2020, 3, 23),
                    end: Some(date(2020, 5, 18)),
                    fill: "green".into(),
                    opacity: 0.2,
                },
                Annotation::Label {
                    x: date(2020, 4, 28),
                    y: 510.0,
                    text: "Lockdown\n1.0".into(),
                },
                Annotation::VRect {
                    start: date(2020, 11, 5),
                    end: Some(date(2020, 12, 2)),
                    fill: "green".into(),
                    opacity: 0.2,
                },
                Annotation::Label {
                    x: date(2020, 11, 17),
                    y: 510.0,
                    text: "Lockdown\n2.0".into(),
                },
                Annotation::VRect {
                    start: date(2021, 1, 6),
                    end: None,
                    fill: "green".into(),
                    opacity: 0.2,
                },
                Annotation::Label {
                    x: date(2021, 2, 10),
                    y: 510.0,
                    text: "Lockdown\n3.0".into(),
                },
            ],
        },
    }
}

fn boundline(y: f64, dash: Dash) -> Annotation {
    Annotation::HLine { y, dash, color: "blue".into(), width: 2.0, opacity: 0.7 }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid preset date")
}
