//! CSV parser for the coronavirus API age-demographics extract.

use anyhow::Result;
use chrono::NaiveDate;
use serde::Deserialize;

/// Which metric column an invocation consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Cases,
    Deaths,
}

impl MetricKind {
    /// Name of the raw value column in the source CSV.
    pub fn column(self) -> &'static str {
        match self {
            MetricKind::Cases => "cases",
            MetricKind::Deaths => "deaths",
        }
    }

    /// Column used for peak detection, where the endpoint supplies one.
    ///
    /// The cases endpoint carries a pre-aggregated trailing-window sum that
    /// smooths weekday reporting artifacts; peaks are located on it rather
    /// than on the raw daily count. The deaths endpoint has no such column.
    pub fn align_column(self) -> Option<&'static str> {
        match self {
            MetricKind::Cases => Some("rollingSum"),
            MetricKind::Deaths => None,
        }
    }
}

/// One (date, age band, value) source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub date: NaiveDate,
    pub age: String,
    pub value: i64,
    /// Value used for peak detection; equals `value` unless the metric
    /// carries a rolling sum.
    pub align: i64,
}

#[derive(Debug, Deserialize)]
struct ApiRow {
    date: NaiveDate,
    age: String,
    #[serde(default)]
    cases: Option<i64>,
    #[serde(default)]
    deaths: Option<i64>,
    #[serde(default, rename = "rollingSum")]
    rolling_sum: Option<i64>,
}

/// Decodes the API's CSV payload into [`Observation`]s for one metric.
///
/// Rows without a value in the metric column are skipped. Columns the
/// endpoint does not provide are tolerated; a malformed date or value is an
/// error.
pub fn parse_observations(bytes: &[u8], metric: MetricKind) -> Result<Vec<Observation>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut observations = Vec::new();

    for result in rdr.deserialize() {
        let row: ApiRow = result?;

        let value = match metric {
            MetricKind::Cases => row.cases,
            MetricKind::Deaths => row.deaths,
        };
        let Some(value) = value else {
            continue;
        };

        let align = if metric.align_column().is_some() {
            row.rolling_sum.unwrap_or(value)
        } else {
            value
        };

        observations.push(Observation {
            date: row.date,
            age: row.age,
            value,
            align,
        });
    }

    Ok(observations)
}
