//! Per-cohort daily aggregation and peak-relative normalization.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::cohort::Partition;
use crate::error::DivergenceError;
use crate::parser::Observation;

/// One aggregated day within a cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: i64,
    pub align: i64,
}

/// Daily totals for one cohort, ascending by date.
///
/// Dates absent from the source produce no row; there is no zero-fill.
#[derive(Debug, Clone)]
pub struct CohortSeries {
    pub cohort: String,
    pub points: Vec<SeriesPoint>,
}

/// A [`SeriesPoint`] with its percentage of the cohort peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    pub date: NaiveDate,
    pub value: i64,
    pub align: i64,
    pub percent_of_peak: f64,
}

/// A cohort series normalized against its own peak.
#[derive(Debug, Clone)]
pub struct NormalizedSeries {
    pub cohort: String,
    pub peak: i64,
    /// First date (ascending) attaining the peak.
    pub peak_date: NaiveDate,
    pub points: Vec<NormalizedPoint>,
}

/// Groups observations by date within each cohort and sums both value
/// columns. Returns one series per cohort in partition order; a cohort with
/// no matching observations yields an empty series.
pub fn aggregate(
    observations: &[Observation],
    partition: &Partition,
    strict: bool,
) -> Result<Vec<CohortSeries>, DivergenceError> {
    let mut by_cohort: BTreeMap<&str, BTreeMap<NaiveDate, (i64, i64)>> = BTreeMap::new();

    for obs in observations {
        let Some(name) = partition.assign(&obs.age, strict)? else {
            continue;
        };
        let totals = by_cohort.entry(name).or_default().entry(obs.date).or_insert((0, 0));
        totals.0 += obs.value;
        totals.1 += obs.align;
    }

    Ok(partition
        .names()
        .map(|name| CohortSeries {
            cohort: name.to_string(),
            points: by_cohort
                .get(name)
                .into_iter()
                .flatten()
                .map(|(&date, &(value, align))| SeriesPoint { date, value, align })
                .collect(),
        })
        .collect())
}

/// Computes the peak and the percent-of-peak for every row of a series.
///
/// The peak is taken over the align column. A series with no positive value
/// cannot be normalized and is reported as degenerate. Ties on the maximum
/// designate the earliest date as the peak date.
pub fn normalize(series: &CohortSeries) -> Result<NormalizedSeries, DivergenceError> {
    let mut peak = 0i64;
    let mut peak_date = None;

    for point in &series.points {
        if point.align > peak {
            peak = point.align;
            peak_date = Some(point.date);
        }
    }

    let Some(peak_date) = peak_date else {
        return Err(DivergenceError::DegenerateSeries {
            cohort: series.cohort.clone(),
        });
    };

    let points = series
        .points
        .iter()
        .map(|p| NormalizedPoint {
            date: p.date,
            value: p.value,
            align: p.align,
            percent_of_peak: round2(100.0 * p.align as f64 / peak as f64),
        })
        .collect();

    Ok(NormalizedSeries {
        cohort: series.cohort.clone(),
        peak,
        peak_date,
        points,
    })
}

/// Rounds to two decimal places, half away from zero (the `f64::round`
/// convention): 0.125 becomes 0.13, -0.125 becomes -0.13.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
