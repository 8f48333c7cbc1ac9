//! Unnormalized multi-cohort view in long format.

use chrono::NaiveDate;
use serde::Serialize;

use super::series::aggregate;
use crate::cohort::Partition;
use crate::error::DivergenceError;
use crate::parser::Observation;

/// One (date, cohort, total) row of the raw view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRow {
    pub date: NaiveDate,
    pub cohort: String,
    pub value: i64,
}

/// Aggregates every cohort of the partition on the raw value column and
/// flattens to long-format rows sorted by date, then cohort name. No
/// normalization and no alignment.
pub fn raw_table(
    observations: &[Observation],
    partition: &Partition,
    strict: bool,
    metric: &str,
) -> Result<Vec<RawRow>, DivergenceError> {
    let series = aggregate(observations, partition, strict)?;

    let mut rows: Vec<RawRow> = series
        .iter()
        .flat_map(|s| {
            s.points.iter().map(|p| RawRow {
                date: p.date,
                cohort: s.cohort.clone(),
                value: p.value,
            })
        })
        .collect();

    rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.cohort.cmp(&b.cohort)));

    if rows.is_empty() {
        return Err(DivergenceError::EmptyDataset {
            metric: metric.to_string(),
        });
    }

    Ok(rows)
}
