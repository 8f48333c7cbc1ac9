//! CSV export and artifact paths.
//!
//! Every run writes a fresh, timestamped file; nothing is appended, so a
//! daily run leaves one record per day.

use anyhow::Result;
use chrono::NaiveDate;
use csv::WriterBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::parser::MetricKind;
use crate::pipeline::divergence::DivergenceTable;
use crate::pipeline::raw::RawRow;

/// Builds `<dir>/<stem>_<YYYY-MM-DD><suffix>`, the per-run artifact path.
pub fn timestamped_path(dir: &str, stem: &str, run_date: NaiveDate, suffix: &str) -> PathBuf {
    PathBuf::from(dir).join(format!("{stem}_{}{suffix}", run_date.format("%Y-%m-%d")))
}

/// Writes the divergence table as CSV, sorted by date descending.
///
/// Column names carry the metric (`cases_under80`, `deaths_over80`, ...);
/// the rolling-sum columns appear only for metrics that align on one.
pub fn write_divergence_csv(path: &Path, metric: MetricKind, table: &DivergenceTable) -> Result<()> {
    debug!(path = %path.display(), rows = table.rows.len(), "Writing divergence CSV");

    let mut writer = WriterBuilder::new().from_path(path)?;
    let name = metric.column();
    let with_rolling = metric.align_column().is_some();

    let mut header = vec![
        "date".to_string(),
        format!("{name}_under80"),
        format!("{name}_over80"),
    ];
    if with_rolling {
        header.push("rollingsum_under80".to_string());
        header.push("rollingsum_over80".to_string());
    }
    header.extend(
        ["percent_peak_under80", "percent_peak_over80", "divergence", "daily_change"]
            .map(String::from),
    );
    writer.write_record(&header)?;

    for row in table.rows.iter().rev() {
        let mut record = vec![
            row.date.to_string(),
            row.value_under.to_string(),
            row.value_over.to_string(),
        ];
        if with_rolling {
            record.push(row.align_under.to_string());
            record.push(row.align_over.to_string());
        }
        record.push(format!("{:.2}", row.percent_peak_under));
        record.push(format!("{:.2}", row.percent_peak_over));
        record.push(format!("{:.2}", row.divergence));
        record.push(format!("{:.2}", row.daily_change));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the raw cohort view as long-format CSV in the given row order.
pub fn write_raw_csv(path: &Path, metric: MetricKind, rows: &[RawRow]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing raw cohort CSV");

    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(["date", "cohort", metric.column()])?;

    for row in rows {
        writer.write_record([
            row.date.to_string(),
            row.cohort.clone(),
            row.value.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
