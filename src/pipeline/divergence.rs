//! Merging aligned cohorts into the divergence table.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::align::{peak_offset_days, shift_dates};
use super::series::{NormalizedPoint, NormalizedSeries, round2};
use crate::error::DivergenceError;

/// One merged, peak-aligned day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivergenceRow {
    pub date: NaiveDate,
    pub value_under: i64,
    pub value_over: i64,
    pub align_under: i64,
    pub align_over: i64,
    pub percent_peak_under: f64,
    pub percent_peak_over: f64,
    pub divergence: f64,
    pub daily_change: f64,
}

/// The merged table plus the alignment facts for the run summary.
#[derive(Debug, Clone)]
pub struct DivergenceTable {
    pub offset_days: i64,
    /// Peak date of the under-80 series before shifting.
    pub under_peak_date: NaiveDate,
    pub over_peak_date: NaiveDate,
    /// Rows ascending by aligned date.
    pub rows: Vec<DivergenceRow>,
}

/// Shifts the under-80 series onto the over-80 peak, inner-joins the two on
/// exact date equality, and derives the divergence series.
///
/// The join truncates to the overlap window implied by the shift; rows
/// before `date_floor` are dropped afterwards. Divergence is the
/// percentage-point gap over-80 minus under-80; its first difference starts
/// at zero. Both are rounded to two decimals. An empty merged table is an
/// [`DivergenceError::EmptyDataset`].
pub fn divergence_table(
    under: NormalizedSeries,
    over: NormalizedSeries,
    date_floor: Option<NaiveDate>,
    metric: &str,
) -> Result<DivergenceTable, DivergenceError> {
    let offset_days = peak_offset_days(&under, &over);
    let under_peak_date = under.peak_date;

    let mut under = under;
    shift_dates(&mut under, offset_days);

    let over_by_date: BTreeMap<NaiveDate, &NormalizedPoint> =
        over.points.iter().map(|p| (p.date, p)).collect();

    let mut rows: Vec<DivergenceRow> = Vec::new();
    for u in &under.points {
        let Some(o) = over_by_date.get(&u.date) else {
            continue;
        };
        if date_floor.is_some_and(|floor| u.date < floor) {
            continue;
        }

        let divergence = round2(o.percent_of_peak - u.percent_of_peak);
        let daily_change = match rows.last() {
            Some(prev) => round2(divergence - prev.divergence),
            None => 0.0,
        };

        rows.push(DivergenceRow {
            date: u.date,
            value_under: u.value,
            value_over: o.value,
            align_under: u.align,
            align_over: o.align,
            percent_peak_under: u.percent_of_peak,
            percent_peak_over: o.percent_of_peak,
            divergence,
            daily_change,
        });
    }

    if rows.is_empty() {
        return Err(DivergenceError::EmptyDataset {
            metric: metric.to_string(),
        });
    }

    Ok(DivergenceTable {
        offset_days,
        under_peak_date,
        over_peak_date: over.peak_date,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::series::{CohortSeries, SeriesPoint, normalize};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn normalized(cohort: &str, values: &[(u32, i64)]) -> NormalizedSeries {
        let points = values
            .iter()
            .map(|&(d, v)| SeriesPoint { date: day(d), value: v, align: v })
            .collect();
        normalize(&CohortSeries { cohort: cohort.into(), points }).unwrap()
    }

    #[test]
    fn test_coincident_peaks_merge_without_shift() {
        // Spec scenario: both cohorts peak on the second date, so the offset
        // is zero and the percentages cancel exactly.
        let under = normalized("under80", &[(1, 10), (2, 20)]);
        let over = normalized("over80", &[(1, 5), (2, 10)]);

        let table = divergence_table(under, over, None, "cases").unwrap();

        assert_eq!(table.offset_days, 0);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].percent_peak_under, 50.0);
        assert_eq!(table.rows[0].percent_peak_over, 50.0);
        assert!(table.rows.iter().all(|r| r.divergence == 0.0));
        assert!(table.rows.iter().all(|r| r.daily_change == 0.0));
    }

    #[test]
    fn test_shifted_merge_keeps_only_overlap() {
        // Under peaks on day 5, over on day 8: offset 3, so under's days
        // 1..=10 land on 4..=13 and the join keeps 4..=10.
        let under_values: Vec<(u32, i64)> =
            (1..=10).map(|d| (d, if d == 5 { 100 } else { 10 })).collect();
        let over_values: Vec<(u32, i64)> =
            (1..=10).map(|d| (d, if d == 8 { 50 } else { 5 })).collect();

        let under = normalized("under80", &under_values);
        let over = normalized("over80", &over_values);

        let table = divergence_table(under, over, None, "cases").unwrap();

        assert_eq!(table.offset_days, 3);
        assert_eq!(table.under_peak_date, day(5));
        assert_eq!(table.over_peak_date, day(8));

        let dates: Vec<_> = table.rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, (4..=10).map(day).collect::<Vec<_>>());

        // The shifted under-80 peak row lands on the over-80 peak date.
        let peak_row = table.rows.iter().find(|r| r.percent_peak_under == 100.0).unwrap();
        assert_eq!(peak_row.date, day(8));
        assert_eq!(peak_row.percent_peak_over, 100.0);
    }

    #[test]
    fn test_daily_change_starts_at_zero_and_telescopes() {
        let under = normalized("under80", &[(1, 10), (2, 40), (3, 100), (4, 30)]);
        let over = normalized("over80", &[(1, 50), (2, 20), (3, 100), (4, 90)]);

        let table = divergence_table(under, over, None, "deaths").unwrap();
        let rows = &table.rows;

        assert_eq!(rows[0].daily_change, 0.0);

        let telescoped: f64 = rows.iter().skip(1).map(|r| r.daily_change).sum();
        let span = rows.last().unwrap().divergence - rows[0].divergence;
        assert!((telescoped - span).abs() < 1e-9);
    }

    #[test]
    fn test_date_floor_drops_early_rows() {
        let under = normalized("under80", &[(1, 10), (2, 20), (3, 100)]);
        let over = normalized("over80", &[(1, 5), (2, 10), (3, 50)]);

        let table = divergence_table(under, over, Some(day(2)), "cases").unwrap();

        let dates: Vec<_> = table.rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(2), day(3)]);
        // The first surviving row restarts the daily change at zero.
        assert_eq!(table.rows[0].daily_change, 0.0);
    }

    #[test]
    fn test_floor_past_overlap_is_empty_dataset() {
        let under = normalized("under80", &[(1, 10), (2, 100)]);
        let over = normalized("over80", &[(20, 5), (21, 50)]);

        // Offset 19 shifts under onto days 20..21, but a floor past the
        // overlap leaves nothing.
        let err = divergence_table(under, over, Some(day(25)), "cases").unwrap_err();
        assert!(matches!(err, DivergenceError::EmptyDataset { metric } if metric == "cases"));
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let values: Vec<(u32, i64)> = (1..=9).map(|d| (d, (d as i64) * 7 % 5 + 1)).collect();
        let run = || {
            let under = normalized("under80", &values);
            let over = normalized("over80", &[(2, 3), (3, 9), (4, 6), (5, 9)]);
            divergence_table(under, over, None, "cases").unwrap()
        };

        assert_eq!(run().rows, run().rows);
    }
}
