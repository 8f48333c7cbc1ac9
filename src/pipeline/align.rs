//! Temporal alignment of cohort peaks.
//!
//! Assumes a single dominant peak per cohort. Multi-wave data has several
//! local maxima, so the shift only aligns the wave containing the global
//! peak; later waves stay offset. Accepted limitation.

use chrono::Duration;

use super::series::NormalizedSeries;

/// Signed day count that moves `base`'s peak date onto `reference`'s.
pub fn peak_offset_days(base: &NormalizedSeries, reference: &NormalizedSeries) -> i64 {
    (reference.peak_date - base.peak_date).num_days()
}

/// Shifts every date in the series forward by `days` (backward when
/// negative), peak date included.
pub fn shift_dates(series: &mut NormalizedSeries, days: i64) {
    let delta = Duration::days(days);
    for point in &mut series.points {
        point.date += delta;
    }
    series.peak_date += delta;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::series::{CohortSeries, SeriesPoint, normalize};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn series_peaking_on(cohort: &str, peak_day: u32) -> NormalizedSeries {
        let points = (1..=10)
            .map(|d| {
                let v = if d == peak_day { 100 } else { 10 };
                SeriesPoint { date: day(d), value: v, align: v }
            })
            .collect();
        normalize(&CohortSeries { cohort: cohort.into(), points }).unwrap()
    }

    #[test]
    fn test_offset_is_signed() {
        let under = series_peaking_on("under80", 5);
        let over = series_peaking_on("over80", 8);

        assert_eq!(peak_offset_days(&under, &over), 3);
        assert_eq!(peak_offset_days(&over, &under), -3);
    }

    #[test]
    fn test_shift_lands_peak_on_reference_date() {
        let mut under = series_peaking_on("under80", 5);
        let over = series_peaking_on("over80", 8);

        let offset = peak_offset_days(&under, &over);
        shift_dates(&mut under, offset);

        assert_eq!(under.peak_date, over.peak_date);
        let peak_row = under
            .points
            .iter()
            .find(|p| p.percent_of_peak == 100.0)
            .unwrap();
        assert_eq!(peak_row.date, day(8));
    }

    #[test]
    fn test_negative_shift_moves_dates_backward() {
        let mut series = series_peaking_on("over80", 8);
        shift_dates(&mut series, -3);
        assert_eq!(series.peak_date, day(5));
        assert_eq!(series.points[0].date, NaiveDate::from_ymd_opt(2019, 12, 29).unwrap());
    }
}
