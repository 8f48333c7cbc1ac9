use chrono::NaiveDate;
use covid_divergence::cohort::Partition;
use covid_divergence::error::DivergenceError;
use covid_divergence::parser::{MetricKind, parse_observations};
use covid_divergence::pipeline::divergence::divergence_table;
use covid_divergence::pipeline::raw::raw_table;
use covid_divergence::pipeline::series::{aggregate, normalize};

fn june(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 6, d).unwrap()
}

#[test]
fn test_full_cases_pipeline() {
    let bytes = include_bytes!("fixtures/cases_sample.csv");
    let observations = parse_observations(bytes, MetricKind::Cases).expect("Failed to parse fixture");

    let partition = Partition::under_over_80();
    let series = aggregate(&observations, &partition, false).unwrap();
    let under = normalize(&series[0]).unwrap();
    let over = normalize(&series[1]).unwrap();

    // Rolling-sum peaks: under80 200 on June 2, over80 100 on June 4.
    assert_eq!(under.peak, 200);
    assert_eq!(under.peak_date, june(2));
    assert_eq!(over.peak, 100);
    assert_eq!(over.peak_date, june(4));

    let table = divergence_table(under, over, None, "cases").unwrap();
    assert_eq!(table.offset_days, 2);

    // Shifting under80 by two days leaves a June 3-6 overlap.
    let dates: Vec<_> = table.rows.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![june(3), june(4), june(5), june(6)]);

    let divergences: Vec<_> = table.rows.iter().map(|r| r.divergence).collect();
    assert_eq!(divergences, vec![10.0, 0.0, 5.0, -10.0]);

    let changes: Vec<_> = table.rows.iter().map(|r| r.daily_change).collect();
    assert_eq!(changes, vec![0.0, -10.0, 5.0, -15.0]);
}

#[test]
fn test_strict_mode_rejects_fixture_with_unknown_band() {
    // The fixture carries a "students" row; lenient runs drop it, strict
    // runs abort.
    let bytes = include_bytes!("fixtures/cases_sample.csv");
    let observations = parse_observations(bytes, MetricKind::Cases).unwrap();
    let partition = Partition::under_over_80();

    assert!(aggregate(&observations, &partition, false).is_ok());

    let err = aggregate(&observations, &partition, true).unwrap_err();
    assert!(matches!(
        err,
        DivergenceError::UnmappedCategory { label } if label == "students"
    ));
}

#[test]
fn test_deaths_pipeline_with_date_floor() {
    let bytes = include_bytes!("fixtures/deaths_sample.csv");
    let observations = parse_observations(bytes, MetricKind::Deaths).unwrap();

    let partition = Partition::under_over_80();
    let series = aggregate(&observations, &partition, false).unwrap();
    let under = normalize(&series[0]).unwrap();
    let over = normalize(&series[1]).unwrap();

    let floor = NaiveDate::from_ymd_opt(2020, 4, 2).unwrap();
    let table = divergence_table(under, over, Some(floor), "deaths").unwrap();

    // Both cohorts peak on April 2: no shift, and the floor trims April 1.
    assert_eq!(table.offset_days, 0);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].date, floor);
    assert_eq!(table.rows[0].divergence, 0.0);
    assert_eq!(table.rows[1].divergence, 20.0);
    assert_eq!(table.rows[1].daily_change, 20.0);
}

#[test]
fn test_raw_view_over_deaths_fixture() {
    let bytes = include_bytes!("fixtures/deaths_sample.csv");
    let observations = parse_observations(bytes, MetricKind::Deaths).unwrap();

    let partition = Partition::by_decade();
    let rows = raw_table(&observations, &partition, false, "deaths").unwrap();

    // Only Under60 and Over80 appear in the fixture; two rows per date.
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|r| r.cohort == "Under60" || r.cohort == "Over80"));
    let april2: Vec<_> = rows
        .iter()
        .filter(|r| r.date == NaiveDate::from_ymd_opt(2020, 4, 2).unwrap())
        .collect();
    assert_eq!(april2[0].cohort, "Over80");
    assert_eq!(april2[0].value, 50);
    assert_eq!(april2[1].cohort, "Under60");
    assert_eq!(april2[1].value, 5);
}
