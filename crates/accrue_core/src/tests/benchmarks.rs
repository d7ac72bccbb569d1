//! Benchmark columns attached to simulator output

use jiff::civil::date;

use super::weekday_panel;
use crate::benchmark::Benchmarks;
use crate::calendar::normalize;
use crate::config::{LumpSumConfig, RecurringConfig};
use crate::date_math::{is_last_day_of_month, month_key};
use crate::lump_sum::simulate_lump_sum;
use crate::metrics::{LumpSumSummary, RecurringSummary};
use crate::model::{GrowthSeries, InflationSeries};
use crate::recurring::simulate_recurring;
use crate::synthetic::{flat_growth_series, flat_inflation_series};

#[test]
fn test_empty_growth_series_omits_column() {
    let start = date(2020, 1, 1);
    let end = date(2020, 3, 31);
    let panel = weekday_panel(&[("A", 10.0), ("B", 20.0)], start, end);
    let normalized = normalize(&panel, &["A", "B"], start, end);
    let benchmarks = Benchmarks::none().with_growth(GrowthSeries::default());

    let lump = simulate_lump_sum(&normalized, &benchmarks, &LumpSumConfig::new(1_000.0)).unwrap();
    let monthly =
        simulate_recurring(&normalized, &benchmarks, &RecurringConfig::new(1_000.0)).unwrap();
    let mixed =
        simulate_recurring(&normalized, &benchmarks, &RecurringConfig::mixed(1_000.0, 0.5))
            .unwrap();

    for curve in [&lump, &monthly, &mixed] {
        assert!(curve.benchmarks.growth.is_none());
        assert!(curve.benchmarks.inflation_plus_spread.is_none());
        assert!(curve.rows.iter().all(|r| r.total.is_finite()));
    }

    let summary = LumpSumSummary::from_curve(&lump).unwrap();
    assert!(summary.growth.is_none());
    let summary = RecurringSummary::from_curve(&monthly).unwrap();
    assert!(summary.growth.is_none());
    assert!(summary.return_on_investment.unwrap().is_finite());

    // Without a growth factor the sleeve simply holds its cash
    assert_eq!(mixed.final_row().unwrap().sleeve, Some(1_000.0));
}

#[test]
fn test_inflation_column_steps_only_on_month_end() {
    let start = date(2021, 1, 1);
    let end = date(2021, 6, 30);
    let panel = weekday_panel(&[("A", 10.0)], start, end);
    let normalized = normalize(&panel, &["A"], start, end);
    let benchmarks = Benchmarks::none().with_inflation(flat_inflation_series(start, end, 0.005));

    let curve = simulate_lump_sum(
        &normalized,
        &benchmarks,
        &LumpSumConfig::new(1_000.0).real_rate_spread(0.0),
    )
    .unwrap();
    let column = curve.benchmarks.inflation_plus_spread.as_ref().unwrap();

    for i in 1..column.len() {
        let date = curve.rows[i].date;
        let changed = (column[i] - column[i - 1]).abs() > 1e-9;
        assert_eq!(changed, is_last_day_of_month(date), "on {date}");
    }
    // Inside one month every day before the last holds the same value
    let january: Vec<_> = curve
        .rows
        .iter()
        .zip(column)
        .filter(|(r, _)| month_key(r.date) == (2021, 1) && !is_last_day_of_month(r.date))
        .map(|(_, v)| *v)
        .collect();
    assert!(january.windows(2).all(|w| w[0] == w[1]));
    assert!((column[column.len() - 1] - 1_000.0 * 1.005_f64.powi(6)).abs() < 1e-6);
}

#[test]
fn test_inflation_column_requires_spread() {
    let start = date(2021, 1, 1);
    let end = date(2021, 2, 28);
    let panel = weekday_panel(&[("A", 10.0)], start, end);
    let normalized = normalize(&panel, &["A"], start, end);
    let benchmarks = Benchmarks::none().with_inflation(flat_inflation_series(start, end, 0.005));

    let curve =
        simulate_lump_sum(&normalized, &benchmarks, &LumpSumConfig::new(1_000.0)).unwrap();
    assert!(curve.benchmarks.inflation_plus_spread.is_none());

    let no_inflation = simulate_lump_sum(
        &normalized,
        &Benchmarks::none(),
        &LumpSumConfig::new(1_000.0).real_rate_spread(0.06),
    )
    .unwrap();
    assert!(no_inflation.benchmarks.inflation_plus_spread.is_none());
}

#[test]
fn test_contributions_scaled_by_cumulative_inflation() {
    let start = date(2021, 1, 1);
    let end = date(2021, 4, 30);
    let panel = weekday_panel(&[("A", 10.0)], start, end);
    let normalized = normalize(&panel, &["A"], start, end);
    let inflation = InflationSeries::from_monthly_percent([
        (date(2021, 1, 1), 0.5),
        (date(2021, 2, 1), 0.5),
        (date(2021, 3, 1), 0.5),
        (date(2021, 4, 1), 0.5),
    ]);

    let curve = simulate_recurring(
        &normalized,
        &Benchmarks::none().with_inflation(inflation),
        &RecurringConfig::new(1_000.0).real_rate_spread(0.06),
    )
    .unwrap();

    for (n, c) in curve.contributions.iter().enumerate() {
        let expected = 1_000.0 * 1.005_f64.powi(n as i32 + 1);
        assert!((c.amount - expected).abs() < 1e-9);
    }
    let sum: f64 = curve.contributions.iter().map(|c| c.amount).sum();
    assert!((curve.total_invested() - sum).abs() < 1e-9);

    // Principal of the inflation benchmark follows invested capital
    let column = curve.benchmarks.inflation_plus_spread.as_ref().unwrap();
    assert!(column[column.len() - 1] > curve.total_invested());
}

#[test]
fn test_recurring_growth_benchmark_tracks_flat_rate() {
    let start = date(2021, 1, 1);
    let end = date(2021, 12, 31);
    let panel = weekday_panel(&[("A", 10.0)], start, end);
    let normalized = normalize(&panel, &["A"], start, end);
    let benchmarks = Benchmarks::none().with_growth(flat_growth_series(start, end, 0.10));

    let curve =
        simulate_recurring(&normalized, &benchmarks, &RecurringConfig::new(1_000.0)).unwrap();
    let column = curve.benchmarks.growth.as_ref().unwrap();

    assert_eq!(column.len(), curve.rows.len());
    // Never below the cash it was given, and flat over weekends
    for (row, value) in curve.rows.iter().zip(column) {
        assert!(*value >= row.invested - 1e-9);
    }
    let saturday = curve.row_index(date(2021, 1, 2)).unwrap();
    assert_eq!(column[saturday], column[saturday + 1]);
    assert!(column[column.len() - 1] > curve.total_invested());
}
