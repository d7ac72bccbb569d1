//! Benchmark accumulators
//!
//! Two reference curves are produced next to a portfolio curve:
//!
//! - **Growth-factor benchmark**: the money-market series compounded over the
//!   same capital the portfolio received. Lump-sum runs compound a fixed
//!   principal ([`growth_curve`]); contribution runs feed a [`GrowthAccount`]
//!   the same monthly cash the portfolio gets.
//! - **Inflation-plus-spread benchmark**: a fixed annual real rate compounded
//!   every calendar day, with the month's inflation applied in one step on
//!   the last calendar day of each month ([`inflation_plus_spread`]).
//!
//! Either input may be absent; the matching column is then omitted.

use jiff::civil::Date;

use crate::date_math::is_last_day_of_month;
use crate::model::{GrowthSeries, InflationSeries, daily_factor};

/// Reference series available to a run
#[derive(Debug, Clone, Default)]
pub struct Benchmarks {
    pub growth: Option<GrowthSeries>,
    pub inflation: Option<InflationSeries>,
}

impl Benchmarks {
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_growth(mut self, series: GrowthSeries) -> Self {
        self.growth = Some(series);
        self
    }

    #[must_use]
    pub fn with_inflation(mut self, series: InflationSeries) -> Self {
        self.inflation = Some(series);
        self
    }

    /// Growth series, treating an empty series as absent
    pub fn growth(&self) -> Option<&GrowthSeries> {
        self.growth.as_ref().filter(|s| !s.is_empty())
    }

    /// Inflation series, treating an empty series as absent
    pub fn inflation(&self) -> Option<&InflationSeries> {
        self.inflation.as_ref().filter(|s| !s.is_empty())
    }

    /// Cumulative inflation index used to scale a contribution on `date`
    pub fn contribution_index(&self, date: Date) -> f64 {
        self.inflation()
            .map_or(1.0, |series| series.cumulative_index(date))
    }
}

/// `initial × ∏ factor(s)` for every `s <= t`, one value per date. Dates the
/// series does not cover contribute a factor of 1.
pub fn growth_curve(dates: &[Date], initial: f64, series: &GrowthSeries) -> Vec<f64> {
    let mut value = initial;
    dates
        .iter()
        .map(|date| {
            if let Some(factor) = series.factor_on(*date) {
                value *= factor;
            }
            value
        })
        .collect()
}

/// Always-invested money-market account receiving the same cash flows as a
/// contribution portfolio
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GrowthAccount {
    value: f64,
}

impl GrowthAccount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credit(&mut self, amount: f64) {
        self.value += amount;
    }

    /// Apply the series factor for `date`, if there is one
    pub fn compound(&mut self, series: &GrowthSeries, date: Date) {
        if let Some(factor) = series.factor_on(date) {
            self.value *= factor;
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Inflation-plus-spread curve over an invested-capital curve.
///
/// Each day the change in invested capital is credited, then the balance is
/// multiplied by the daily real-rate factor and, on the last calendar day of
/// a month, by `1 + inflation(month)`. Months missing from the inflation
/// series apply no inflation step.
pub fn inflation_plus_spread(
    dates: &[Date],
    invested: &[f64],
    inflation: &InflationSeries,
    annual_real_rate: f64,
) -> Vec<f64> {
    debug_assert_eq!(dates.len(), invested.len());

    let real = daily_factor(annual_real_rate);
    let mut value = 0.0;
    let mut principal = 0.0;

    dates
        .iter()
        .zip(invested)
        .map(|(date, invested)| {
            value += invested - principal;
            principal = *invested;

            let mut factor = real;
            if is_last_day_of_month(*date)
                && let Some(rate) = inflation.rate_for_month(*date)
            {
                factor *= 1.0 + rate;
            }
            value *= factor;
            value
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_math::calendar_days;
    use jiff::civil::date;

    #[test]
    fn test_growth_curve_holds_flat_on_missing_dates() {
        let dates = calendar_days(date(2020, 1, 1), date(2020, 1, 5));
        let series = GrowthSeries::from_factors([(date(2020, 1, 2), 1.1), (date(2020, 1, 4), 1.1)]);

        let curve = growth_curve(&dates, 100.0, &series);
        let expected = [100.0, 110.0, 110.0, 121.0, 121.0];
        for (got, want) in curve.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{got} != {want}");
        }
    }

    #[test]
    fn test_growth_account_matches_cash_flows() {
        let series = GrowthSeries::from_factors([(date(2020, 1, 2), 1.5)]);
        let mut account = GrowthAccount::new();
        account.credit(100.0);
        account.compound(&series, date(2020, 1, 1));
        assert_eq!(account.value(), 100.0);
        account.compound(&series, date(2020, 1, 2));
        account.credit(50.0);
        assert_eq!(account.value(), 200.0);
    }

    #[test]
    fn test_empty_series_count_as_absent() {
        let benchmarks = Benchmarks::none()
            .with_growth(GrowthSeries::default())
            .with_inflation(InflationSeries::default());
        assert!(benchmarks.growth().is_none());
        assert!(benchmarks.inflation().is_none());
        assert_eq!(benchmarks.contribution_index(date(2020, 1, 1)), 1.0);
    }

    #[test]
    fn test_inflation_steps_only_at_month_end() {
        let dates = calendar_days(date(2021, 1, 1), date(2021, 3, 31));
        let invested = vec![1_000.0; dates.len()];
        let inflation = InflationSeries::from_monthly_rates(
            [1, 2, 3].map(|m| (date(2021, m, 1), 0.01)),
        );

        let curve = inflation_plus_spread(&dates, &invested, &inflation, 0.0);

        for (i, d) in dates.iter().enumerate().skip(1) {
            let changed = (curve[i] - curve[i - 1]).abs() > 1e-12;
            assert_eq!(changed, is_last_day_of_month(*d), "unexpected step on {d}");
        }
        assert!((curve[dates.len() - 1] - 1_000.0 * 1.01_f64.powi(3)).abs() < 1e-9);
    }

    #[test]
    fn test_inflation_plus_spread_tracks_contributions() {
        let dates = calendar_days(date(2021, 1, 30), date(2021, 2, 2));
        let invested = [100.0, 100.0, 300.0, 300.0];
        let inflation = InflationSeries::from_monthly_rates([(date(2021, 1, 1), 0.10)]);

        let curve = inflation_plus_spread(&dates, &invested, &inflation, 0.0);
        assert!((curve[0] - 100.0).abs() < 1e-12);
        assert!((curve[1] - 110.0).abs() < 1e-12);
        assert!((curve[2] - 310.0).abs() < 1e-12);
        assert!((curve[3] - 310.0).abs() < 1e-12);
    }

    #[test]
    fn test_real_rate_compounds_daily() {
        let dates = calendar_days(date(2021, 1, 1), date(2021, 1, 10));
        let invested = vec![100.0; dates.len()];
        let curve = inflation_plus_spread(&dates, &invested, &InflationSeries::default(), 0.06);
        let expected = 100.0 * daily_factor(0.06).powi(10);
        assert!((curve[9] - expected).abs() < 1e-9);
        assert!(curve.windows(2).all(|w| w[1] > w[0]));
    }
}
