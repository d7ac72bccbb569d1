//! Macroeconomic reference series consumed by the benchmarks
//!
//! - [`GrowthSeries`]: daily money-market growth multipliers (`1 + daily rate`),
//!   present on trading dates only.
//! - [`InflationSeries`]: monthly inflation rates keyed by month, with a
//!   precomputed cumulative index for contribution scaling.

use std::collections::BTreeMap;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::date_math::{first_of_month, month_key};

/// Business days per year used to de-annualize rates
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Convert an annual rate into the equivalent per-trading-day multiplier
#[must_use]
#[inline]
pub fn daily_factor(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / TRADING_DAYS_PER_YEAR)
}

/// Daily growth multipliers indexed by the dates they apply to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthSeries {
    factors: BTreeMap<Date, f64>,
}

impl GrowthSeries {
    /// Build from `(date, multiplier)` pairs. The first value seen for a date
    /// wins.
    pub fn from_factors(points: impl IntoIterator<Item = (Date, f64)>) -> Self {
        let mut factors = BTreeMap::new();
        for (date, factor) in points {
            factors.entry(date).or_insert(factor);
        }
        Self { factors }
    }

    /// Build from annual percentage rates quoted per date (e.g. `13.65` for
    /// 13.65% a year), compounding each over 252 trading days.
    pub fn from_annual_percent(points: impl IntoIterator<Item = (Date, f64)>) -> Self {
        Self::from_factors(
            points
                .into_iter()
                .map(|(date, pct)| (date, daily_factor(pct / 100.0))),
        )
    }

    /// Multiplier for `date`, `None` on dates the series does not cover
    #[inline]
    pub fn factor_on(&self, date: Date) -> Option<f64> {
        self.factors.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Date, f64)> + '_ {
        self.factors.iter().map(|(d, f)| (*d, *f))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct MonthRate {
    /// First day of the month the rate belongs to
    month: Date,
    rate: f64,
    /// Product of `(1 + rate)` over this month and every earlier one
    cumulative: f64,
}

/// Monthly inflation rates (as fractions, `0.005` = 0.5%)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InflationSeries {
    months: Vec<MonthRate>,
}

impl InflationSeries {
    /// Build from `(date, rate)` pairs; any date inside a month identifies that
    /// month and the first rate seen for a month wins.
    pub fn from_monthly_rates(points: impl IntoIterator<Item = (Date, f64)>) -> Self {
        let mut by_month = BTreeMap::new();
        for (date, rate) in points {
            by_month.entry(first_of_month(date)).or_insert(rate);
        }

        let mut cumulative = 1.0;
        let months = by_month
            .into_iter()
            .map(|(month, rate)| {
                cumulative *= 1.0 + rate;
                MonthRate {
                    month,
                    rate,
                    cumulative,
                }
            })
            .collect();
        Self { months }
    }

    /// Build from monthly percentages (`0.5` = 0.5%)
    pub fn from_monthly_percent(points: impl IntoIterator<Item = (Date, f64)>) -> Self {
        Self::from_monthly_rates(points.into_iter().map(|(d, pct)| (d, pct / 100.0)))
    }

    /// Rate for the month containing `date`, if that month is in the series
    pub fn rate_for_month(&self, date: Date) -> Option<f64> {
        let key = month_key(date);
        self.months
            .binary_search_by(|m| month_key(m.month).cmp(&key))
            .ok()
            .map(|idx| self.months[idx].rate)
    }

    /// Cumulative inflation index at `date`, forward-filled from the latest
    /// month keyed on or before it; `1.0` before the first month.
    pub fn cumulative_index(&self, date: Date) -> f64 {
        let idx = self.months.partition_point(|m| m.month <= date);
        if idx == 0 {
            1.0
        } else {
            self.months[idx - 1].cumulative
        }
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}
