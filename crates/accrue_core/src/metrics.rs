//! Terminal metrics for finished runs
//!
//! Summaries are computed from a [`ResultCurve`] after the walk and never feed
//! back into it. Every metric is total: degenerate inputs produce `0` or
//! `None` instead of an error.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::date_math::years_between;
use crate::model::{Destination, DestinationTotals, ResultCurve};

/// Compound annual growth rate from `start_value` to `end_value` over
/// `years`. Zero when either value or the period is not positive.
#[must_use]
pub fn calculate_cagr(start_value: f64, end_value: f64, years: f64) -> f64 {
    if start_value <= 0.0 || end_value <= 0.0 || years <= 0.0 {
        return 0.0;
    }
    (end_value / start_value).powf(1.0 / years) - 1.0
}

/// `final / invested - 1`, absent when nothing was invested
#[must_use]
pub fn return_on_investment(invested: f64, final_value: f64) -> Option<f64> {
    (invested > 0.0).then(|| final_value / invested - 1.0)
}

/// Final value of a benchmark column and its growth figure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkOutcome {
    pub final_value: f64,
    /// CAGR for lump-sum runs, return on investment for contribution runs
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LumpSumSummary {
    pub start: Date,
    pub end: Date,
    pub years: f64,
    pub initial_investment: f64,
    pub final_value: f64,
    pub cagr: f64,
    pub growth: Option<BenchmarkOutcome>,
    pub inflation_plus_spread: Option<BenchmarkOutcome>,
}

impl LumpSumSummary {
    /// Summarize a run over the window `start..=end`. Returns `None` for a
    /// curve without rows.
    pub fn from_curve(curve: &ResultCurve) -> Option<Self> {
        let start = curve.start_date()?;
        let end = curve.end_date()?;
        let years = years_between(start, end);
        let initial = curve.total_invested();
        let final_value = curve.final_total();

        let outcome = |column: &Option<Vec<f64>>| {
            column.as_ref().and_then(|c| c.last()).map(|&v| BenchmarkOutcome {
                final_value: v,
                rate: calculate_cagr(initial, v, years),
            })
        };

        Some(Self {
            start,
            end,
            years,
            initial_investment: initial,
            final_value,
            cagr: calculate_cagr(initial, final_value, years),
            growth: outcome(&curve.benchmarks.growth),
            inflation_plus_spread: outcome(&curve.benchmarks.inflation_plus_spread),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringSummary {
    pub start: Date,
    pub end: Date,
    pub years: f64,
    pub total_invested: f64,
    pub final_value: f64,
    pub return_on_investment: Option<f64>,
    pub growth: Option<BenchmarkOutcome>,
    pub inflation_plus_spread: Option<BenchmarkOutcome>,
    /// Cash counted as invested that no position holds
    pub undeployed: f64,
    pub months: usize,
    /// Destinations ranked by contributions received
    pub destinations: Vec<(Destination, DestinationTotals)>,
}

impl RecurringSummary {
    pub fn from_curve(curve: &ResultCurve) -> Option<Self> {
        let start = curve.start_date()?;
        let end = curve.end_date()?;
        let invested = curve.total_invested();
        let final_value = curve.final_total();

        let outcome = |column: &Option<Vec<f64>>| {
            let value = *column.as_ref()?.last()?;
            Some(BenchmarkOutcome {
                final_value: value,
                rate: return_on_investment(invested, value)?,
            })
        };

        Some(Self {
            start,
            end,
            years: years_between(start, end),
            total_invested: invested,
            final_value,
            return_on_investment: return_on_investment(invested, final_value),
            growth: outcome(&curve.benchmarks.growth),
            inflation_plus_spread: outcome(&curve.benchmarks.inflation_plus_spread),
            undeployed: curve.undeployed_total(),
            months: curve.contributions.len(),
            destinations: curve.contribution_counts(),
        })
    }

    /// Whether any contribution was processed at all
    pub fn has_contributions(&self) -> bool {
        self.total_invested > 0.0
    }
}
