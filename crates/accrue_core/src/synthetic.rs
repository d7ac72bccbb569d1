//! Seeded synthetic market data
//!
//! Generates geometric random-walk closes on weekdays, with optional
//! quarterly dividends, plus flat reference series. Output depends only on
//! the seed and parameters, so it is safe to use in tests and benchmarks.

use jiff::civil::{Date, Weekday};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::date_math::{calendar_days, month_key};
use crate::model::{
    GrowthSeries, InflationSeries, InstrumentSeries, PricePanel, PriceRow, TRADING_DAYS_PER_YEAR,
    daily_factor,
};

#[derive(Debug, Clone)]
pub struct SyntheticMarket {
    seed: u64,
    instruments: usize,
    annual_drift: f64,
    annual_volatility: f64,
    /// Annual dividend yield, paid in four equal parts
    dividend_yield: f64,
}

impl SyntheticMarket {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            instruments: 3,
            annual_drift: 0.08,
            annual_volatility: 0.25,
            dividend_yield: 0.0,
        }
    }

    #[must_use]
    pub fn instruments(mut self, n: usize) -> Self {
        self.instruments = n;
        self
    }

    #[must_use]
    pub fn drift(mut self, annual: f64) -> Self {
        self.annual_drift = annual;
        self
    }

    #[must_use]
    pub fn volatility(mut self, annual: f64) -> Self {
        self.annual_volatility = annual.abs();
        self
    }

    #[must_use]
    pub fn dividend_yield(mut self, annual: f64) -> Self {
        self.dividend_yield = annual;
        self
    }

    pub fn symbol(index: usize) -> String {
        format!("SYN{index:02}")
    }

    /// Weekday closes for every instrument over `start..=end`
    pub fn price_panel(&self, start: Date, end: Date) -> PricePanel {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let days: Vec<Date> = calendar_days(start, end)
            .into_iter()
            .filter(|d| is_weekday(*d))
            .collect();

        let dt = 1.0 / TRADING_DAYS_PER_YEAR;
        let sigma = self.annual_volatility;
        let drift = (self.annual_drift - 0.5 * sigma * sigma) * dt;
        let shock = sigma * dt.sqrt();

        (0..self.instruments)
            .map(|index| {
                let mut price: f64 = rng.random_range(10.0..100.0);
                let mut last_month = None;
                let rows = days
                    .iter()
                    .map(|&date| {
                        let z: f64 = rng.sample(StandardNormal);
                        price *= (drift + shock * z).exp();

                        let mut row = PriceRow::new(date, price);
                        let month = month_key(date);
                        if last_month != Some(month) {
                            last_month = Some(month);
                            if self.dividend_yield > 0.0 && month.1 % 3 == 0 {
                                row = row.with_dividend(price * self.dividend_yield / 4.0);
                            }
                        }
                        row
                    })
                    .collect();
                InstrumentSeries::new(Self::symbol(index), rows)
            })
            .collect()
    }
}

/// Constant money-market rate quoted on weekdays
pub fn flat_growth_series(start: Date, end: Date, annual_rate: f64) -> GrowthSeries {
    let factor = daily_factor(annual_rate);
    GrowthSeries::from_factors(
        calendar_days(start, end)
            .into_iter()
            .filter(|d| is_weekday(*d))
            .map(|d| (d, factor)),
    )
}

/// Constant monthly inflation for every month touching `start..=end`
pub fn flat_inflation_series(start: Date, end: Date, monthly_rate: f64) -> InflationSeries {
    InflationSeries::from_monthly_rates(
        calendar_days(start, end)
            .into_iter()
            .filter(|d| d.day() == 1 || *d == start)
            .map(|d| (d, monthly_rate)),
    )
}

fn is_weekday(d: Date) -> bool {
    !matches!(d.weekday(), Weekday::Saturday | Weekday::Sunday)
}
