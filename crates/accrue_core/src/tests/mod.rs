//! Integration tests for the accrue simulation engine
//!
//! Tests are organized by topic:
//! - `scenarios` - End-to-end contribution and lump-sum runs
//! - `cooldown` - Quarantine activation, exclusion and escalation
//! - `benchmarks` - Benchmark columns and their degradation
//! - `mixed` - Fixed-income sleeve routing
//! - `properties` - Invariants over seeded synthetic markets

mod benchmarks;
mod cooldown;

use jiff::civil::{Date, Weekday};

use crate::date_math::calendar_days;
use crate::model::{InstrumentSeries, PricePanel, PriceRow};

/// Constant closes on every weekday of `start..=end`
fn weekday_panel(prices: &[(&str, f64)], start: Date, end: Date) -> PricePanel {
    prices
        .iter()
        .map(|&(symbol, price)| {
            let rows = calendar_days(start, end)
                .into_iter()
                .filter(|d| !matches!(d.weekday(), Weekday::Saturday | Weekday::Sunday))
                .map(|d| PriceRow::new(d, price))
                .collect();
            InstrumentSeries::new(symbol, rows)
        })
        .collect()
}
