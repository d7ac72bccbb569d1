//! Long-horizon equity backtesting library
//!
//! This crate walks a basket of equities day by day over a calendar window and
//! compares the resulting portfolio against money-market and inflation
//! benchmarks. It supports:
//! - Lump-sum buy-and-hold runs with dividend reinvestment
//! - Monthly inflation-adjusted contributions routed to the lowest-valued
//!   holdings, split over `k` instruments
//! - A cooldown throttle that quarantines instruments selected too often
//! - A fixed-income sleeve kept near a target share of the portfolio
//! - Growth-factor and inflation-plus-spread benchmark curves
//!
//! The library performs no I/O. Callers hand in a [`model::PricePanel`] and
//! optional reference series and receive [`model::ResultCurve`]s back.
//!
//! ```ignore
//! use accrue_core::{Benchmarks, RecurringConfig, normalize, simulate_recurring};
//!
//! let panel = normalize(&raw_panel, &["AAA", "BBB"], start, end);
//! let curve = simulate_recurring(&panel, &Benchmarks::none(), &RecurringConfig::new(1_000.0))?;
//! println!("final value {:.2}", curve.final_total());
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod benchmark;
pub mod calendar;
pub mod cooldown;
pub mod date_math;
pub mod error;
pub mod lump_sum;
pub mod metrics;
pub mod recurring;
pub mod sweep;
pub mod synthetic;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use benchmark::Benchmarks;
pub use calendar::{NormalizedPanel, normalize};
pub use config::{CooldownConfig, LumpSumConfig, RecurringConfig, SleeveConfig};
pub use error::{ConfigError, SimulationError};
pub use lump_sum::simulate_lump_sum;
pub use metrics::{LumpSumSummary, RecurringSummary, calculate_cagr};
pub use recurring::simulate_recurring;
