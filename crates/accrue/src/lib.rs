//! Command-line backtesting of long-horizon equity contribution strategies
//!
//! This crate wraps [`accrue_core`] with everything a run needs around the
//! simulators:
//! - YAML settings describing instruments, window and scenario parameters
//! - File-backed price and reference-series sources with chunked retries
//!   and an on-disk cache
//! - Month-end CSV export and console reports
//! - Size-rotated file logging

// ============================================================================
// Core modules
// ============================================================================

pub mod backtest;
pub mod export;
pub mod provider;
pub mod report;
pub mod settings;

// ============================================================================
// Support modules
// ============================================================================

pub mod logging;
pub mod util;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use backtest::{Inputs, Scenario, ScenarioPlan, load_inputs, run_scenarios, synthetic_inputs};
pub use export::{CsvSink, ExportError};
pub use logging::init_logging;
pub use provider::{CsvDirectory, DataLoader, DiskCache, ProviderError, RetryPolicy};
pub use settings::{Settings, SettingsError};
