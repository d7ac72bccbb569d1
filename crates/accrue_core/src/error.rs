use std::fmt;

use jiff::civil::Date;

/// Problems with a run's immutable parameters, caught before the walk starts
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    SplitCountZero,
    NegativeAmount { field: &'static str, value: f64 },
    RatioOutOfRange { field: &'static str, value: f64 },
    NonPositiveMonths { field: &'static str, value: i32 },
    NegativeMonths { field: &'static str, value: i32 },
    MonthsTooLarge { field: &'static str, value: i32, max: i32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::SplitCountZero => write!(f, "split count must be at least 1"),
            ConfigError::NegativeAmount { field, value } => {
                write!(f, "{field} must not be negative (got {value})")
            }
            ConfigError::RatioOutOfRange { field, value } => {
                write!(f, "{field} must lie in [0, 1] (got {value})")
            }
            ConfigError::NonPositiveMonths { field, value } => {
                write!(f, "{field} must be at least one month (got {value})")
            }
            ConfigError::NegativeMonths { field, value } => {
                write!(f, "{field} must not be negative (got {value})")
            }
            ConfigError::MonthsTooLarge { field, value, max } => {
                write!(f, "{field} must be at most {max} months (got {value})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Hard stops for a simulation run.
///
/// Per-day data anomalies (missing closes, non-positive prices, every
/// instrument quarantined) never surface here; they are absorbed by the walk
/// and recorded in the ledger instead.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// None of the requested instruments had a usable close in the window
    NoValidInstruments { requested: usize },
    /// The window contains no calendar days
    EmptyWindow { start: Date, end: Date },
    InvalidConfig(ConfigError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::NoValidInstruments { requested } => write!(
                f,
                "none of the {requested} requested instruments has price data in the window"
            ),
            SimulationError::EmptyWindow { start, end } => {
                write!(f, "simulation window {start}..={end} is empty")
            }
            SimulationError::InvalidConfig(e) => write!(f, "invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::InvalidConfig(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SimulationError {
    fn from(err: ConfigError) -> Self {
        SimulationError::InvalidConfig(err)
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
