//! Run parameters
//!
//! Every simulator takes its parameters as an explicit, immutable value, so
//! different parameter sets can run side by side over the same panel (see
//! [`crate::sweep`]).
//!
//! ```ignore
//! use accrue_core::config::{CooldownConfig, RecurringConfig};
//!
//! let config = RecurringConfig::new(1_000.0)
//!     .split_count(2)
//!     .cooldown(CooldownConfig::new(3, 6, 12))
//!     .real_rate_spread(0.06);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound for every cooldown duration, in months
pub const MAX_COOLDOWN_MONTHS: i32 = 1_200;

fn default_split_count() -> usize {
    1
}

/// Buy-and-hold run: a fixed amount per instrument, invested once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LumpSumConfig {
    pub amount_per_instrument: f64,
    /// Annual real rate of the inflation-plus-spread benchmark
    #[serde(default)]
    pub real_rate_spread: Option<f64>,
}

impl LumpSumConfig {
    #[must_use]
    pub fn new(amount_per_instrument: f64) -> Self {
        Self {
            amount_per_instrument,
            real_rate_spread: None,
        }
    }

    #[must_use]
    pub fn real_rate_spread(mut self, rate: f64) -> Self {
        self.real_rate_spread = Some(rate);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("amount_per_instrument", self.amount_per_instrument)
    }
}

/// Throttle that quarantines instruments selected too often
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownConfig {
    /// Window (months) in which more than one contribution triggers quarantine
    pub lookback_months: i32,
    /// Length of an instrument's first quarantine
    pub initial_quarantine_months: i32,
    /// Added to an instrument's quarantine length each time it triggers
    pub quarantine_increment_months: i32,
}

impl CooldownConfig {
    #[must_use]
    pub fn new(lookback_months: i32, initial_quarantine_months: i32, increment: i32) -> Self {
        Self {
            lookback_months,
            initial_quarantine_months,
            quarantine_increment_months: increment,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback_months < 1 {
            return Err(ConfigError::NonPositiveMonths {
                field: "lookback_months",
                value: self.lookback_months,
            });
        }
        if self.initial_quarantine_months < 1 {
            return Err(ConfigError::NonPositiveMonths {
                field: "initial_quarantine_months",
                value: self.initial_quarantine_months,
            });
        }
        if self.quarantine_increment_months < 0 {
            return Err(ConfigError::NegativeMonths {
                field: "quarantine_increment_months",
                value: self.quarantine_increment_months,
            });
        }
        for (field, value) in [
            ("lookback_months", self.lookback_months),
            ("initial_quarantine_months", self.initial_quarantine_months),
            ("quarantine_increment_months", self.quarantine_increment_months),
        ] {
            if value > MAX_COOLDOWN_MONTHS {
                return Err(ConfigError::MonthsTooLarge {
                    field,
                    value,
                    max: MAX_COOLDOWN_MONTHS,
                });
            }
        }
        Ok(())
    }
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self::new(3, 6, 12)
    }
}

/// Fixed-income sleeve of the mixed-allocation variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleeveConfig {
    /// Share of the portfolio the sleeve is topped up to, in `[0, 1]`
    pub target_ratio: f64,
}

/// Monthly contribution run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringConfig {
    /// Nominal monthly amount before inflation adjustment
    pub base_contribution: f64,
    /// How many of the lowest-valued instruments share each contribution
    #[serde(default = "default_split_count")]
    pub split_count: usize,
    #[serde(default)]
    pub cooldown: Option<CooldownConfig>,
    #[serde(default)]
    pub sleeve: Option<SleeveConfig>,
    #[serde(default)]
    pub real_rate_spread: Option<f64>,
}

impl RecurringConfig {
    #[must_use]
    pub fn new(base_contribution: f64) -> Self {
        Self {
            base_contribution,
            split_count: default_split_count(),
            cooldown: None,
            sleeve: None,
            real_rate_spread: None,
        }
    }

    /// The plain mixed-allocation variant: a sleeve, one equity per month and
    /// no cooldown
    #[must_use]
    pub fn mixed(base_contribution: f64, target_ratio: f64) -> Self {
        Self::new(base_contribution).sleeve(target_ratio)
    }

    #[must_use]
    pub fn split_count(mut self, k: usize) -> Self {
        self.split_count = k;
        self
    }

    #[must_use]
    pub fn cooldown(mut self, cooldown: CooldownConfig) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    #[must_use]
    pub fn sleeve(mut self, target_ratio: f64) -> Self {
        self.sleeve = Some(SleeveConfig { target_ratio });
        self
    }

    #[must_use]
    pub fn real_rate_spread(mut self, rate: f64) -> Self {
        self.real_rate_spread = Some(rate);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("base_contribution", self.base_contribution)?;
        if self.split_count == 0 {
            return Err(ConfigError::SplitCountZero);
        }
        if let Some(cooldown) = &self.cooldown {
            cooldown.validate()?;
        }
        if let Some(sleeve) = &self.sleeve
            && !(0.0..=1.0).contains(&sleeve.target_ratio)
        {
            return Err(ConfigError::RatioOutOfRange {
                field: "target_ratio",
                value: sleeve.target_ratio,
            });
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NegativeAmount { field, value })
    }
}
