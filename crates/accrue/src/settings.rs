//! Backtest settings file
//!
//! A single YAML document describes the instruments, the window, every
//! scenario's parameters and where data comes from and results go:
//!
//! ```yaml
//! instruments: [ABEV3, WEGE3, ITUB3]
//! start: 2015-01-01
//! lump_sum:
//!   amount_per_instrument: 1000.0
//! monthly:
//!   base_contribution: 1000.0
//!   split_count: 2
//! cooldown:
//!   enabled: true
//!   lookback_months: 3
//! benchmark:
//!   growth_series: selic
//!   inflation_series: ipca
//!   real_rate_spread: 0.06
//! ```
//!
//! Every section is optional; missing values fall back to the defaults below.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use accrue_core::config::{CooldownConfig, LumpSumConfig, RecurringConfig};
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::util::io::atomic_write;

/// Error types for loading and validating settings
#[derive(Debug)]
pub enum SettingsError {
    Io(String),
    Parse(String),
    Serialize(String),
    Invalid(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(msg) => write!(f, "IO error: {msg}"),
            SettingsError::Parse(msg) => write!(f, "Parse error: {msg}"),
            SettingsError::Serialize(msg) => write!(f, "Serialization error: {msg}"),
            SettingsError::Invalid(msg) => write!(f, "Invalid settings: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub instruments: Vec<String>,
    pub start: Date,
    /// Last simulated day; today when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Date>,
    #[serde(default)]
    pub lump_sum: LumpSumSection,
    #[serde(default)]
    pub monthly: MonthlySection,
    #[serde(default)]
    pub cooldown: CooldownSection,
    #[serde(default)]
    pub mixed: MixedSection,
    #[serde(default)]
    pub benchmark: BenchmarkSection,
    #[serde(default)]
    pub data: DataSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LumpSumSection {
    pub amount_per_instrument: f64,
}

impl Default for LumpSumSection {
    fn default() -> Self {
        Self {
            amount_per_instrument: 1_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlySection {
    /// Nominal amount, scaled by cumulative inflation each month
    pub base_contribution: f64,
    pub split_count: usize,
}

impl Default for MonthlySection {
    fn default() -> Self {
        Self {
            base_contribution: 1_000.0,
            split_count: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownSection {
    pub enabled: bool,
    pub lookback_months: i32,
    pub initial_quarantine_months: i32,
    pub quarantine_increment_months: i32,
}

impl Default for CooldownSection {
    fn default() -> Self {
        let defaults = CooldownConfig::default();
        Self {
            enabled: true,
            lookback_months: defaults.lookback_months,
            initial_quarantine_months: defaults.initial_quarantine_months,
            quarantine_increment_months: defaults.quarantine_increment_months,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixedSection {
    /// Share of the portfolio the fixed-income sleeve is topped up to
    pub target_ratio: f64,
}

impl Default for MixedSection {
    fn default() -> Self {
        Self { target_ratio: 0.3 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSection {
    /// Money-market series id, quoted as annual percent per trading day
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_series: Option<String>,
    /// Inflation series id, quoted as monthly percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_series: Option<String>,
    /// Annual real rate of the inflation-plus-spread benchmark
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_rate_spread: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Directory of source CSV files; `<data_dir>/sources` when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,
    /// Directory of cached series; `<data_dir>/cache` when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Cached files older than this are fetched again
    pub max_age_days: u64,
    pub chunk_years: i16,
    pub retry_attempts: u32,
    pub retry_backoff_secs: f64,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            source_dir: None,
            cache_dir: None,
            max_age_days: 1,
            chunk_years: 3,
            retry_attempts: 3,
            retry_backoff_secs: 2.0,
        }
    }
}

impl DataSection {
    pub fn retry_backoff(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_backoff_secs.max(0.0)).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub directory: PathBuf,
    pub lump_sum_file: String,
    pub monthly_file: String,
    pub mixed_file: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("results"),
            lump_sum_file: "backtest_lump_sum.csv".to_string(),
            monthly_file: "backtest_monthly.csv".to_string(),
            mixed_file: "backtest_mixed.csv".to_string(),
        }
    }
}

impl Settings {
    /// Minimal settings for a set of instruments; everything else defaulted
    pub fn new(instruments: Vec<String>, start: Date) -> Self {
        Self {
            instruments,
            start,
            end: None,
            lump_sum: LumpSumSection::default(),
            monthly: MonthlySection::default(),
            cooldown: CooldownSection::default(),
            mixed: MixedSection::default(),
            benchmark: BenchmarkSection::default(),
            data: DataSection::default(),
            output: OutputSection::default(),
        }
    }

    /// Starting point written by `accrue init`
    pub fn template() -> Self {
        let instruments = ["ABEV3", "EGIE3", "ITUB3", "RADL3", "WEGE3"];
        let mut settings = Self::new(
            instruments.iter().map(|s| s.to_string()).collect(),
            Date::constant(2015, 1, 1),
        );
        settings.monthly.split_count = 2;
        settings.benchmark = BenchmarkSection {
            growth_series: Some("selic".to_string()),
            inflation_series: Some("ipca".to_string()),
            real_rate_spread: Some(0.06),
        };
        settings
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, SettingsError> {
        serde_saphyr::from_str(yaml)
            .map_err(|e| SettingsError::Parse(format!("Failed to parse settings: {e}")))
    }

    pub fn to_yaml(&self) -> Result<String, SettingsError> {
        serde_saphyr::to_string(self)
            .map_err(|e| SettingsError::Serialize(format!("Failed to serialize settings: {e}")))
    }

    /// Read, parse and validate a settings file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::Io(format!("Failed to read {}: {e}", path.display()))
        })?;
        let settings = Self::from_yaml(&content)?;
        settings.validate()?;
        tracing::debug!(path = %path.display(), instruments = settings.instruments.len(), "settings loaded");
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let yaml = self.to_yaml()?;
        atomic_write(path, yaml.as_bytes())
            .map_err(|e| SettingsError::Io(format!("Failed to write {}: {e}", path.display())))
    }

    /// End of the window, today when not configured
    pub fn end_date(&self) -> Date {
        self.end.unwrap_or_else(|| jiff::Zoned::now().date())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.instruments.iter().all(|s| s.trim().is_empty()) {
            return Err(SettingsError::Invalid(
                "at least one instrument is required".to_string(),
            ));
        }
        let end = self.end_date();
        if end < self.start {
            return Err(SettingsError::Invalid(format!(
                "end date {end} is before start date {}",
                self.start
            )));
        }
        if self.data.chunk_years < 1 {
            return Err(SettingsError::Invalid(
                "data.chunk_years must be at least 1".to_string(),
            ));
        }
        if self.data.retry_attempts == 0 {
            return Err(SettingsError::Invalid(
                "data.retry_attempts must be at least 1".to_string(),
            ));
        }
        let backoff = self.data.retry_backoff_secs;
        if !backoff.is_finite() || backoff < 0.0 {
            return Err(SettingsError::Invalid(format!(
                "data.retry_backoff_secs must be a finite, non-negative number (got {backoff})"
            )));
        }

        self.lump_sum_config()
            .validate()
            .and(self.recurring_config().validate())
            .and(self.mixed_config().validate())
            .map_err(|e| SettingsError::Invalid(e.to_string()))
    }

    pub fn lump_sum_config(&self) -> LumpSumConfig {
        let mut config = LumpSumConfig::new(self.lump_sum.amount_per_instrument);
        config.real_rate_spread = self.benchmark.real_rate_spread;
        config
    }

    fn cooldown_config(&self) -> Option<CooldownConfig> {
        self.cooldown.enabled.then(|| {
            CooldownConfig::new(
                self.cooldown.lookback_months,
                self.cooldown.initial_quarantine_months,
                self.cooldown.quarantine_increment_months,
            )
        })
    }

    /// Monthly scenario: lowest-value split with the configured cooldown
    pub fn recurring_config(&self) -> RecurringConfig {
        let mut config =
            RecurringConfig::new(self.monthly.base_contribution).split_count(self.monthly.split_count);
        config.cooldown = self.cooldown_config();
        config.real_rate_spread = self.benchmark.real_rate_spread;
        config
    }

    /// Mixed scenario: sleeve plus the single lowest equity, no cooldown
    pub fn mixed_config(&self) -> RecurringConfig {
        let mut config =
            RecurringConfig::mixed(self.monthly.base_contribution, self.mixed.target_ratio);
        config.real_rate_spread = self.benchmark.real_rate_spread;
        config
    }

    pub fn source_dir(&self, data_dir: &Path) -> PathBuf {
        self.data
            .source_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("sources"))
    }

    pub fn cache_dir(&self, data_dir: &Path) -> PathBuf {
        self.data
            .cache_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("cache"))
    }
}
