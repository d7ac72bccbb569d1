//! Parameter sweeps over one normalized panel
//!
//! Each configuration is an independent, immutable value, so runs share the
//! panel and benchmarks read-only and can be evaluated in parallel. Results
//! come back in the order the configurations were given.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::benchmark::Benchmarks;
use crate::calendar::NormalizedPanel;
use crate::config::{CooldownConfig, RecurringConfig};
use crate::error::Result;
use crate::metrics::RecurringSummary;
use crate::recurring::simulate_recurring;

/// One evaluated configuration
#[derive(Debug, Clone)]
pub struct SweepPoint {
    pub config: RecurringConfig,
    pub summary: Option<RecurringSummary>,
}

/// Run every configuration over the same panel
pub fn sweep_recurring(
    panel: &NormalizedPanel,
    benchmarks: &Benchmarks,
    configs: &[RecurringConfig],
) -> Vec<Result<SweepPoint>> {
    let evaluate = |config: &RecurringConfig| -> Result<SweepPoint> {
        let curve = simulate_recurring(panel, benchmarks, config)?;
        Ok(SweepPoint {
            config: config.clone(),
            summary: RecurringSummary::from_curve(&curve),
        })
    };

    #[cfg(feature = "parallel")]
    let results = configs.par_iter().map(evaluate).collect();

    #[cfg(not(feature = "parallel"))]
    let results = configs.iter().map(evaluate).collect();

    tracing::debug!(points = configs.len(), "sweep finished");
    results
}

/// Cartesian product of split counts and cooldown settings applied to `base`.
/// `None` in `cooldowns` means a run without cooldown.
pub fn recurring_grid(
    base: &RecurringConfig,
    split_counts: &[usize],
    cooldowns: &[Option<CooldownConfig>],
) -> Vec<RecurringConfig> {
    let mut configs = Vec::with_capacity(split_counts.len() * cooldowns.len());
    for &k in split_counts {
        for cooldown in cooldowns {
            let mut config = base.clone().split_count(k);
            config.cooldown = *cooldown;
            configs.push(config);
        }
    }
    configs
}
