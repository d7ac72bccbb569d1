//! Wiring between settings, data loading and the simulators

use std::path::Path;

use accrue_core::date_math::{add_days, add_months};
use accrue_core::model::ResultCurve;
use accrue_core::synthetic::{SyntheticMarket, flat_growth_series, flat_inflation_series};
use accrue_core::{
    Benchmarks, LumpSumConfig, NormalizedPanel, RecurringConfig, SimulationError, normalize,
    simulate_lump_sum, simulate_recurring,
};
use jiff::civil::Date;

use crate::provider::{CsvDirectory, DataLoader, DiskCache, RetryPolicy};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Scenario {
    LumpSum,
    Monthly,
    Mixed,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::LumpSum, Scenario::Monthly, Scenario::Mixed];
}

/// Parameters of every scenario a run may execute
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioPlan {
    pub lump_sum: LumpSumConfig,
    pub monthly: RecurringConfig,
    pub mixed: RecurringConfig,
}

impl ScenarioPlan {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            lump_sum: settings.lump_sum_config(),
            monthly: settings.recurring_config(),
            mixed: settings.mixed_config(),
        }
    }
}

/// Simulation inputs shared by all scenarios of a run
pub struct Inputs {
    pub panel: NormalizedPanel,
    pub benchmarks: Benchmarks,
}

/// Load prices and reference series described by `settings`
pub fn load_inputs(settings: &Settings, data_dir: &Path) -> Inputs {
    let start = settings.start;
    let end = settings.end_date();
    let source = CsvDirectory::new(settings.source_dir(data_dir));
    let cache = DiskCache::new(settings.cache_dir(data_dir), settings.data.max_age_days);
    let policy = RetryPolicy {
        chunk_years: settings.data.chunk_years,
        attempts: settings.data.retry_attempts,
        backoff: settings.data.retry_backoff(),
    };
    let loader = DataLoader::new(&source, &source)
        .with_cache(cache)
        .with_policy(policy);

    let raw = loader.price_panel(&settings.instruments, start, end);
    let panel = normalize(&raw, &settings.instruments, start, end);
    let benchmarks = loader.benchmarks(
        settings.benchmark.growth_series.as_deref(),
        settings.benchmark.inflation_series.as_deref(),
        start,
        end,
    );
    tracing::info!(
        instruments = panel.instruments().len(),
        dropped = panel.dropped().len(),
        days = panel.len(),
        "inputs loaded"
    );
    Inputs { panel, benchmarks }
}

/// Seeded synthetic market over the `years` years ending on `end`, with a
/// flat 10% money-market rate and 0.4% monthly inflation
pub fn synthetic_inputs(seed: u64, instruments: usize, years: i32, end: Date) -> Inputs {
    let start = add_days(add_months(end, -12 * years.max(1)), 1);
    let raw = SyntheticMarket::new(seed)
        .instruments(instruments)
        .dividend_yield(0.04)
        .price_panel(start, end);
    let symbols: Vec<_> = raw.symbols().map(str::to_string).collect();
    Inputs {
        panel: normalize(&raw, &symbols, start, end),
        benchmarks: Benchmarks::none()
            .with_growth(flat_growth_series(start, end, 0.10))
            .with_inflation(flat_inflation_series(start, end, 0.004)),
    }
}

/// Run the selected scenarios in order
pub fn run_scenarios(
    inputs: &Inputs,
    plan: &ScenarioPlan,
    scenarios: &[Scenario],
) -> Result<Vec<ResultCurve>, SimulationError> {
    scenarios
        .iter()
        .map(|scenario| {
            tracing::info!(?scenario, "running scenario");
            let Inputs { panel, benchmarks } = inputs;
            match scenario {
                Scenario::LumpSum => simulate_lump_sum(panel, benchmarks, &plan.lump_sum),
                Scenario::Monthly => simulate_recurring(panel, benchmarks, &plan.monthly),
                Scenario::Mixed => simulate_recurring(panel, benchmarks, &plan.mixed),
            }
        })
        .collect()
}
