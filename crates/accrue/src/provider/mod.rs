//! Market data acquisition
//!
//! Sources hand over raw rows; [`DataLoader`] layers the on-disk cache,
//! chunked retries and percent conversion on top and produces the
//! [`PricePanel`] and [`Benchmarks`] the simulators consume.

pub mod cache;
pub mod csv_dir;

use std::fmt;
use std::thread;
use std::time::Duration;

use accrue_core::Benchmarks;
use accrue_core::date_math::{add_days, add_months};
use accrue_core::model::{GrowthSeries, InflationSeries, InstrumentSeries, PricePanel, PriceRow};
use jiff::civil::Date;

pub use cache::DiskCache;
pub use csv_dir::CsvDirectory;

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The source has nothing under this name
    Missing(String),
    Io(String),
    Parse(String),
    /// The source was reachable but the request failed
    Fetch(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Missing(name) => write!(f, "no data available for {name}"),
            ProviderError::Io(msg) => write!(f, "IO error: {msg}"),
            ProviderError::Parse(msg) => write!(f, "Parse error: {msg}"),
            ProviderError::Fetch(msg) => write!(f, "Fetch failed: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Daily close/dividend rows for one instrument
pub trait PriceSource {
    fn fetch_instrument(
        &self,
        symbol: &str,
        start: Date,
        end: Date,
    ) -> Result<Vec<PriceRow>, ProviderError>;
}

/// Dated values of a reference series, one bounded range per request
pub trait SeriesSource {
    fn fetch_chunk(
        &self,
        series_id: &str,
        start: Date,
        end: Date,
    ) -> Result<Vec<(Date, f64)>, ProviderError>;
}

/// How a long series request is split and retried
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub chunk_years: i16,
    /// Attempts per chunk, including the first
    pub attempts: u32,
    /// Pause between two attempts on the same chunk
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            chunk_years: 3,
            attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Split `start..=end` into consecutive ranges of at most `chunk_years`
/// years, each starting the day after the previous one ends.
pub fn chunk_ranges(start: Date, end: Date, chunk_years: i16) -> Vec<(Date, Date)> {
    let months = i32::from(chunk_years.max(1)) * 12;
    let mut ranges = Vec::new();
    let mut from = start;
    while from <= end {
        let to = add_months(from, months).min(end);
        ranges.push((from, to));
        from = add_days(to, 1);
    }
    ranges
}

/// Fetch a series chunk by chunk, retrying failed chunks.
///
/// A chunk that fails every attempt is skipped. Successful but empty chunks
/// are not retried. When a date repeats across chunks the first value wins.
/// Returns `None` if nothing at all came back.
pub fn fetch_series_chunked<S: SeriesSource + ?Sized>(
    source: &S,
    series_id: &str,
    start: Date,
    end: Date,
    policy: &RetryPolicy,
) -> Option<Vec<(Date, f64)>> {
    let attempts = policy.attempts.max(1);
    let mut merged = Vec::new();

    for (n, (from, to)) in chunk_ranges(start, end, policy.chunk_years)
        .into_iter()
        .enumerate()
    {
        tracing::debug!(series = series_id, chunk = n + 1, %from, %to, "fetching chunk");
        for attempt in 1..=attempts {
            match source.fetch_chunk(series_id, from, to) {
                Ok(points) => {
                    tracing::debug!(series = series_id, rows = points.len(), "chunk received");
                    merged.extend(points);
                    break;
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(series = series_id, attempt, error = %e, "chunk fetch failed, retrying");
                    if !policy.backoff.is_zero() {
                        thread::sleep(policy.backoff);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        series = series_id, %from, %to, error = %e,
                        "chunk failed after {attempts} attempts, skipping"
                    );
                }
            }
        }
    }

    if merged.is_empty() {
        tracing::error!(series = series_id, "no data retrieved");
        return None;
    }

    // Stable sort keeps the first occurrence of each date in front
    merged.sort_by_key(|(date, _)| *date);
    merged.dedup_by_key(|(date, _)| *date);
    tracing::info!(series = series_id, rows = merged.len(), "series loaded");
    Some(merged)
}

/// Loads every input of a run, going through the cache when one is set
pub struct DataLoader<'a> {
    prices: &'a dyn PriceSource,
    series: &'a dyn SeriesSource,
    cache: Option<DiskCache>,
    policy: RetryPolicy,
}

impl<'a> DataLoader<'a> {
    pub fn new(prices: &'a dyn PriceSource, series: &'a dyn SeriesSource) -> Self {
        Self {
            prices,
            series,
            cache: None,
            policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: DiskCache) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Raw panel for the requested symbols.
    ///
    /// Instruments that cannot be loaded are logged and left out; the
    /// normalizer later records them as dropped.
    pub fn price_panel<S: AsRef<str>>(&self, symbols: &[S], start: Date, end: Date) -> PricePanel {
        let mut panel = PricePanel::new();
        for symbol in symbols.iter().map(AsRef::as_ref) {
            match self.instrument_rows(symbol, start, end) {
                Ok(rows) if rows.is_empty() => {
                    tracing::warn!(instrument = symbol, "no rows returned, skipping");
                }
                Ok(rows) => panel.insert(InstrumentSeries::new(symbol, rows)),
                Err(e) => tracing::warn!(instrument = symbol, error = %e, "failed to load prices"),
            }
        }

        if panel.is_empty() {
            tracing::error!(requested = symbols.len(), "no price data loaded for any instrument");
        }
        panel
    }

    fn instrument_rows(
        &self,
        symbol: &str,
        start: Date,
        end: Date,
    ) -> Result<Vec<PriceRow>, ProviderError> {
        if let Some(cache) = &self.cache
            && let Some(rows) = cache.read_prices(symbol)
        {
            tracing::info!(instrument = symbol, "using cached prices");
            return Ok(rows);
        }

        let rows = self.prices.fetch_instrument(symbol, start, end)?;
        if let Some(cache) = &self.cache
            && !rows.is_empty()
            && let Err(e) = cache.store_prices(symbol, &rows)
        {
            tracing::warn!(instrument = symbol, error = %e, "failed to cache prices");
        }
        Ok(rows)
    }

    /// Series values for `start..=end`, `None` when nothing could be loaded
    pub fn series_points(&self, series_id: &str, start: Date, end: Date) -> Option<Vec<(Date, f64)>> {
        if let Some(cache) = &self.cache
            && let Some(points) = cache.read_series(series_id)
        {
            tracing::info!(series = series_id, "using cached series");
            return Some(points);
        }

        let points = fetch_series_chunked(self.series, series_id, start, end, &self.policy)?;
        if let Some(cache) = &self.cache
            && let Err(e) = cache.store_series(series_id, &points)
        {
            tracing::warn!(series = series_id, error = %e, "failed to cache series");
        }
        Some(points)
    }

    /// Growth series quoted as annual percent, inflation as monthly percent.
    /// A series that cannot be loaded leaves its benchmark absent.
    pub fn benchmarks(
        &self,
        growth_id: Option<&str>,
        inflation_id: Option<&str>,
        start: Date,
        end: Date,
    ) -> Benchmarks {
        let mut benchmarks = Benchmarks::none();
        if let Some(points) = growth_id.and_then(|id| self.series_points(id, start, end)) {
            benchmarks = benchmarks.with_growth(GrowthSeries::from_annual_percent(points));
        }
        if let Some(points) = inflation_id.and_then(|id| self.series_points(id, start, end)) {
            benchmarks = benchmarks.with_inflation(InflationSeries::from_monthly_percent(points));
        }
        benchmarks
    }
}
