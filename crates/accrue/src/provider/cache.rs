//! On-disk cache of fetched rows
//!
//! Instruments live under `<dir>/prices/<symbol>.csv`, reference series under
//! `<dir>/series/<id>.csv`. A file is fresh while its modification time is
//! younger than `max_age_days`; stale or unreadable files are ignored and
//! fetched again.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use accrue_core::model::PriceRow;
use jiff::civil::Date;

use super::ProviderError;
use super::csv_dir::{points_to_csv, price_rows_to_csv, read_points, read_price_rows};
use crate::util::io::atomic_write;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    max_age: Duration,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>, max_age_days: u64) -> Self {
        Self {
            dir: dir.into(),
            max_age: Duration::from_secs(max_age_days.saturating_mul(SECONDS_PER_DAY)),
        }
    }

    pub fn prices_path(&self, symbol: &str) -> PathBuf {
        self.dir.join("prices").join(format!("{symbol}.csv"))
    }

    pub fn series_path(&self, series_id: &str) -> PathBuf {
        self.dir.join("series").join(format!("{series_id}.csv"))
    }

    /// Whether `path` exists and was written less than `max_age` ago
    pub fn is_fresh(&self, path: &Path) -> bool {
        let Ok(modified) = path.metadata().and_then(|m| m.modified()) else {
            return false;
        };
        // A timestamp in the future counts as just written
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        age < self.max_age
    }

    fn read_fresh<T>(
        &self,
        path: &Path,
        read: impl FnOnce(&Path) -> Result<T, ProviderError>,
    ) -> Option<T> {
        if !self.is_fresh(path) {
            return None;
        }
        match read(path) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable cache file");
                None
            }
        }
    }

    pub fn read_prices(&self, symbol: &str) -> Option<Vec<PriceRow>> {
        self.read_fresh(&self.prices_path(symbol), read_price_rows)
    }

    pub fn read_series(&self, series_id: &str) -> Option<Vec<(Date, f64)>> {
        self.read_fresh(&self.series_path(series_id), read_points)
    }

    pub fn store_prices(&self, symbol: &str, rows: &[PriceRow]) -> Result<(), ProviderError> {
        write(&self.prices_path(symbol), &price_rows_to_csv(rows)?)
    }

    pub fn store_series(&self, series_id: &str, points: &[(Date, f64)]) -> Result<(), ProviderError> {
        write(&self.series_path(series_id), &points_to_csv(points)?)
    }
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), ProviderError> {
    atomic_write(path, bytes)
        .map_err(|e| ProviderError::Io(format!("Failed to write {}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), "cache file written");
    Ok(())
}
