//! Raw daily price/dividend panel as handed over by a price provider
//!
//! The panel is keyed by instrument symbol, each instrument owning its own
//! date-sorted series. Only trading days appear as rows; calendar gaps are
//! closed later by the normalizer.

use jiff::civil::Date;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One trading day of one instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: Date,
    /// Closing price; `None` when the provider reported a row without a close
    pub close: Option<f64>,
    /// Cash dividend per share paid on this date
    #[serde(default)]
    pub dividend: f64,
}

impl PriceRow {
    pub fn new(date: Date, close: f64) -> Self {
        Self {
            date,
            close: Some(close),
            dividend: 0.0,
        }
    }

    #[must_use]
    pub fn with_dividend(mut self, dividend: f64) -> Self {
        self.dividend = dividend;
        self
    }
}

/// Daily history for a single instrument, sorted by date with unique dates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSeries {
    pub symbol: String,
    pub rows: Vec<PriceRow>,
}

impl InstrumentSeries {
    /// Build a series, sorting rows by date and keeping the first row seen for
    /// any repeated date.
    pub fn new(symbol: impl Into<String>, mut rows: Vec<PriceRow>) -> Self {
        rows.sort_by_key(|r| r.date);
        rows.dedup_by_key(|r| r.date);
        Self {
            symbol: symbol.into(),
            rows,
        }
    }

    /// Whether any row inside `start..=end` carries a close
    pub fn has_close_between(&self, start: Date, end: Date) -> bool {
        self.rows
            .iter()
            .any(|r| r.date >= start && r.date <= end && r.close.is_some())
    }
}

/// Collection of instrument series addressed by symbol
#[derive(Debug, Clone, Default)]
pub struct PricePanel {
    series: Vec<InstrumentSeries>,
    by_symbol: FxHashMap<String, usize>,
}

impl PricePanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the series for its symbol
    pub fn insert(&mut self, series: InstrumentSeries) {
        match self.by_symbol.get(&series.symbol) {
            Some(&idx) => self.series[idx] = series,
            None => {
                self.by_symbol
                    .insert(series.symbol.clone(), self.series.len());
                self.series.push(series);
            }
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&InstrumentSeries> {
        self.by_symbol.get(symbol).map(|&idx| &self.series[idx])
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.symbol.as_str())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl FromIterator<InstrumentSeries> for PricePanel {
    fn from_iter<T: IntoIterator<Item = InstrumentSeries>>(iter: T) -> Self {
        let mut panel = PricePanel::new();
        for series in iter {
            panel.insert(series);
        }
        panel
    }
}
