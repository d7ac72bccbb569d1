//! Simulation output: one row per calendar day plus run-level ledgers
//!
//! Curves are produced once by a simulator and then only read. Benchmark
//! columns are `None` as a whole when their input series was absent, so a
//! consumer never sees a partially-populated benchmark.

use std::collections::BTreeMap;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::ids::{Destination, Instrument, InstrumentId};
use super::ledger::{LedgerEntry, SimEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScenarioKind {
    LumpSum,
    Recurring,
    Mixed,
}

impl ScenarioKind {
    pub fn label(self) -> &'static str {
        match self {
            ScenarioKind::LumpSum => "lump-sum",
            ScenarioKind::Recurring => "monthly",
            ScenarioKind::Mixed => "mixed",
        }
    }
}

/// Holding of one instrument at the end of a day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstrumentValue {
    pub instrument: InstrumentId,
    pub shares: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRow {
    pub date: Date,
    /// Whether the panel had market data for this date
    pub trading: bool,
    /// One entry per valid instrument, in instrument id order
    pub holdings: Vec<InstrumentValue>,
    /// Fixed-income sleeve balance (mixed-allocation runs only)
    pub sleeve: Option<f64>,
    /// Sum of holdings plus the sleeve
    pub total: f64,
    /// Cumulative capital put into the run up to and including this date
    pub invested: f64,
}

impl DailyRow {
    pub fn value_of(&self, instrument: InstrumentId) -> Option<f64> {
        self.holdings
            .iter()
            .find(|h| h.instrument == instrument)
            .map(|h| h.value)
    }

    pub fn shares_of(&self, instrument: InstrumentId) -> Option<f64> {
        self.holdings
            .iter()
            .find(|h| h.instrument == instrument)
            .map(|h| h.shares)
    }
}

/// One month's contribution and where it went
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyContribution {
    pub date: Date,
    pub amount: f64,
    /// Recipients in selection order; empty when nothing was eligible
    pub destinations: Vec<Destination>,
}

impl MonthlyContribution {
    pub fn was_deployed(&self) -> bool {
        !self.destinations.is_empty()
    }
}

/// Running totals per contribution destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationTotals {
    pub contributions: u32,
    pub amount: f64,
}

/// Benchmark curves aligned with the rows of a [`ResultCurve`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkColumns {
    /// Money-market growth-factor benchmark
    pub growth: Option<Vec<f64>>,
    /// Fixed real rate over monthly inflation
    pub inflation_plus_spread: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultCurve {
    pub scenario: ScenarioKind,
    /// Instruments that took part in the run, indexed by id
    pub instruments: Vec<Instrument>,
    /// Requested symbols that had no usable data and were left out
    pub dropped: Vec<String>,
    pub rows: Vec<DailyRow>,
    pub benchmarks: BenchmarkColumns,
    pub contributions: Vec<MonthlyContribution>,
    pub destination_totals: BTreeMap<Destination, DestinationTotals>,
    pub ledger: Vec<LedgerEntry>,
}

impl ResultCurve {
    pub fn start_date(&self) -> Option<Date> {
        self.rows.first().map(|r| r.date)
    }

    pub fn end_date(&self) -> Option<Date> {
        self.rows.last().map(|r| r.date)
    }

    pub fn final_row(&self) -> Option<&DailyRow> {
        self.rows.last()
    }

    pub fn final_total(&self) -> f64 {
        self.rows.last().map_or(0.0, |r| r.total)
    }

    pub fn total_invested(&self) -> f64 {
        self.rows.last().map_or(0.0, |r| r.invested)
    }

    pub fn symbol(&self, id: InstrumentId) -> Option<&str> {
        self.instruments.get(id.index()).map(|i| i.symbol.as_str())
    }

    /// Human-readable name of a destination
    pub fn destination_label(&self, destination: Destination) -> String {
        match destination {
            Destination::Sleeve => "fixed-income".to_string(),
            Destination::Instrument(id) => self
                .symbol(id)
                .map_or_else(|| format!("#{}", id.0), str::to_string),
        }
    }

    /// Row index for a date, if inside the run
    pub fn row_index(&self, date: Date) -> Option<usize> {
        self.rows.binary_search_by_key(&date, |r| r.date).ok()
    }

    /// Time series of one instrument's share count
    pub fn shares_history(&self, id: InstrumentId) -> Vec<f64> {
        self.rows
            .iter()
            .map(|r| r.shares_of(id).unwrap_or(0.0))
            .collect()
    }

    /// Sum of contributions that ended up held by no position
    pub fn undeployed_total(&self) -> f64 {
        self.ledger
            .iter()
            .map(|e| match e.event {
                SimEvent::Undeployed { amount } | SimEvent::PurchaseSkipped { amount, .. } => {
                    amount
                }
                _ => 0.0,
            })
            .sum()
    }

    /// Quarantine start dates for an instrument, in order
    pub fn quarantine_starts(&self, id: InstrumentId) -> impl Iterator<Item = (Date, Date)> + '_ {
        self.ledger.iter().filter_map(move |e| match e.event {
            SimEvent::QuarantineStarted {
                instrument, until, ..
            } if instrument == id => Some((e.date, until)),
            _ => None,
        })
    }

    /// Destinations ranked by how many contributions they received
    /// (descending), ties by destination order
    pub fn contribution_counts(&self) -> Vec<(Destination, DestinationTotals)> {
        let mut counts: Vec<_> = self
            .destination_totals
            .iter()
            .map(|(d, t)| (*d, *t))
            .collect();
        counts.sort_by(|a, b| b.1.contributions.cmp(&a.1.contributions));
        counts
    }
}

/// Consumer of finished result curves (file export, plotting, ...).
///
/// Sinks receive curves exactly as the simulators produced them; any
/// resampling happens inside the sink.
pub trait ResultSink {
    type Error;

    fn accept(&mut self, curve: &ResultCurve) -> Result<(), Self::Error>;
}
