//! Ledger of notable state changes during a run
//!
//! Daily valuations live in the result rows; the ledger records the discrete
//! decisions the engine made so a run can be audited after the fact.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::ids::{Destination, InstrumentId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: Date,
    pub event: SimEvent,
}

impl LedgerEntry {
    pub fn new(date: Date, event: SimEvent) -> Self {
        Self { date, event }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// Initial lump-sum purchase
    InitialPurchase {
        instrument: InstrumentId,
        amount: f64,
        price: f64,
        shares: f64,
    },

    /// Monthly cash credited to the run (already inflation adjusted)
    ContributionReceived { amount: f64 },

    /// Part of a contribution turned into shares or sleeve balance
    Allocation {
        destination: Destination,
        amount: f64,
        shares: f64,
    },

    /// A selected instrument could not be bought at a non-positive price
    PurchaseSkipped {
        instrument: InstrumentId,
        amount: f64,
        price: f64,
    },

    /// No destination was eligible; the cash counts as invested but is not
    /// held by any position
    Undeployed { amount: f64 },

    DividendReinvested {
        instrument: InstrumentId,
        dividend_per_share: f64,
        shares_added: f64,
    },

    QuarantineStarted {
        instrument: InstrumentId,
        until: Date,
        months: i32,
    },

    QuarantineLifted { instrument: InstrumentId },
}
