//! Identifiers for simulation entities

use serde::{Deserialize, Serialize};

/// Position of a valid instrument within a normalized panel.
///
/// Ids are assigned in the order instruments were requested, so iterating ids
/// in ascending order reproduces the caller's instrument order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstrumentId(pub u16);

impl InstrumentId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A valid instrument: its id plus the symbol it was requested under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: InstrumentId,
    pub symbol: String,
}

/// Where a month's contribution went
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Destination {
    /// The fixed-income sleeve of the mixed-allocation variant
    Sleeve,
    Instrument(InstrumentId),
}
