//! Cooldown controller
//!
//! Tracks, per instrument, the contributions it received inside a sliding
//! lookback window. An instrument that collects more than one contribution
//! inside the window is quarantined for its current quarantine length, and
//! that length grows by a fixed increment for the next time. Quarantined
//! instruments are not eligible for contributions until the first
//! contribution day on or after their release date.

use jiff::civil::Date;

use crate::config::CooldownConfig;
use crate::date_math::add_months;
use crate::model::InstrumentId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownState {
    /// Contribution dates still inside the lookback window
    pub recent_contributions: Vec<Date>,
    pub quarantine_until: Option<Date>,
    /// Length of the next quarantine, in months
    pub quarantine_months: i32,
}

/// Outcome of recording one contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownOutcome {
    Clear,
    Quarantined { until: Date, months: i32 },
}

#[derive(Debug, Clone)]
pub struct CooldownController {
    config: CooldownConfig,
    states: Vec<CooldownState>,
}

impl CooldownController {
    pub fn new(config: CooldownConfig, instruments: usize) -> Self {
        let state = CooldownState {
            recent_contributions: Vec::new(),
            quarantine_until: None,
            quarantine_months: config.initial_quarantine_months,
        };
        Self {
            config,
            states: vec![state; instruments],
        }
    }

    pub fn state(&self, instrument: InstrumentId) -> &CooldownState {
        &self.states[instrument.index()]
    }

    /// Release every instrument whose quarantine has ended by `today`,
    /// returning the released ids in id order.
    pub fn lift_expired(&mut self, today: Date) -> Vec<InstrumentId> {
        let mut lifted = Vec::new();
        for (idx, state) in self.states.iter_mut().enumerate() {
            if state.quarantine_until.is_some_and(|until| today >= until) {
                state.quarantine_until = None;
                lifted.push(InstrumentId(idx as u16));
            }
        }
        lifted
    }

    #[inline]
    pub fn is_eligible(&self, instrument: InstrumentId) -> bool {
        self.states[instrument.index()].quarantine_until.is_none()
    }

    /// Record that `instrument` was selected on `today`, pruning the lookback
    /// window and starting a quarantine when it now holds more than one date.
    pub fn record_contribution(&mut self, instrument: InstrumentId, today: Date) -> CooldownOutcome {
        let threshold = add_months(today, -self.config.lookback_months);
        let increment = self.config.quarantine_increment_months;
        let state = &mut self.states[instrument.index()];

        state.recent_contributions.push(today);
        state.recent_contributions.retain(|d| *d >= threshold);

        if state.recent_contributions.len() <= 1 {
            return CooldownOutcome::Clear;
        }

        let months = state.quarantine_months;
        let until = add_months(today, months);
        state.quarantine_until = Some(until);
        state.quarantine_months = state.quarantine_months.saturating_add(increment);
        CooldownOutcome::Quarantined { until, months }
    }
}
