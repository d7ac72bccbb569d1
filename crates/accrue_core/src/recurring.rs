//! Recurring-contribution simulator
//!
//! Walks the calendar one day at a time. The first trading day of each month
//! is a contribution day: the inflation-adjusted amount is credited, expired
//! quarantines are lifted and the cash goes to the lowest-valued eligible
//! instruments (or to the fixed-income sleeve when one is configured and
//! below its target share). Every day then compounds the benchmark and the
//! sleeve, reinvests dividends and records a row.
//!
//! Non-trading days still produce rows. Closes are already carried forward by
//! the normalizer, so their valuations repeat the last trading day.

use std::collections::BTreeMap;

use jiff::civil::Date;

use crate::benchmark::{Benchmarks, GrowthAccount, inflation_plus_spread};
use crate::calendar::NormalizedPanel;
use crate::config::{RecurringConfig, SleeveConfig};
use crate::cooldown::{CooldownController, CooldownOutcome};
use crate::date_math::month_key;
use crate::error::Result;
use crate::lump_sum::check_panel;
use crate::model::{
    BenchmarkColumns, DailyRow, Destination, DestinationTotals, GrowthSeries, InstrumentId,
    InstrumentValue, LedgerEntry, MonthlyContribution, ResultCurve, ScenarioKind, SimEvent,
};

/// Mutable state of one recurring run
struct RecurringState<'a> {
    panel: &'a NormalizedPanel,
    config: &'a RecurringConfig,
    portfolio: SimPortfolio,
    cooldown: Option<CooldownController>,
    history: SimHistory,
    last_month: Option<(i16, i8)>,
}

struct SimPortfolio {
    /// Shares per instrument, indexed by id
    shares: Vec<f64>,
    /// Fixed-income balance, present only in mixed runs
    sleeve: Option<f64>,
    invested: f64,
    growth: Option<GrowthAccount>,
}

#[derive(Default)]
struct SimHistory {
    rows: Vec<DailyRow>,
    growth: Vec<f64>,
    contributions: Vec<MonthlyContribution>,
    destination_totals: BTreeMap<Destination, DestinationTotals>,
    ledger: Vec<LedgerEntry>,
}

pub fn simulate_recurring(
    panel: &NormalizedPanel,
    benchmarks: &Benchmarks,
    config: &RecurringConfig,
) -> Result<ResultCurve> {
    config.validate()?;
    check_panel(panel)?;

    let growth_series = benchmarks.growth();
    let mut state = RecurringState::new(panel, config, growth_series.is_some());

    if let Some(cooldown) = &config.cooldown {
        tracing::info!(
            lookback_months = cooldown.lookback_months,
            initial_months = cooldown.initial_quarantine_months,
            increment_months = cooldown.quarantine_increment_months,
            "cooldown enabled"
        );
    }

    for (day, &date) in panel.dates().iter().enumerate() {
        if panel.is_trading(day) && state.last_month != Some(month_key(date)) {
            state.last_month = Some(month_key(date));
            let amount = config.base_contribution * benchmarks.contribution_index(date);
            state.contribute(day, date, amount);
        }

        state.compound(growth_series, date);
        if panel.is_trading(day) {
            state.reinvest_dividends(day, date);
        }
        state.record_day(day, date);
    }

    Ok(state.finish(benchmarks))
}

impl<'a> RecurringState<'a> {
    fn new(panel: &'a NormalizedPanel, config: &'a RecurringConfig, has_growth: bool) -> Self {
        let n = panel.instruments().len();
        Self {
            panel,
            config,
            portfolio: SimPortfolio {
                shares: vec![0.0; n],
                sleeve: config.sleeve.map(|_| 0.0),
                invested: 0.0,
                growth: has_growth.then(GrowthAccount::new),
            },
            cooldown: config.cooldown.map(|c| CooldownController::new(c, n)),
            history: SimHistory::default(),
            last_month: None,
        }
    }

    fn symbol(&self, id: InstrumentId) -> &str {
        &self.panel.instruments()[id.index()].symbol
    }

    #[inline]
    fn holding_value(&self, id: InstrumentId, day: usize) -> f64 {
        self.portfolio.shares[id.index()] * self.panel.close(id, day).unwrap_or(0.0)
    }

    fn contribute(&mut self, day: usize, date: Date, amount: f64) {
        self.portfolio.invested += amount;
        if let Some(growth) = &mut self.portfolio.growth {
            growth.credit(amount);
        }
        self.log(date, SimEvent::ContributionReceived { amount });

        self.lift_quarantines(date);

        let to_sleeve = self
            .config
            .sleeve
            .is_some_and(|sleeve| self.sleeve_below_target(day, sleeve));
        let destinations = if to_sleeve {
            self.fund_sleeve(date, amount);
            vec![Destination::Sleeve]
        } else {
            self.fund_lowest(day, date, amount)
        };

        tracing::trace!(%date, amount, recipients = destinations.len(), "contribution");
        self.history.contributions.push(MonthlyContribution {
            date,
            amount,
            destinations,
        });
    }

    fn lift_quarantines(&mut self, date: Date) {
        let Some(cooldown) = &mut self.cooldown else {
            return;
        };
        for id in cooldown.lift_expired(date) {
            tracing::info!(instrument = self.symbol(id), %date, "quarantine lifted");
            self.history
                .ledger
                .push(LedgerEntry::new(date, SimEvent::QuarantineLifted { instrument: id }));
        }
    }

    fn sleeve_below_target(&self, day: usize, sleeve: SleeveConfig) -> bool {
        let sleeve_value = self.portfolio.sleeve.unwrap_or(0.0);
        let equity: f64 = self
            .panel
            .instrument_ids()
            .map(|id| self.holding_value(id, day))
            .sum();
        let total = equity + sleeve_value;
        total <= 0.0 || sleeve_value / total < sleeve.target_ratio
    }

    fn fund_sleeve(&mut self, date: Date, amount: f64) {
        if let Some(sleeve) = &mut self.portfolio.sleeve {
            *sleeve += amount;
        }
        self.credit_destination(Destination::Sleeve, amount);
        self.log(
            date,
            SimEvent::Allocation {
                destination: Destination::Sleeve,
                amount,
                shares: 0.0,
            },
        );
    }

    /// Split `amount` over the lowest-valued eligible instruments. Returns
    /// the recipients in selection order.
    fn fund_lowest(&mut self, day: usize, date: Date, amount: f64) -> Vec<Destination> {
        let selected = self.rank_candidates(day);
        if selected.is_empty() {
            tracing::warn!(%date, amount, "no eligible instrument, contribution left undeployed");
            self.log(date, SimEvent::Undeployed { amount });
            return Vec::new();
        }

        let per_instrument = amount / selected.len() as f64;
        for &id in &selected {
            self.buy(id, day, date, per_instrument);
            self.credit_destination(Destination::Instrument(id), per_instrument);
            self.track_cooldown(id, date);
        }

        selected.into_iter().map(Destination::Instrument).collect()
    }

    /// Eligible instruments with a known close, cheapest holding first. The
    /// sort is stable, so equal values keep instrument order.
    fn rank_candidates(&self, day: usize) -> Vec<InstrumentId> {
        let mut candidates: Vec<(InstrumentId, f64)> = self
            .panel
            .instrument_ids()
            .filter(|id| self.cooldown.as_ref().is_none_or(|c| c.is_eligible(*id)))
            .filter(|id| self.panel.close(*id, day).is_some())
            .map(|id| (id, self.holding_value(id, day)))
            .collect();
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
        candidates
            .into_iter()
            .take(self.config.split_count)
            .map(|(id, _)| id)
            .collect()
    }

    fn buy(&mut self, id: InstrumentId, day: usize, date: Date, amount: f64) {
        let price = self.panel.close(id, day).unwrap_or(0.0);
        if price > 0.0 {
            let shares = amount / price;
            self.portfolio.shares[id.index()] += shares;
            self.log(
                date,
                SimEvent::Allocation {
                    destination: Destination::Instrument(id),
                    amount,
                    shares,
                },
            );
        } else {
            tracing::warn!(instrument = self.symbol(id), %date, price, "non-positive price, purchase skipped");
            self.log(
                date,
                SimEvent::PurchaseSkipped {
                    instrument: id,
                    amount,
                    price,
                },
            );
        }
    }

    fn track_cooldown(&mut self, id: InstrumentId, date: Date) {
        let Some(cooldown) = &mut self.cooldown else {
            return;
        };
        if let CooldownOutcome::Quarantined { until, months } = cooldown.record_contribution(id, date)
        {
            tracing::info!(instrument = self.symbol(id), %date, %until, months, "quarantine started");
            self.log(
                date,
                SimEvent::QuarantineStarted {
                    instrument: id,
                    until,
                    months,
                },
            );
        }
    }

    fn credit_destination(&mut self, destination: Destination, amount: f64) {
        let totals = self
            .history
            .destination_totals
            .entry(destination)
            .or_default();
        totals.contributions += 1;
        totals.amount += amount;
    }

    fn compound(&mut self, series: Option<&GrowthSeries>, date: Date) {
        let Some(series) = series else {
            return;
        };
        if let Some(growth) = &mut self.portfolio.growth {
            growth.compound(series, date);
        }
        if let (Some(sleeve), Some(factor)) = (&mut self.portfolio.sleeve, series.factor_on(date)) {
            *sleeve *= factor;
        }
    }

    fn reinvest_dividends(&mut self, day: usize, date: Date) {
        for id in self.panel.instrument_ids() {
            let bar = self.panel.bar(id, day);
            let shares = self.portfolio.shares[id.index()];
            let Some(close) = bar.close.filter(|c| *c > 0.0) else {
                continue;
            };
            if bar.dividend > 0.0 && shares > 0.0 {
                let added = shares * bar.dividend / close;
                self.portfolio.shares[id.index()] += added;
                self.log(
                    date,
                    SimEvent::DividendReinvested {
                        instrument: id,
                        dividend_per_share: bar.dividend,
                        shares_added: added,
                    },
                );
            }
        }
    }

    fn record_day(&mut self, day: usize, date: Date) {
        let holdings: Vec<InstrumentValue> = self
            .panel
            .instrument_ids()
            .map(|id| InstrumentValue {
                instrument: id,
                shares: self.portfolio.shares[id.index()],
                value: self.holding_value(id, day),
            })
            .collect();
        let total =
            holdings.iter().map(|h| h.value).sum::<f64>() + self.portfolio.sleeve.unwrap_or(0.0);

        if let Some(growth) = &self.portfolio.growth {
            self.history.growth.push(growth.value());
        }
        self.history.rows.push(DailyRow {
            date,
            trading: self.panel.is_trading(day),
            holdings,
            sleeve: self.portfolio.sleeve,
            total,
            invested: self.portfolio.invested,
        });
    }

    fn log(&mut self, date: Date, event: SimEvent) {
        self.history.ledger.push(LedgerEntry::new(date, event));
    }

    fn finish(self, benchmarks: &Benchmarks) -> ResultCurve {
        let RecurringState {
            panel,
            config,
            portfolio,
            history,
            ..
        } = self;

        let inflation_plus_spread = match (benchmarks.inflation(), config.real_rate_spread) {
            (Some(inflation), Some(rate)) => {
                let invested: Vec<f64> = history.rows.iter().map(|r| r.invested).collect();
                Some(inflation_plus_spread(panel.dates(), &invested, inflation, rate))
            }
            _ => None,
        };

        let scenario = if config.sleeve.is_some() {
            ScenarioKind::Mixed
        } else {
            ScenarioKind::Recurring
        };

        tracing::debug!(
            scenario = scenario.label(),
            months = history.contributions.len(),
            invested = portfolio.invested,
            "recurring run finished"
        );

        ResultCurve {
            scenario,
            instruments: panel.instruments().to_vec(),
            dropped: panel.dropped().to_vec(),
            rows: history.rows,
            benchmarks: BenchmarkColumns {
                growth: portfolio.growth.map(|_| history.growth),
                inflation_plus_spread,
            },
            contributions: history.contributions,
            destination_totals: history.destination_totals,
            ledger: history.ledger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::normalize;
    use crate::config::CooldownConfig;
    use crate::model::{InstrumentSeries, PricePanel, PriceRow};
    use jiff::civil::date;

    fn flat_panel(prices: &[(&str, f64)], start: Date, end: Date) -> PricePanel {
        prices
            .iter()
            .map(|(symbol, price)| {
                let rows = crate::date_math::calendar_days(start, end)
                    .into_iter()
                    .filter(|d| d.weekday().to_monday_one_offset() <= 5)
                    .map(|d| PriceRow::new(d, *price))
                    .collect();
                InstrumentSeries::new(*symbol, rows)
            })
            .collect()
    }

    #[test]
    fn test_contribution_on_first_trading_day_of_month() {
        // 2020-02-01 is a Saturday
        let start = date(2020, 1, 30);
        let end = date(2020, 2, 5);
        let panel = flat_panel(&[("AAA", 10.0)], start, end);
        let normalized = normalize(&panel, &["AAA"], start, end);
        let curve = simulate_recurring(
            &normalized,
            &Benchmarks::none(),
            &RecurringConfig::new(100.0),
        )
        .unwrap();

        let dates: Vec<_> = curve.contributions.iter().map(|c| c.date).collect();
        assert_eq!(dates, vec![date(2020, 1, 30), date(2020, 2, 3)]);
        assert_eq!(curve.total_invested(), 200.0);
    }

    #[test]
    fn test_split_count_divides_contribution() {
        let start = date(2020, 1, 1);
        let end = date(2020, 1, 31);
        let panel = flat_panel(&[("AAA", 10.0), ("BBB", 20.0), ("CCC", 5.0)], start, end);
        let normalized = normalize(&panel, &["AAA", "BBB", "CCC"], start, end);
        let curve = simulate_recurring(
            &normalized,
            &Benchmarks::none(),
            &RecurringConfig::new(900.0).split_count(2),
        )
        .unwrap();

        let first = &curve.contributions[0];
        // All at zero value: ties keep request order
        assert_eq!(
            first.destinations,
            vec![
                Destination::Instrument(InstrumentId(0)),
                Destination::Instrument(InstrumentId(1))
            ]
        );
        let last = curve.final_row().unwrap();
        assert_eq!(last.shares_of(InstrumentId(0)), Some(45.0));
        assert_eq!(last.shares_of(InstrumentId(1)), Some(22.5));
        assert_eq!(last.shares_of(InstrumentId(2)), Some(0.0));
    }

    #[test]
    fn test_all_quarantined_leaves_month_undeployed() {
        let start = date(2020, 1, 1);
        let end = date(2020, 3, 31);
        let panel = flat_panel(&[("AAA", 10.0)], start, end);
        let normalized = normalize(&panel, &["AAA"], start, end);
        let config = RecurringConfig::new(100.0).cooldown(CooldownConfig::new(3, 6, 12));
        let curve = simulate_recurring(&normalized, &Benchmarks::none(), &config).unwrap();

        assert_eq!(curve.contributions.len(), 3);
        assert!(curve.contributions[0].was_deployed());
        assert!(curve.contributions[1].was_deployed());
        assert!(!curve.contributions[2].was_deployed());
        assert_eq!(curve.total_invested(), 300.0);
        assert_eq!(curve.undeployed_total(), 100.0);
        assert!((curve.final_total() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_price_skips_purchase_but_counts_selection() {
        let start = date(2020, 1, 1);
        let end = date(2020, 1, 31);
        let panel = flat_panel(&[("AAA", 0.0)], start, end);
        let normalized = normalize(&panel, &["AAA"], start, end);
        let curve = simulate_recurring(
            &normalized,
            &Benchmarks::none(),
            &RecurringConfig::new(100.0),
        )
        .unwrap();

        assert_eq!(curve.final_row().unwrap().shares_of(InstrumentId(0)), Some(0.0));
        assert_eq!(curve.undeployed_total(), 100.0);
        assert_eq!(
            curve.destination_totals[&Destination::Instrument(InstrumentId(0))].contributions,
            1
        );
    }

    #[test]
    fn test_growth_account_receives_same_cash_flows() {
        let start = date(2020, 1, 1);
        let end = date(2020, 2, 29);
        let panel = flat_panel(&[("AAA", 10.0)], start, end);
        let normalized = normalize(&panel, &["AAA"], start, end);
        let growth = GrowthSeries::from_factors(
            normalized
                .dates()
                .iter()
                .enumerate()
                .filter(|(day, _)| normalized.is_trading(*day))
                .map(|(_, d)| (*d, 1.0)),
        );
        let curve = simulate_recurring(
            &normalized,
            &Benchmarks::none().with_growth(growth),
            &RecurringConfig::new(100.0),
        )
        .unwrap();

        let column = curve.benchmarks.growth.as_ref().unwrap();
        // Flat factor: the account mirrors invested capital
        for (row, value) in curve.rows.iter().zip(column) {
            assert!((row.invested - value).abs() < 1e-9);
        }
    }
}
