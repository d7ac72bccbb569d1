//! Lump-sum (buy-and-hold) simulator
//!
//! Each valid instrument receives the same fixed amount at its first
//! positive close. After that no cash enters; dividends are reinvested at the
//! close of the day they are paid.

use std::collections::BTreeMap;

use crate::benchmark::{Benchmarks, growth_curve, inflation_plus_spread};
use crate::calendar::NormalizedPanel;
use crate::config::LumpSumConfig;
use crate::error::{Result, SimulationError};
use crate::model::{
    BenchmarkColumns, DailyRow, InstrumentValue, LedgerEntry, ResultCurve, ScenarioKind, SimEvent,
};

/// Shares of one instrument bought with the lump sum
#[derive(Debug, Clone, Copy, Default)]
struct Position {
    shares: f64,
    bought: bool,
}

pub fn simulate_lump_sum(
    panel: &NormalizedPanel,
    benchmarks: &Benchmarks,
    config: &LumpSumConfig,
) -> Result<ResultCurve> {
    config.validate()?;
    check_panel(panel)?;

    let amount = config.amount_per_instrument;
    let initial_investment = amount * panel.instruments().len() as f64;
    let mut positions = vec![Position::default(); panel.instruments().len()];
    let mut ledger = Vec::new();
    let mut rows = Vec::with_capacity(panel.len());

    for (day, &date) in panel.dates().iter().enumerate() {
        let mut holdings = Vec::with_capacity(positions.len());
        let mut total = 0.0;

        for id in panel.instrument_ids() {
            let bar = panel.bar(id, day);
            let position = &mut positions[id.index()];

            if let Some(close) = bar.close.filter(|c| *c > 0.0) {
                if !position.bought {
                    position.shares = amount / close;
                    position.bought = true;
                    ledger.push(LedgerEntry::new(
                        date,
                        SimEvent::InitialPurchase {
                            instrument: id,
                            amount,
                            price: close,
                            shares: position.shares,
                        },
                    ));
                }
                if bar.dividend > 0.0 && position.shares > 0.0 {
                    let added = position.shares * bar.dividend / close;
                    position.shares += added;
                    ledger.push(LedgerEntry::new(
                        date,
                        SimEvent::DividendReinvested {
                            instrument: id,
                            dividend_per_share: bar.dividend,
                            shares_added: added,
                        },
                    ));
                }
            }

            let value = position.shares * bar.close.unwrap_or(0.0);
            total += value;
            holdings.push(InstrumentValue {
                instrument: id,
                shares: position.shares,
                value,
            });
        }

        rows.push(DailyRow {
            date,
            trading: panel.is_trading(day),
            holdings,
            sleeve: None,
            total,
            invested: initial_investment,
        });
    }

    let growth = benchmarks
        .growth()
        .map(|series| growth_curve(panel.dates(), initial_investment, series));
    let inflation_plus_spread = match (benchmarks.inflation(), config.real_rate_spread) {
        (Some(inflation), Some(rate)) => {
            let invested = vec![initial_investment; panel.len()];
            Some(inflation_plus_spread(panel.dates(), &invested, inflation, rate))
        }
        _ => None,
    };

    tracing::debug!(
        instruments = panel.instruments().len(),
        days = rows.len(),
        "lump-sum run finished"
    );

    Ok(ResultCurve {
        scenario: ScenarioKind::LumpSum,
        instruments: panel.instruments().to_vec(),
        dropped: panel.dropped().to_vec(),
        rows,
        benchmarks: BenchmarkColumns {
            growth,
            inflation_plus_spread,
        },
        contributions: Vec::new(),
        destination_totals: BTreeMap::new(),
        ledger,
    })
}

/// Hard stops shared by every simulator
pub(crate) fn check_panel(panel: &NormalizedPanel) -> Result<()> {
    if panel.is_empty() {
        return Err(SimulationError::EmptyWindow {
            start: panel.start,
            end: panel.end,
        });
    }
    if panel.instruments().is_empty() {
        return Err(SimulationError::NoValidInstruments {
            requested: panel.dropped().len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::normalize;
    use crate::model::{GrowthSeries, InstrumentId, InstrumentSeries, PricePanel, PriceRow};
    use jiff::civil::date;

    fn panel() -> PricePanel {
        PricePanel::from_iter([
            InstrumentSeries::new(
                "AAA",
                vec![
                    PriceRow::new(date(2020, 1, 2), 10.0),
                    PriceRow::new(date(2020, 1, 3), 10.0).with_dividend(1.0),
                    PriceRow::new(date(2020, 1, 6), 20.0),
                ],
            ),
            InstrumentSeries::new(
                "BBB",
                vec![
                    PriceRow::new(date(2020, 1, 3), 50.0),
                    PriceRow::new(date(2020, 1, 6), 25.0),
                ],
            ),
        ])
    }

    #[test]
    fn test_buys_at_first_close_and_reinvests_dividends() {
        let normalized = normalize(&panel(), &["AAA", "BBB"], date(2020, 1, 1), date(2020, 1, 7));
        let curve =
            simulate_lump_sum(&normalized, &Benchmarks::none(), &LumpSumConfig::new(1_000.0))
                .unwrap();

        let a = InstrumentId(0);
        let b = InstrumentId(1);
        // Nothing known on Jan 1
        assert_eq!(curve.rows[0].total, 0.0);
        assert_eq!(curve.rows[1].shares_of(a), Some(100.0));
        // 100 shares × 1.0 / 10.0 reinvested on Jan 3
        assert_eq!(curve.rows[2].shares_of(a), Some(110.0));
        assert_eq!(curve.rows[2].shares_of(b), Some(20.0));
        // Jan 6: 110 × 20 + 20 × 25
        assert!((curve.final_total() - 2_700.0).abs() < 1e-9);
        assert!(curve.rows.iter().all(|r| r.invested == 2_000.0));
    }

    #[test]
    fn test_weekend_values_carry_forward() {
        let normalized = normalize(&panel(), &["AAA"], date(2020, 1, 1), date(2020, 1, 7));
        let curve =
            simulate_lump_sum(&normalized, &Benchmarks::none(), &LumpSumConfig::new(1_000.0))
                .unwrap();
        assert_eq!(curve.rows[3].total, curve.rows[2].total);
        assert_eq!(curve.rows[4].total, curve.rows[2].total);
        assert!(!curve.rows[3].trading);
    }

    #[test]
    fn test_growth_benchmark_compounds_initial_investment() {
        let normalized = normalize(&panel(), &["AAA"], date(2020, 1, 1), date(2020, 1, 7));
        let growth = GrowthSeries::from_factors([(date(2020, 1, 2), 1.01), (date(2020, 1, 3), 1.01)]);
        let curve = simulate_lump_sum(
            &normalized,
            &Benchmarks::none().with_growth(growth),
            &LumpSumConfig::new(1_000.0),
        )
        .unwrap();

        let column = curve.benchmarks.growth.unwrap();
        assert_eq!(column.len(), curve.rows.len());
        assert_eq!(column[0], 1_000.0);
        assert!((column[6] - 1_000.0 * 1.01 * 1.01).abs() < 1e-9);
        assert!(curve.benchmarks.inflation_plus_spread.is_none());
    }

    #[test]
    fn test_no_valid_instruments_is_a_hard_stop() {
        let normalized = normalize(&panel(), &["ZZZ"], date(2020, 1, 1), date(2020, 1, 7));
        let err = simulate_lump_sum(&normalized, &Benchmarks::none(), &LumpSumConfig::new(1.0))
            .unwrap_err();
        assert_eq!(err, SimulationError::NoValidInstruments { requested: 1 });
    }
}
