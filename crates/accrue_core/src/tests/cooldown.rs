//! Cooldown behavior inside full recurring runs

use jiff::civil::date;

use super::weekday_panel;
use crate::benchmark::Benchmarks;
use crate::calendar::normalize;
use crate::config::{CooldownConfig, RecurringConfig};
use crate::error::{ConfigError, SimulationError};
use crate::model::{Destination, InstrumentId, SimEvent};
use crate::recurring::simulate_recurring;
use crate::synthetic::SyntheticMarket;

const A: InstrumentId = InstrumentId(0);
const B: InstrumentId = InstrumentId(1);

fn quarantine_months(curve: &crate::model::ResultCurve, id: InstrumentId) -> Vec<i32> {
    curve
        .ledger
        .iter()
        .filter_map(|e| match e.event {
            SimEvent::QuarantineStarted {
                instrument, months, ..
            } if instrument == id => Some(months),
            _ => None,
        })
        .collect()
}

/// Selected in two consecutive months: quarantined, then skipped until release
#[test]
fn test_quarantine_activation_and_exclusion() {
    let start = date(2020, 1, 1);
    let end = date(2020, 8, 31);
    let panel = weekday_panel(&[("A", 10.0)], start, end);
    let normalized = normalize(&panel, &["A"], start, end);
    let config = RecurringConfig::new(100.0).cooldown(CooldownConfig::new(3, 6, 12));

    let curve = simulate_recurring(&normalized, &Benchmarks::none(), &config).unwrap();

    let starts: Vec<_> = curve.quarantine_starts(A).collect();
    assert_eq!(starts, vec![(date(2020, 2, 3), date(2020, 8, 3))]);

    let funded: Vec<_> = curve
        .contributions
        .iter()
        .filter(|c| c.destinations.contains(&Destination::Instrument(A)))
        .map(|c| c.date)
        .collect();
    // March through July are skipped; Aug 3 is the release date itself
    assert_eq!(
        funded,
        vec![date(2020, 1, 1), date(2020, 2, 3), date(2020, 8, 3)]
    );
    assert!(curve.ledger.iter().any(|e| e.date == date(2020, 8, 3)
        && matches!(e.event, SimEvent::QuarantineLifted { instrument } if instrument == A)));

    // Every undeployed month still counts as invested
    assert_eq!(curve.contributions.len(), 8);
    assert!((curve.total_invested() - 800.0).abs() < 1e-9);
    assert!((curve.undeployed_total() - 500.0).abs() < 1e-9);
}

/// Each re-trigger lengthens the quarantine by the increment
#[test]
fn test_quarantine_escalation() {
    let start = date(2020, 1, 1);
    let end = date(2022, 6, 30);
    let panel = weekday_panel(&[("A", 10.0)], start, end);
    let normalized = normalize(&panel, &["A"], start, end);
    let config = RecurringConfig::new(100.0).cooldown(CooldownConfig::new(3, 6, 12));

    let curve = simulate_recurring(&normalized, &Benchmarks::none(), &config).unwrap();

    assert_eq!(quarantine_months(&curve, A), vec![6, 6 + 12, 6 + 2 * 12]);
    let releases: Vec<_> = curve.quarantine_starts(A).map(|(_, until)| until).collect();
    assert_eq!(
        releases,
        vec![date(2020, 8, 3), date(2022, 3, 1), date(2024, 10, 1)]
    );
}

/// While one instrument sits out, the others take the cash
#[test]
fn test_quarantined_instrument_yields_to_others() {
    let start = date(2020, 1, 1);
    let end = date(2020, 12, 31);
    let panel = weekday_panel(&[("A", 10.0), ("B", 10.0)], start, end);
    let normalized = normalize(&panel, &["A", "B"], start, end);
    let config = RecurringConfig::new(100.0).cooldown(CooldownConfig::new(3, 6, 12));

    let curve = simulate_recurring(&normalized, &Benchmarks::none(), &config).unwrap();

    for id in [A, B] {
        for (from, until) in curve.quarantine_starts(id) {
            assert!(
                curve
                    .contributions
                    .iter()
                    .filter(|c| c.date > from && c.date < until)
                    .all(|c| !c.destinations.contains(&Destination::Instrument(id))),
                "{id:?} funded while quarantined"
            );
        }
    }
    assert!(curve.quarantine_starts(A).next().is_some());
}

#[test]
fn test_cooldown_tracks_every_selected_instrument() {
    let start = date(2020, 1, 1);
    let end = date(2020, 2, 29);
    let panel = weekday_panel(&[("A", 10.0), ("B", 10.0)], start, end);
    let normalized = normalize(&panel, &["A", "B"], start, end);
    let config = RecurringConfig::new(100.0)
        .split_count(2)
        .cooldown(CooldownConfig::default());

    let curve = simulate_recurring(&normalized, &Benchmarks::none(), &config).unwrap();

    assert_eq!(quarantine_months(&curve, A), vec![6]);
    assert_eq!(quarantine_months(&curve, B), vec![6]);
}

#[test]
fn test_quarantine_windows_hold_on_synthetic_market() {
    let start = date(2015, 1, 1);
    let end = date(2019, 12, 31);
    let panel = SyntheticMarket::new(11)
        .instruments(5)
        .dividend_yield(0.03)
        .price_panel(start, end);
    let symbols: Vec<_> = panel.symbols().map(str::to_string).collect();
    let normalized = normalize(&panel, &symbols, start, end);
    let config = RecurringConfig::new(1_000.0)
        .split_count(2)
        .cooldown(CooldownConfig::default());

    let curve = simulate_recurring(&normalized, &Benchmarks::none(), &config).unwrap();

    for id in normalized.instrument_ids() {
        let months = quarantine_months(&curve, id);
        for (n, m) in months.iter().enumerate() {
            assert_eq!(*m, 6 + 12 * n as i32);
        }
        for (from, until) in curve.quarantine_starts(id) {
            assert!(
                curve
                    .contributions
                    .iter()
                    .filter(|c| c.date > from && c.date < until)
                    .all(|c| !c.destinations.contains(&Destination::Instrument(id)))
            );
        }
    }
}

#[test]
fn test_oversized_cooldown_is_rejected_before_the_walk() {
    let start = date(2020, 1, 1);
    let end = date(2020, 2, 29);
    let panel = weekday_panel(&[("A", 10.0)], start, end);
    let normalized = normalize(&panel, &["A"], start, end);

    for cooldown in [CooldownConfig::new(3, 120_000, 12), CooldownConfig::new(200_000, 6, 12)] {
        let config = RecurringConfig::new(100.0).cooldown(cooldown);
        let result = simulate_recurring(&normalized, &Benchmarks::none(), &config);
        assert!(matches!(
            result,
            Err(SimulationError::InvalidConfig(ConfigError::MonthsTooLarge { .. }))
        ));
    }

    // The longest accepted quarantine still fits the calendar
    let max = crate::config::MAX_COOLDOWN_MONTHS;
    let config = RecurringConfig::new(100.0).cooldown(CooldownConfig::new(max, max, max));
    let curve = simulate_recurring(&normalized, &Benchmarks::none(), &config).unwrap();
    let starts: Vec<_> = curve.quarantine_starts(A).collect();
    assert_eq!(starts, vec![(date(2020, 2, 3), date(2120, 2, 3))]);
}
