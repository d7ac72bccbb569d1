//! Console summaries of finished runs

use accrue_core::model::{ResultCurve, ScenarioKind};
use accrue_core::sweep::SweepPoint;
use accrue_core::{LumpSumSummary, RecurringSummary, SimulationError};

use crate::util::format::{format_amount, format_percentage};

fn title(scenario: ScenarioKind) -> &'static str {
    match scenario {
        ScenarioKind::LumpSum => "Lump sum",
        ScenarioKind::Recurring => "Monthly contributions",
        ScenarioKind::Mixed => "Mixed allocation",
    }
}

/// Full text report for one curve
pub fn scenario_report(curve: &ResultCurve) -> String {
    let mut lines = vec![format!("--- {} ---", title(curve.scenario))];
    if !curve.dropped.is_empty() {
        lines.push(format!("Skipped (no data): {}", curve.dropped.join(", ")));
    }

    match curve.scenario {
        ScenarioKind::LumpSum => match LumpSumSummary::from_curve(curve) {
            Some(summary) => lines.extend(lump_sum_lines(&summary)),
            None => lines.push("No rows were produced.".to_string()),
        },
        ScenarioKind::Recurring | ScenarioKind::Mixed => match RecurringSummary::from_curve(curve) {
            Some(summary) => {
                lines.extend(recurring_lines(&summary));
                lines.extend(destination_lines(curve, &summary));
            }
            None => lines.push("No rows were produced.".to_string()),
        },
    }

    lines.join("\n")
}

fn period_line(start: jiff::civil::Date, end: jiff::civil::Date, years: f64) -> String {
    format!("Period: {start} to {end} ({years:.1} years)")
}

pub fn lump_sum_lines(summary: &LumpSumSummary) -> Vec<String> {
    let mut lines = vec![
        period_line(summary.start, summary.end, summary.years),
        format!("Initial investment: {}", format_amount(summary.initial_investment)),
        format!(
            "Portfolio:  {} | CAGR: {}",
            format_amount(summary.final_value),
            format_percentage(summary.cagr)
        ),
    ];
    for (label, outcome) in [
        ("Money mkt:", &summary.growth),
        ("Infl+real:", &summary.inflation_plus_spread),
    ] {
        if let Some(outcome) = outcome {
            lines.push(format!(
                "{label}  {} | CAGR: {}",
                format_amount(outcome.final_value),
                format_percentage(outcome.rate)
            ));
        }
    }
    lines
}

pub fn recurring_lines(summary: &RecurringSummary) -> Vec<String> {
    let mut lines = vec![
        period_line(summary.start, summary.end, summary.years),
        format!(
            "Total invested (inflation adjusted): {}",
            format_amount(summary.total_invested)
        ),
    ];

    let Some(roi) = summary.return_on_investment.filter(|_| summary.has_contributions()) else {
        lines.push(format!("Portfolio:  {}", format_amount(summary.final_value)));
        lines.push("WARNING: no contribution was processed.".to_string());
        return lines;
    };

    lines.push(format!(
        "Portfolio:  {} | Return on investment: {}",
        format_amount(summary.final_value),
        format_percentage(roi)
    ));
    for (label, outcome) in [
        ("Money mkt:", &summary.growth),
        ("Infl+real:", &summary.inflation_plus_spread),
    ] {
        if let Some(outcome) = outcome {
            lines.push(format!(
                "{label}  {} | Return on investment: {}",
                format_amount(outcome.final_value),
                format_percentage(outcome.rate)
            ));
        }
    }
    if summary.undeployed > 0.0 {
        lines.push(format!(
            "Undeployed (held as cash): {}",
            format_amount(summary.undeployed)
        ));
    }
    lines
}

/// Ranked table of contributions per destination
pub fn destination_lines(curve: &ResultCurve, summary: &RecurringSummary) -> Vec<String> {
    if summary.destinations.is_empty() {
        return Vec::new();
    }

    let labels: Vec<_> = summary
        .destinations
        .iter()
        .map(|(d, _)| curve.destination_label(*d))
        .collect();
    let width = labels.iter().map(String::len).max().unwrap_or(0).max(11);

    let mut lines = vec![
        String::new(),
        format!("Contributions received ({} months):", summary.months),
        format!("{:<width$}  {:>6}  {:>16}", "Destination", "Months", "Amount"),
    ];
    for (label, (_, totals)) in labels.iter().zip(&summary.destinations) {
        lines.push(format!(
            "{label:<width$}  {:>6}  {:>16}",
            totals.contributions,
            format_amount(totals.amount)
        ));
    }
    lines
}

/// One line per swept configuration, in input order
pub fn sweep_lines(points: &[Result<SweepPoint, SimulationError>]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:>5}  {:<12}  {:>16}  {:>16}  {:>8}",
        "Split", "Cooldown", "Invested", "Final", "ROI"
    )];
    for point in points {
        match point {
            Ok(SweepPoint { config, summary }) => {
                let cooldown = config.cooldown.map_or_else(
                    || "off".to_string(),
                    |c| {
                        format!(
                            "{}/{}/{}",
                            c.lookback_months,
                            c.initial_quarantine_months,
                            c.quarantine_increment_months
                        )
                    },
                );
                let (invested, final_value, roi) = summary.as_ref().map_or(
                    (0.0, 0.0, None),
                    |s| (s.total_invested, s.final_value, s.return_on_investment),
                );
                lines.push(format!(
                    "{:>5}  {cooldown:<12}  {:>16}  {:>16}  {:>8}",
                    config.split_count,
                    format_amount(invested),
                    format_amount(final_value),
                    roi.map_or_else(|| "-".to_string(), format_percentage),
                ));
            }
            Err(e) => lines.push(format!("failed: {e}")),
        }
    }
    lines
}
