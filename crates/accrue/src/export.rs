//! Month-end CSV export of result curves

use std::fmt;
use std::path::{Path, PathBuf};

use accrue_core::date_math::month_key;
use accrue_core::model::{MonthlyContribution, ResultCurve, ResultSink, ScenarioKind};

use crate::util::io::atomic_write;

#[derive(Debug)]
pub enum ExportError {
    Io(String),
    Encode(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(msg) => write!(f, "IO error: {msg}"),
            ExportError::Encode(msg) => write!(f, "CSV error: {msg}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Encode(err.to_string())
    }
}

/// Index of the last row of each calendar month, in order
pub fn month_end_rows(curve: &ResultCurve) -> Vec<usize> {
    let rows = &curve.rows;
    (0..rows.len())
        .filter(|&i| {
            rows.get(i + 1)
                .is_none_or(|next| month_key(next.date) != month_key(rows[i].date))
        })
        .collect()
}

/// Writes one CSV per scenario into an output directory
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
    lump_sum_file: String,
    monthly_file: String,
    mixed_file: String,
    written: Vec<PathBuf>,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lump_sum_file: "backtest_lump_sum.csv".to_string(),
            monthly_file: "backtest_monthly.csv".to_string(),
            mixed_file: "backtest_mixed.csv".to_string(),
            written: Vec::new(),
        }
    }

    #[must_use]
    pub fn file_names(mut self, lump_sum: &str, monthly: &str, mixed: &str) -> Self {
        self.lump_sum_file = lump_sum.to_string();
        self.monthly_file = monthly.to_string();
        self.mixed_file = mixed.to_string();
        self
    }

    pub fn path_for(&self, scenario: ScenarioKind) -> PathBuf {
        let name = match scenario {
            ScenarioKind::LumpSum => &self.lump_sum_file,
            ScenarioKind::Recurring => &self.monthly_file,
            ScenarioKind::Mixed => &self.mixed_file,
        };
        self.dir.join(name)
    }

    /// Files written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ResultSink for CsvSink {
    type Error = ExportError;

    fn accept(&mut self, curve: &ResultCurve) -> Result<(), ExportError> {
        let path = self.path_for(curve.scenario);
        let bytes = encode_month_end(curve)?;
        write(&path, &bytes)?;
        tracing::info!(
            scenario = curve.scenario.label(),
            path = %path.display(),
            "results exported"
        );
        self.written.push(path);
        Ok(())
    }
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    atomic_write(path, bytes)
        .map_err(|e| ExportError::Io(format!("Failed to write {}: {e}", path.display())))
}

fn contribution_in_month<'a>(
    curve: &'a ResultCurve,
    key: (i16, i8),
) -> Option<&'a MonthlyContribution> {
    curve
        .contributions
        .iter()
        .find(|c| month_key(c.date) == key)
}

/// Render the month-end snapshot table of a curve as CSV bytes
pub fn encode_month_end(curve: &ResultCurve) -> Result<Vec<u8>, ExportError> {
    let has_sleeve = curve.rows.iter().any(|r| r.sleeve.is_some());
    let contributes = curve.scenario != ScenarioKind::LumpSum;
    let growth = curve.benchmarks.growth.as_deref();
    let inflation = curve.benchmarks.inflation_plus_spread.as_deref();

    let mut header = vec!["date".to_string()];
    header.extend(curve.instruments.iter().map(|i| i.symbol.clone()));
    if has_sleeve {
        header.push("sleeve".to_string());
    }
    header.push("total".to_string());
    if contributes {
        header.push("invested".to_string());
    }
    if growth.is_some() {
        header.push("growth_benchmark".to_string());
    }
    if inflation.is_some() {
        header.push("inflation_benchmark".to_string());
    }
    if contributes {
        header.push("contribution".to_string());
        header.push("recipients".to_string());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header)?;

    for i in month_end_rows(curve) {
        let row = &curve.rows[i];
        let mut record = vec![row.date.to_string()];
        record.extend(row.holdings.iter().map(|h| format!("{:.2}", h.value)));
        if has_sleeve {
            record.push(format!("{:.2}", row.sleeve.unwrap_or(0.0)));
        }
        record.push(format!("{:.2}", row.total));
        if contributes {
            record.push(format!("{:.2}", row.invested));
        }
        for column in [growth, inflation].into_iter().flatten() {
            record.push(format!("{:.2}", column[i]));
        }
        if contributes {
            match contribution_in_month(curve, month_key(row.date)) {
                Some(c) => {
                    record.push(format!("{:.2}", c.amount));
                    let recipients: Vec<_> = c
                        .destinations
                        .iter()
                        .map(|d| curve.destination_label(*d))
                        .collect();
                    record.push(recipients.join(";"));
                }
                None => {
                    record.push(String::new());
                    record.push(String::new());
                }
            }
        }
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Encode(e.to_string()))
}
