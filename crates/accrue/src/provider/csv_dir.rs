//! Plain CSV files as a data source
//!
//! Layout of the source directory:
//! - `<symbol>.csv` with header `date,close,dividend` (empty `close` marks a
//!   row without a price, empty `dividend` means none)
//! - `<series>.csv` with header `date,value`

use std::path::{Path, PathBuf};

use accrue_core::model::PriceRow;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::{PriceSource, ProviderError, SeriesSource};

#[derive(Debug, Serialize, Deserialize)]
struct PriceRecord {
    date: Date,
    close: Option<f64>,
    #[serde(default)]
    dividend: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PointRecord {
    date: Date,
    value: f64,
}

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, ProviderError> {
    csv::Reader::from_path(path)
        .map_err(|e| ProviderError::Io(format!("Failed to open {}: {e}", path.display())))
}

pub(crate) fn read_price_rows(path: &Path) -> Result<Vec<PriceRow>, ProviderError> {
    open(path)?
        .deserialize::<PriceRecord>()
        .map(|record| {
            record
                .map(|r| PriceRow {
                    date: r.date,
                    close: r.close,
                    dividend: r.dividend.unwrap_or(0.0),
                })
                .map_err(|e| ProviderError::Parse(format!("{}: {e}", path.display())))
        })
        .collect()
}

pub(crate) fn read_points(path: &Path) -> Result<Vec<(Date, f64)>, ProviderError> {
    open(path)?
        .deserialize::<PointRecord>()
        .map(|record| {
            record
                .map(|r| (r.date, r.value))
                .map_err(|e| ProviderError::Parse(format!("{}: {e}", path.display())))
        })
        .collect()
}

fn to_bytes<T: Serialize>(records: impl IntoIterator<Item = T>) -> Result<Vec<u8>, ProviderError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| ProviderError::Io(format!("Failed to encode row: {e}")))?;
    }
    writer
        .into_inner()
        .map_err(|e| ProviderError::Io(format!("Failed to flush rows: {e}")))
}

pub(crate) fn price_rows_to_csv(rows: &[PriceRow]) -> Result<Vec<u8>, ProviderError> {
    to_bytes(rows.iter().map(|r| PriceRecord {
        date: r.date,
        close: r.close,
        dividend: Some(r.dividend),
    }))
}

pub(crate) fn points_to_csv(points: &[(Date, f64)]) -> Result<Vec<u8>, ProviderError> {
    to_bytes(points.iter().map(|&(date, value)| PointRecord { date, value }))
}

/// Directory of per-instrument and per-series CSV files
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
}

impl CsvDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, name: &str) -> Result<PathBuf, ProviderError> {
        let path = self.dir.join(format!("{name}.csv"));
        if path.is_file() {
            Ok(path)
        } else {
            Err(ProviderError::Missing(name.to_string()))
        }
    }
}

impl PriceSource for CsvDirectory {
    fn fetch_instrument(
        &self,
        symbol: &str,
        start: Date,
        end: Date,
    ) -> Result<Vec<PriceRow>, ProviderError> {
        let mut rows = read_price_rows(&self.file_for(symbol)?)?;
        rows.retain(|r| r.date >= start && r.date <= end);
        Ok(rows)
    }
}

impl SeriesSource for CsvDirectory {
    fn fetch_chunk(
        &self,
        series_id: &str,
        start: Date,
        end: Date,
    ) -> Result<Vec<(Date, f64)>, ProviderError> {
        let mut points = read_points(&self.file_for(series_id)?)?;
        points.retain(|(date, _)| *date >= start && *date <= end);
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_prices_filtered_to_window() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("AAA.csv"),
            "date,close,dividend\n\
             2019-12-31,9.0,\n\
             2020-01-02,10.0,0.25\n\
             2020-01-03,,\n\
             2020-02-03,11.0,\n",
        )
        .unwrap();
        let source = CsvDirectory::new(dir.path());

        let rows = source
            .fetch_instrument("AAA", date(2020, 1, 1), date(2020, 1, 31))
            .unwrap();
        assert_eq!(
            rows,
            vec![
                PriceRow::new(date(2020, 1, 2), 10.0).with_dividend(0.25),
                PriceRow {
                    date: date(2020, 1, 3),
                    close: None,
                    dividend: 0.0,
                },
            ]
        );
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = tempdir().unwrap();
        let source = CsvDirectory::new(dir.path());
        assert_eq!(
            source.fetch_instrument("ZZZ", date(2020, 1, 1), date(2020, 1, 31)),
            Err(ProviderError::Missing("ZZZ".to_string()))
        );
    }

    #[test]
    fn test_series_chunk_bounds_are_inclusive() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("ipca.csv"),
            "date,value\n2020-01-01,0.21\n2020-02-01,0.25\n2020-03-01,0.07\n",
        )
        .unwrap();
        let source = CsvDirectory::new(dir.path());

        let points = source
            .fetch_chunk("ipca", date(2020, 1, 1), date(2020, 2, 1))
            .unwrap();
        assert_eq!(points, vec![(date(2020, 1, 1), 0.21), (date(2020, 2, 1), 0.25)]);
    }

    #[test]
    fn test_malformed_row_is_parse_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.csv"), "date,value\nnot-a-date,1.0\n").unwrap();
        let source = CsvDirectory::new(dir.path());
        assert!(matches!(
            source.fetch_chunk("bad", date(2020, 1, 1), date(2020, 2, 1)),
            Err(ProviderError::Parse(_))
        ));
    }

    #[test]
    fn test_rows_written_back_read_identically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("AAA.csv");
        let rows = vec![
            PriceRow::new(date(2020, 1, 2), 10.5).with_dividend(0.1),
            PriceRow {
                date: date(2020, 1, 3),
                close: None,
                dividend: 0.0,
            },
        ];
        fs::write(&path, price_rows_to_csv(&rows).unwrap()).unwrap();
        assert_eq!(read_price_rows(&path).unwrap(), rows);
    }
}
