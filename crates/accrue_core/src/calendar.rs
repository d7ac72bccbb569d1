//! Calendar & panel normalizer
//!
//! Turns a raw [`PricePanel`] (trading-day rows per instrument) into a dense
//! calendar-day grid the simulators can index by `(instrument, day)`:
//!
//! - every calendar day of the window gets a slot;
//! - a day is a *trading* day when any valid instrument has a row on it;
//! - closes are forward-filled from the last known close in one linear pass;
//! - dividends stay on the day they were paid and are never carried forward.
//!
//! Requested instruments that are missing from the panel or have no close in
//! the window are dropped and reported, never treated as errors.

use jiff::civil::Date;

use crate::date_math::{calendar_days, days_between};
use crate::model::{Instrument, InstrumentId, InstrumentSeries, PricePanel};

/// Normalized market data for one instrument on one calendar day
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayBar {
    /// Last known close on or before this day; `None` before the first close
    pub close: Option<f64>,
    /// Dividend per share paid on this exact day
    pub dividend: f64,
}

#[derive(Debug, Clone)]
pub struct NormalizedPanel {
    pub start: Date,
    pub end: Date,
    dates: Vec<Date>,
    trading: Vec<bool>,
    instruments: Vec<Instrument>,
    dropped: Vec<String>,
    /// `bars[instrument][day]`
    bars: Vec<Vec<DayBar>>,
}

impl NormalizedPanel {
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    #[inline]
    pub fn is_trading(&self, day: usize) -> bool {
        self.trading[day]
    }

    pub fn trading_days(&self) -> usize {
        self.trading.iter().filter(|t| **t).count()
    }

    /// Valid instruments in request order; `instruments()[id.index()].id == id`
    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn instrument_ids(&self) -> impl Iterator<Item = InstrumentId> + '_ {
        self.instruments.iter().map(|i| i.id)
    }

    /// Requested symbols left out for lack of data
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    #[inline]
    pub fn bar(&self, instrument: InstrumentId, day: usize) -> DayBar {
        self.bars[instrument.index()][day]
    }

    #[inline]
    pub fn close(&self, instrument: InstrumentId, day: usize) -> Option<f64> {
        self.bars[instrument.index()][day].close
    }

    /// First day index with a known close for an instrument
    pub fn first_close(&self, instrument: InstrumentId) -> Option<(usize, f64)> {
        self.bars[instrument.index()]
            .iter()
            .enumerate()
            .find_map(|(day, bar)| bar.close.map(|c| (day, c)))
    }

    pub fn day_index(&self, date: Date) -> Option<usize> {
        let offset = days_between(self.start, date);
        if offset < 0 || offset as usize >= self.dates.len() {
            None
        } else {
            Some(offset as usize)
        }
    }
}

/// Most instruments a normalized panel can index
pub const MAX_INSTRUMENTS: usize = u16::MAX as usize + 1;

/// Id of the instrument accepted after `accepted` others, `None` once the
/// id space is exhausted
fn next_instrument_id(accepted: usize) -> Option<InstrumentId> {
    u16::try_from(accepted).ok().map(InstrumentId)
}

/// Normalize `panel` to the calendar window `start..=end` for the requested
/// symbols.
///
/// Duplicate requests keep their first position. The result may hold zero
/// valid instruments; simulators treat that as a hard stop.
pub fn normalize<S: AsRef<str>>(
    panel: &PricePanel,
    requested: &[S],
    start: Date,
    end: Date,
) -> NormalizedPanel {
    let dates = calendar_days(start, end);
    let mut trading = vec![false; dates.len()];
    let mut instruments = Vec::new();
    let mut dropped = Vec::new();
    let mut bars = Vec::new();

    for symbol in requested.iter().map(AsRef::as_ref) {
        if instruments.iter().any(|i: &Instrument| i.symbol == symbol)
            || dropped.iter().any(|d| d == symbol)
        {
            continue;
        }

        let series = match panel.get(symbol) {
            Some(series) if series.has_close_between(start, end) => series,
            _ => {
                tracing::warn!(instrument = symbol, "no price data in window, dropping");
                dropped.push(symbol.to_string());
                continue;
            }
        };

        let Some(id) = next_instrument_id(instruments.len()) else {
            tracing::warn!(
                instrument = symbol,
                limit = MAX_INSTRUMENTS,
                "instrument limit reached, dropping"
            );
            dropped.push(symbol.to_string());
            continue;
        };
        bars.push(fill_calendar(series, start, &dates, &mut trading));
        instruments.push(Instrument {
            id,
            symbol: symbol.to_string(),
        });
    }

    if !dropped.is_empty() {
        tracing::info!(
            valid = instruments.len(),
            dropped = dropped.len(),
            "instruments without usable history were excluded"
        );
    }

    NormalizedPanel {
        start,
        end,
        dates,
        trading,
        instruments,
        dropped,
        bars,
    }
}

/// Lay one instrument's rows onto the calendar, carrying the last close
/// forward and marking the days it traded.
fn fill_calendar(
    series: &InstrumentSeries,
    start: Date,
    dates: &[Date],
    trading: &mut [bool],
) -> Vec<DayBar> {
    let mut out = Vec::with_capacity(dates.len());
    let mut rows = series.rows.iter().peekable();
    let mut last_close = None;

    // Rows before the window only seed the carried close
    while let Some(row) = rows.next_if(|r| r.date < start) {
        if row.close.is_some() {
            last_close = row.close;
        }
    }

    for (day, date) in dates.iter().enumerate() {
        let mut dividend = 0.0;
        if let Some(row) = rows.next_if(|r| r.date == *date) {
            trading[day] = true;
            if row.close.is_some() {
                last_close = row.close;
            }
            if row.dividend.is_finite() && row.dividend > 0.0 {
                dividend = row.dividend;
            }
        }
        out.push(DayBar {
            close: last_close,
            dividend,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PriceRow;
    use jiff::civil::date;

    fn panel() -> PricePanel {
        PricePanel::from_iter([
            InstrumentSeries::new(
                "AAA",
                vec![
                    PriceRow::new(date(2020, 1, 2), 10.0),
                    PriceRow::new(date(2020, 1, 3), 11.0).with_dividend(0.5),
                    PriceRow::new(date(2020, 1, 6), 12.0),
                ],
            ),
            InstrumentSeries::new(
                "BBB",
                vec![
                    PriceRow {
                        date: date(2020, 1, 2),
                        close: None,
                        dividend: 0.0,
                    },
                    PriceRow::new(date(2020, 1, 6), 20.0),
                ],
            ),
            InstrumentSeries::new("EMPTY", vec![]),
        ])
    }

    #[test]
    fn test_valid_instruments_keep_request_order() {
        let normalized = normalize(
            &panel(),
            &["BBB", "MISSING", "AAA", "EMPTY", "AAA"],
            date(2020, 1, 1),
            date(2020, 1, 7),
        );

        let symbols: Vec<_> = normalized
            .instruments()
            .iter()
            .map(|i| i.symbol.as_str())
            .collect();
        assert_eq!(symbols, vec!["BBB", "AAA"]);
        assert_eq!(normalized.dropped(), &["MISSING", "EMPTY"]);
        assert_eq!(normalized.instruments()[1].id, InstrumentId(1));
    }

    #[test]
    fn test_closes_forward_filled_across_calendar_gaps() {
        let normalized = normalize(&panel(), &["AAA"], date(2020, 1, 1), date(2020, 1, 7));
        let a = InstrumentId(0);

        assert_eq!(normalized.len(), 7);
        assert_eq!(normalized.close(a, 0), None);
        assert_eq!(normalized.close(a, 1), Some(10.0));
        // Weekend carries Friday's close
        assert_eq!(normalized.close(a, 3), Some(11.0));
        assert_eq!(normalized.close(a, 4), Some(11.0));
        assert_eq!(normalized.close(a, 5), Some(12.0));
        assert_eq!(normalized.close(a, 6), Some(12.0));
    }

    #[test]
    fn test_dividends_not_carried_forward() {
        let normalized = normalize(&panel(), &["AAA"], date(2020, 1, 1), date(2020, 1, 7));
        let a = InstrumentId(0);
        assert_eq!(normalized.bar(a, 2).dividend, 0.5);
        assert_eq!(normalized.bar(a, 3).dividend, 0.0);
        assert_eq!(normalized.bar(a, 4).dividend, 0.0);
    }

    #[test]
    fn test_trading_flags_union_of_valid_instruments() {
        let normalized = normalize(
            &panel(),
            &["AAA", "BBB"],
            date(2020, 1, 1),
            date(2020, 1, 7),
        );
        let flags: Vec<_> = (0..normalized.len()).map(|d| normalized.is_trading(d)).collect();
        assert_eq!(flags, vec![false, true, true, false, false, true, false]);
        assert_eq!(normalized.trading_days(), 3);
        // A null-close row still marks the day as traded but leaves the close unknown
        assert_eq!(normalized.close(InstrumentId(1), 1), None);
        assert_eq!(normalized.first_close(InstrumentId(1)), Some((5, 20.0)));
    }

    #[test]
    fn test_rows_before_window_seed_close() {
        let normalized = normalize(&panel(), &["AAA"], date(2020, 1, 4), date(2020, 1, 6));
        assert_eq!(normalized.close(InstrumentId(0), 0), Some(11.0));
        assert_eq!(normalized.close(InstrumentId(0), 2), Some(12.0));
        assert!(!normalized.is_trading(0));
        // The pre-window dividend is not replayed inside the window
        assert_eq!(normalized.bar(InstrumentId(0), 0).dividend, 0.0);
    }

    #[test]
    fn test_instrument_with_only_pre_window_data_is_dropped() {
        let normalized = normalize(&panel(), &["AAA"], date(2020, 2, 1), date(2020, 2, 5));
        assert!(normalized.instruments().is_empty());
        assert_eq!(normalized.dropped(), &["AAA"]);
    }

    #[test]
    fn test_day_index_bounds() {
        let normalized = normalize(&panel(), &["AAA"], date(2020, 1, 1), date(2020, 1, 7));
        assert_eq!(normalized.day_index(date(2020, 1, 1)), Some(0));
        assert_eq!(normalized.day_index(date(2020, 1, 7)), Some(6));
        assert_eq!(normalized.day_index(date(2020, 1, 8)), None);
        assert_eq!(normalized.day_index(date(2019, 12, 31)), None);
    }

    #[test]
    fn test_instrument_ids_stop_at_id_space() {
        assert_eq!(next_instrument_id(0), Some(InstrumentId(0)));
        assert_eq!(
            next_instrument_id(MAX_INSTRUMENTS - 1),
            Some(InstrumentId(u16::MAX))
        );
        assert_eq!(next_instrument_id(MAX_INSTRUMENTS), None);
        assert_eq!(next_instrument_id(usize::MAX), None);
    }
}
