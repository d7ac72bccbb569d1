mod ids;
mod ledger;
mod panel;
mod results;
mod series;

pub use ids::{Destination, Instrument, InstrumentId};
pub use ledger::{LedgerEntry, SimEvent};
pub use panel::{InstrumentSeries, PriceRow, PricePanel};
pub use results::{
    BenchmarkColumns, DailyRow, DestinationTotals, InstrumentValue, MonthlyContribution,
    ResultCurve, ResultSink, ScenarioKind,
};
pub use series::{GrowthSeries, InflationSeries, TRADING_DAYS_PER_YEAR, daily_factor};
