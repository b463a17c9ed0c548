use serde::{Deserialize, Serialize};

/// One row of the realtime market table: a single listed instrument at a
/// point in time. Treated as immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    /// Exchange symbol, the unique key (e.g. "600519").
    pub symbol: String,
    pub name: String,
    pub last_price: f64,
    /// Signed percent change, percent units.
    pub pct_change: f64,
    /// Percent of float shares traded today.
    pub turnover_rate: f64,
    /// Total market value, base currency units.
    pub total_market_cap: f64,
    /// Freely tradable market value, base currency units.
    pub float_market_cap: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// Volume in lots.
    pub volume: f64,
    /// Turnover amount, base currency units.
    pub amount: f64,
    /// Today's volume relative to the recent average.
    pub volume_ratio: f64,
    /// Dynamic price/earnings ratio; NaN when the provider reports none.
    pub pe_dynamic: f64,
}

impl InstrumentSnapshot {
    pub fn market_cap_yi(&self) -> f64 {
        self.total_market_cap / crate::config::HUNDRED_MILLION
    }
}
