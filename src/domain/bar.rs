use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar as returned by the history provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Volume in lots.
    pub volume: f64,
    /// Signed daily percent change, percent units.
    pub pct_change: f64,
    /// Turnover rate, percent units.
    pub turnover: f64,
}

impl DailyBar {
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}
