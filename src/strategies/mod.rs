//! Rule-based signal strategies and the single-symbol replay harness.

mod dual_ma;
mod harness;
mod kdj;
mod macd;

pub use dual_ma::DualMaStrategy;
pub use harness::{BacktestOutcome, TradeAction, TradeRecord, run_signal_backtest};
pub use kdj::KdjStrategy;
pub use macd::MacdStrategy;

use crate::models::OhlcvSeries;

/// Direction of a rule signal on one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

/// A strategy maps a daily series to one signal per bar.
pub trait SignalStrategy {
    fn name(&self) -> &'static str;

    /// One entry per bar of the input series.
    fn signals(&self, series: &OhlcvSeries) -> Vec<Signal>;
}
