//! All-in/all-out replay of a signal column over one symbol's history.

use chrono::NaiveDate;
use log::info;
use serde::Serialize;

use crate::models::OhlcvSeries;
use crate::strategies::{Signal, SignalStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeAction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub shares: f64,
    /// Running profit against the initial capital; only set on sells.
    pub profit: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestOutcome {
    pub strategy: String,
    pub symbol: String,
    pub initial_capital: f64,
    /// Open position marked at the last close.
    pub final_value: f64,
    pub total_return_pct: f64,
    pub trades: Vec<TradeRecord>,
}

/// Replays a strategy's signals: the whole stack buys on the first Buy,
/// everything liquidates on a Sell, repeat. A position still open at the end
/// is marked to the final close.
pub fn run_signal_backtest(
    strategy: &dyn SignalStrategy,
    series: &OhlcvSeries,
    initial_capital: f64,
) -> BacktestOutcome {
    let signals = strategy.signals(series);

    let mut capital = initial_capital;
    let mut shares = 0.0;
    let mut trades = Vec::new();

    for (i, signal) in signals.iter().enumerate() {
        let price = series.closes[i];
        if price <= 0.0 || price.is_nan() {
            continue;
        }
        match signal {
            Signal::Buy if capital > 0.0 => {
                shares = capital / price;
                capital = 0.0;
                trades.push(TradeRecord {
                    date: series.dates[i],
                    action: TradeAction::Buy,
                    price,
                    shares,
                    profit: None,
                });
            }
            Signal::Sell if shares > 0.0 => {
                capital = shares * price;
                trades.push(TradeRecord {
                    date: series.dates[i],
                    action: TradeAction::Sell,
                    price,
                    shares,
                    profit: Some(capital - initial_capital),
                });
                shares = 0.0;
            }
            _ => {}
        }
    }

    let final_value = if shares > 0.0 {
        shares * series.closes[series.len() - 1]
    } else {
        capital
    };
    let total_return_pct = (final_value - initial_capital) / initial_capital * 100.0;

    info!(
        "[signals] {} on {} | trades={} | return={:+.2}%",
        strategy.name(),
        series.symbol,
        trades.len(),
        total_return_pct,
    );

    BacktestOutcome {
        strategy: strategy.name().to_string(),
        symbol: series.symbol.clone(),
        initial_capital,
        final_value,
        total_return_pct,
        trades,
    }
}
