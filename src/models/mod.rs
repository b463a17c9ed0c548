mod frame;
mod report;
mod timeseries;

pub use frame::IndicatorFrame;
pub use report::{
    AdvancedRow, BacktestSummary, DayStats, ForwardReturn, ScreeningRow, SimilarRow, SubScores,
};
pub use timeseries::OhlcvSeries;

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{Duration, NaiveDate};

    use crate::domain::DailyBar;
    use crate::models::OhlcvSeries;

    /// Linear ramp: close rises by `step` per bar starting at `start`, with a
    /// small intraday range around each close and gently growing volume.
    pub(crate) fn make_series(symbol: &str, n: usize, start: f64, step: f64) -> OhlcvSeries {
        let base = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let mut bars = Vec::with_capacity(n);
        for i in 0..n {
            let close = start + step * i as f64;
            let prev_close = if i == 0 { close } else { start + step * (i as f64 - 1.0) };
            let pct_change = if i == 0 {
                0.0
            } else {
                (close - prev_close) / prev_close * 100.0
            };
            bars.push(DailyBar {
                date: base + Duration::days(i as i64),
                open: prev_close,
                high: close * 1.01,
                low: close * 0.995,
                close,
                volume: 10_000.0 + 100.0 * i as f64,
                pct_change,
                turnover: 5.0,
            });
        }
        OhlcvSeries::from_bars(symbol, bars)
    }

    /// Every bar identical: open = high = low = close, flat volume.
    pub(crate) fn make_flat(symbol: &str, n: usize, price: f64) -> OhlcvSeries {
        let base = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let bars = (0..n)
            .map(|i| DailyBar {
                date: base + Duration::days(i as i64),
                open: price,
                high: price,
                low: price,
                close: price,
                volume: 10_000.0,
                pct_change: 0.0,
                turnover: 5.0,
            })
            .collect();
        OhlcvSeries::from_bars(symbol, bars)
    }
}
