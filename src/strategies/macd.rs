//! MACD line / signal line crossover strategy.

use crate::analysis::indicators;
use crate::models::OhlcvSeries;
use crate::strategies::{Signal, SignalStrategy};

pub struct MacdStrategy {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdStrategy {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl SignalStrategy for MacdStrategy {
    fn name(&self) -> &'static str {
        "macd"
    }

    fn signals(&self, series: &OhlcvSeries) -> Vec<Signal> {
        let (macd_line, signal_line, _) =
            indicators::macd(&series.closes, self.fast, self.slow, self.signal);
        let golden = indicators::golden_cross(&macd_line, &signal_line);
        let death = indicators::death_cross(&macd_line, &signal_line);

        golden
            .iter()
            .zip(&death)
            .map(|(g, d)| {
                if *g {
                    Signal::Buy
                } else if *d {
                    Signal::Sell
                } else {
                    Signal::Hold
                }
            })
            .collect()
    }
}
