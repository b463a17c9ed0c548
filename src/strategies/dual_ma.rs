//! Classic dual moving-average trend following: buy the golden cross, sell
//! the death cross.

use crate::analysis::indicators;
use crate::models::OhlcvSeries;
use crate::strategies::{Signal, SignalStrategy};

pub struct DualMaStrategy {
    pub short_period: usize,
    pub long_period: usize,
}

impl Default for DualMaStrategy {
    fn default() -> Self {
        Self {
            short_period: 5,
            long_period: 20,
        }
    }
}

impl SignalStrategy for DualMaStrategy {
    fn name(&self) -> &'static str {
        "dual_ma"
    }

    fn signals(&self, series: &OhlcvSeries) -> Vec<Signal> {
        let short = indicators::rolling_mean(&series.closes, self.short_period);
        let long = indicators::rolling_mean(&series.closes, self.long_period);
        let golden = indicators::golden_cross(&short, &long);
        let death = indicators::death_cross(&short, &long);

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
