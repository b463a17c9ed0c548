//! KDJ overbought/oversold strategy: J-line threshold crossings plus K/D
//! crosses away from the extremes.

use crate::analysis::indicators;
use crate::models::OhlcvSeries;
use crate::strategies::{Signal, SignalStrategy};

pub struct KdjStrategy {
    pub n: usize,
    pub m1: usize,
    pub m2: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for KdjStrategy {
    fn default() -> Self {
        Self {
            n: 9,
            m1: 3,
            m2: 3,
            oversold: 20.0,
            overbought: 80.0,
        }
    }
}

impl SignalStrategy for KdjStrategy {
    fn name(&self) -> &'static str {
        "kdj"
    }

    fn signals(&self, series: &OhlcvSeries) -> Vec<Signal> {
        let (k, d, j) = indicators::kdj(
            &series.highs,
            &series.lows,
            &series.closes,
            self.n,
            self.m1,
            self.m2,
        );
        let kd_golden = indicators::golden_cross(&k, &d);
        let kd_death = indicators::death_cross(&k, &d);

        let mut signals = vec![Signal::Hold; series.len()];
        for t in 1..series.len() {
            // J escaping the oversold floor / falling off the overbought ceiling.
            if j[t] > self.oversold && j[t - 1] <= self.oversold {
                signals[t] = Signal::Buy;
            } else if j[t] < self.overbought && j[t - 1] >= self.overbought {
                signals[t] = Signal::Sell;
            }
            // K/D crosses in the lower/upper half take precedence.
            if kd_golden[t] && k[t] < 50.0 {
                signals[t] = Signal::Buy;
            } else if kd_death[t] && k[t] > 50.0 {
                signals[t] = Signal::Sell;
            }
        }
        signals
    }
}
