use std::collections::BTreeMap;

use crate::analysis::indicators;
use crate::models::OhlcvSeries;

/// Standard MA periods computed for every frame.
pub const MA_PERIODS: [usize; 4] = [5, 10, 20, 60];
/// Standard volume-MA periods.
pub const VOL_MA_PERIODS: [usize; 2] = [5, 10];

/// An [`OhlcvSeries`] augmented with derived indicator columns.
///
/// Built once per candidate per pass; the underlying series is untouched.
/// Derived rows inside a warmup window are NaN; see `analysis::indicators`.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub series: OhlcvSeries,
    ma: BTreeMap<usize, Vec<f64>>,
    vol_ma: BTreeMap<usize, Vec<f64>>,
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
    pub rsi14: Vec<f64>,
    pub k: Vec<f64>,
    pub d: Vec<f64>,
    pub j: Vec<f64>,
    pub boll_upper: Vec<f64>,
    pub boll_middle: Vec<f64>,
    pub boll_lower: Vec<f64>,
    pub atr14: Vec<f64>,
}

impl IndicatorFrame {
    pub fn compute(series: OhlcvSeries) -> Self {
        let closes = &series.closes;

        let mut ma = BTreeMap::new();
        for period in MA_PERIODS {
            ma.insert(period, indicators::rolling_mean(closes, period));
        }
        let mut vol_ma = BTreeMap::new();
        for period in VOL_MA_PERIODS {
            vol_ma.insert(period, indicators::rolling_mean(&series.volumes, period));
        }

        let (macd, signal, histogram) = indicators::macd(closes, 12, 26, 9);
        let rsi14 = indicators::rsi(closes, 14);
        let (k, d, j) = indicators::kdj(&series.highs, &series.lows, closes, 9, 3, 3);
        let (boll_upper, boll_middle, boll_lower) = indicators::boll(closes, 20, 2.0);
        let atr14 = indicators::atr(&series.highs, &series.lows, closes, 14);

        Self {
            series,
            ma,
            vol_ma,
            macd,
            signal,
            histogram,
            rsi14,
            k,
            d,
            j,
            boll_upper,
            boll_middle,
            boll_lower,
            atr14,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Moving-average column for one of the standard periods; NaN if the
    /// period was not computed or the index is out of range.
    pub fn ma_at(&self, period: usize, idx: usize) -> f64 {
        column_at(self.ma.get(&period).map(Vec::as_slice), idx)
    }

    pub fn vol_ma_at(&self, period: usize, idx: usize) -> f64 {
        column_at(self.vol_ma.get(&period).map(Vec::as_slice), idx)
    }
}

fn column_at(column: Option<&[f64]>, idx: usize) -> f64 {
    column
        .and_then(|col| col.get(idx))
        .copied()
        .unwrap_or(f64::NAN)
}
