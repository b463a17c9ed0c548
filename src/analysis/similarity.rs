//! Feature extraction and pairwise similarity for the similar-stock finder.

use serde::Serialize;
use statrs::statistics::Statistics;

use crate::config::SimilarityWeights;
use crate::domain::InstrumentSnapshot;
use crate::models::IndicatorFrame;
use crate::utils::pct_diff;

/// Minimum bars needed before a feature vector is meaningful.
pub const MIN_FEATURE_BARS: usize = 30;

/// Technical profile of one stock, extracted from its trailing window.
/// Undefined components stay NaN and drop out of the blend.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StockFeatures {
    /// Mean of the MA5 slope over 4 bars and MA20 slope over 9 bars, percent.
    pub ma_trend: f64,
    pub macd: f64,
    pub rsi: f64,
    /// Sample stddev of the last 20 daily returns, percent.
    pub volatility: f64,
    /// Turnover rate, from the snapshot when present, else the series mean.
    pub turnover: f64,
    /// Dynamic P/E from the snapshot; NaN or non-positive means unusable.
    pub pe: f64,
    /// Close position inside the 20-day high/low range, 0-100.
    pub price_position: f64,
}

pub fn extract_features(
    frame: &IndicatorFrame,
    snapshot: Option<&InstrumentSnapshot>,
) -> Option<StockFeatures> {
    let n = frame.len();
    if n < MIN_FEATURE_BARS {
        return None;
    }
    let t = n - 1;

    let ma5_slope = pct_diff(frame.ma_at(5, t), frame.ma_at(5, t - 4));
    let ma20_slope = pct_diff(frame.ma_at(20, t), frame.ma_at(20, t - 9));
    let ma_trend = (ma5_slope + ma20_slope) / 2.0;

    let closes = &frame.series.closes;
    let returns: Vec<f64> = closes
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    let tail_start = returns.len().saturating_sub(20);
    let volatility = returns[tail_start..].iter().std_dev() * 100.0;

    let turnover = match snapshot {
        Some(s) => s.turnover_rate,
        None => crate::utils::mean(&frame.series.turnovers),
    };
    let pe = snapshot.map_or(f64::NAN, |s| s.pe_dynamic);

    let highs = &frame.series.highs;
    let lows = &frame.series.lows;
    let start = n.saturating_sub(20);
    let high_20 = highs[start..].iter().copied().fold(f64::MIN, f64::max);
    let low_20 = lows[start..].iter().copied().fold(f64::MAX, f64::min);
    let price_position = if high_20 > low_20 {
        (closes[t] - low_20) / (high_20 - low_20) * 100.0
    } else {
        50.0
    };

    Some(StockFeatures {
        ma_trend,
        macd: frame.macd[t],
        rsi: frame.rsi14[t],
        volatility,
        turnover,
        pe,
        price_position,
    })
}

/// Weighted blend of per-feature closeness, 0-100. A component with an
/// undefined value on either side simply contributes nothing.
pub fn similarity_score(
    target: &StockFeatures,
    candidate: &StockFeatures,
    weights: &SimilarityWeights,
) -> f64 {
    let mut total = 0.0;

    if target.ma_trend.is_finite() && candidate.ma_trend.is_finite() {
        let diff = (target.ma_trend - candidate.ma_trend).abs();
        total += (100.0 - diff * 10.0).max(0.0) * weights.trend;
    }

    let mut momentum = 0.0;
    let mut momentum_parts = 0;
    if target.macd.is_finite() && candidate.macd.is_finite() {
        let diff = (target.macd - candidate.macd).abs();
        momentum += (100.0 - diff * 50.0).max(0.0);
        momentum_parts += 1;
    }
    if target.rsi.is_finite() && candidate.rsi.is_finite() {
        let diff = (target.rsi - candidate.rsi).abs();
        momentum += (100.0 - diff).max(0.0);
        momentum_parts += 1;
    }
    if momentum_parts > 0 {
        total += momentum / momentum_parts as f64 * weights.momentum;
    }

    total += ratio_closeness(target.volatility, candidate.volatility) * weights.volatility;
    total += ratio_closeness(target.turnover, candidate.turnover) * weights.volume;

    if target.pe > 0.0 && candidate.pe > 0.0 {
        total += ratio_closeness(target.pe, candidate.pe) * weights.valuation;
    }

    total
}

/// min/max ratio of two positive magnitudes, scaled to 0-100.
fn ratio_closeness(a: f64, b: f64) -> f64 {
    if !a.is_finite() || !b.is_finite() || a <= 0.0 || b <= 0.0 {
        return 0.0;
    }
    a.min(b) / a.max(b) * 100.0
}
