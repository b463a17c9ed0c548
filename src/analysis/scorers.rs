//! The seven sub-score calculators.
//!
//! Each scorer reads the last bar (and where needed the one or two before it)
//! of an [`IndicatorFrame`] and returns a bounded score plus a pass/fail gate.
//! Gated scorers (MA, RSI, KDJ, Trend) fail closed: insufficient history or an
//! undefined indicator value scores 0 with `passed = false`. Advisory scorers
//! (MACD, BOLL, Volume) score 0 but keep `passed = true` in the same
//! situations; they contribute points without vetoing a candidate.

use serde::Serialize;

use crate::config::TrendBands;
use crate::models::IndicatorFrame;
use crate::utils::{pct_diff, sum_tail};

pub const MA_MAX: i32 = 30;
pub const MACD_MAX: i32 = 20;
pub const RSI_MAX: i32 = 15;
pub const KDJ_MAX: i32 = 15;
pub const BOLL_MAX: i32 = 10;
pub const VOLUME_MAX: i32 = 10;
pub const TREND_MAX: i32 = 10;

/// A bounded sub-score with its gate flag and fixed-shape diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct SubScore<D> {
    pub score: i32,
    pub max_score: i32,
    pub passed: bool,
    pub details: D,
}

impl<D: Default> SubScore<D> {
    /// Fail-closed result for a gated scorer that cannot evaluate.
    fn gated_empty(max_score: i32) -> Self {
        Self {
            score: 0,
            max_score,
            passed: false,
            details: D::default(),
        }
    }

    /// Neutral result for an advisory scorer that cannot evaluate.
    fn advisory_empty(max_score: i32) -> Self {
        Self {
            score: 0,
            max_score,
            passed: true,
            details: D::default(),
        }
    }
}

// ─── MA ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MaDetails {
    pub close: f64,
    pub low: f64,
    pub ma5: f64,
    pub ma10: f64,
    pub ma20: f64,
    pub close_above_ma5: bool,
    pub low_holds_ma5: bool,
    pub ma5_rising: bool,
    /// Close deviation from MA5, percent.
    pub deviation_pct: f64,
    /// MA5 > MA10 > MA20.
    pub bullish_stack: bool,
}

/// Max 30. Close above a rising MA5 that the day's low also respected, with
/// the close hugging the line (0-2% deviation is best, tiered credit out to
/// 4%) and a bullish stack bonus. Gate: close > MA5, low >= MA5·0.998,
/// deviation < 5%.
pub fn ma_score(frame: &IndicatorFrame) -> SubScore<MaDetails> {
    if frame.len() < 20 {
        return SubScore::gated_empty(MA_MAX);
    }
    let t = frame.len() - 1;

    let close = frame.series.closes[t];
    let low = frame.series.lows[t];
    let ma5 = frame.ma_at(5, t);
    let ma10 = frame.ma_at(10, t);
    let ma20 = frame.ma_at(20, t);
    if ma5.is_nan() {
        return SubScore::gated_empty(MA_MAX);
    }

    let mut score = 0;

    let close_above_ma5 = close > ma5;
    if close_above_ma5 {
        score += 8;
    }

    let low_holds_ma5 = low >= ma5 * 0.998;
    if low_holds_ma5 {
        score += 8;
    }

    let prev_ma5 = frame.ma_at(5, t - 1);
    let ma5_rising = !prev_ma5.is_nan() && ma5 > prev_ma5;
    if ma5_rising {
        score += 6;
    }

    let deviation_pct = pct_diff(close, ma5);
    if (0.0..=2.0).contains(&deviation_pct) {
        score += 8;
    } else if deviation_pct > 2.0 && deviation_pct <= 3.0 {
        score += 4;
    } else if deviation_pct > 3.0 && deviation_pct <= 4.0 {
        score += 1;
    }

    let bullish_stack = !ma10.is_nan() && !ma20.is_nan() && ma5 > ma10 && ma10 > ma20;
    if bullish_stack {
        score += 2;
    }

    let passed = close_above_ma5 && low_holds_ma5 && deviation_pct < 5.0;

    SubScore {
        score: score.min(MA_MAX),
        max_score: MA_MAX,
        passed,
        details: MaDetails {
            close,
            low,
            ma5,
            ma10,
            ma20,
            close_above_ma5,
            low_holds_ma5,
            ma5_rising,
            deviation_pct,
            bullish_stack,
        },
    }
}

// ─── MACD ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MacdDetails {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
    pub histogram_expanding: bool,
}

/// Max 20, advisory. Bullish MACD above its signal with a positive histogram
/// that has been widening for two consecutive days.
pub fn macd_score(frame: &IndicatorFrame) -> SubScore<MacdDetails> {
    if frame.len() < 30 {
        return SubScore::advisory_empty(MACD_MAX);
    }
    let t = frame.len() - 1;

    let macd = frame.macd[t];
    let signal = frame.signal[t];
    let histogram = frame.histogram[t];

    let mut score = 0;
    if macd > 0.0 {
        score += 6;
    }
    if macd > signal {
        score += 6;
    }
    if histogram > 0.0 {
        score += 4;
    }

    let histogram_expanding =
        histogram > frame.histogram[t - 1] && frame.histogram[t - 1] > frame.histogram[t - 2];
    if histogram_expanding && histogram > 0.0 {
        score += 4;
    }

    SubScore {
        score,
        max_score: MACD_MAX,
        passed: true,
        details: MacdDetails {
            macd,
            signal,
            histogram,
            histogram_expanding,
        },
    }
}

// ─── RSI ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RsiDetails {
    pub rsi: f64,
    /// True when RSI sits in the strong-but-not-overbought [50, 65] zone.
    pub in_best_zone: bool,
}

/// Max 15. Tiered zones peaking at [50, 65]; everything above 80 is treated
/// as an overheat and fails the gate.
pub fn rsi_score(frame: &IndicatorFrame) -> SubScore<RsiDetails> {
    if frame.len() < 20 {
        return SubScore::gated_empty(RSI_MAX);
    }
    let rsi = frame.rsi14[frame.len() - 1];
    if rsi.is_nan() {
        return SubScore::gated_empty(RSI_MAX);
    }

    let score = if (50.0..=65.0).contains(&rsi) {
        15
    } else if (45.0..50.0).contains(&rsi) || (rsi > 65.0 && rsi <= 70.0) {
        10
    } else if (40.0..45.0).contains(&rsi) {
        8
    } else if rsi > 70.0 && rsi <= 80.0 {
        3
    } else {
        0
    };

    SubScore {
        score,
        max_score: RSI_MAX,
        passed: rsi <= 80.0,
        details: RsiDetails {
            rsi,
            in_best_zone: (50.0..=65.0).contains(&rsi),
        },
    }
}

// ─── KDJ ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct KdjDetails {
    pub k: f64,
    pub d: f64,
    pub j: f64,
    /// K above D (golden state, not necessarily a fresh cross).
    pub golden: bool,
    pub j_rising: bool,
}

/// Max 15. K and J inside their comfort bands, golden state, J still rising.
/// Gate: J <= 110 (beyond that the oscillator is in blow-off territory).
pub fn kdj_score(frame: &IndicatorFrame) -> SubScore<KdjDetails> {
    if frame.len() < 15 {
        return SubScore::gated_empty(KDJ_MAX);
    }
    let t = frame.len() - 1;
    let (k, d, j) = (frame.k[t], frame.d[t], frame.j[t]);
    if k.is_nan() || d.is_nan() || j.is_nan() {
        return SubScore::gated_empty(KDJ_MAX);
    }

    let mut score = 0;
    if (40.0..=70.0).contains(&k) {
        score += 5;
    } else if k > 70.0 && k <= 80.0 {
        score += 3;
    }

    if (50.0..=90.0).contains(&j) {
        score += 5;
    } else if (40.0..50.0).contains(&j) || (j > 90.0 && j <= 100.0) {
        score += 3;
    }

    let golden = k > d;
    if golden {
        score += 3;
    }

    let prev_j = frame.j[t - 1];
    let j_rising = !prev_j.is_nan() && j > prev_j;
    if j_rising {
        score += 2;
    }

    SubScore {
        score,
        max_score: KDJ_MAX,
        passed: j <= 110.0,
        details: KdjDetails {
            k,
            d,
            j,
            golden,
            j_rising,
        },
    }
}

// ─── BOLL ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BollDetails {
    pub close: f64,
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Close position inside the bands, 0-100.
    pub position: f64,
}

/// Max 10, advisory. Close riding between the middle and upper band (50-80%
/// position) is best; touching the upper band is a caution, not a veto.
pub fn boll_score(frame: &IndicatorFrame) -> SubScore<BollDetails> {
    if frame.len() < 25 {
        return SubScore::advisory_empty(BOLL_MAX);
    }
    let t = frame.len() - 1;
    let close = frame.series.closes[t];
    let (upper, middle, lower) = (frame.boll_upper[t], frame.boll_middle[t], frame.boll_lower[t]);
    if upper.is_nan() || middle.is_nan() || lower.is_nan() {
        return SubScore::advisory_empty(BOLL_MAX);
    }

    // Collapsed bands (constant price) read as dead center.
    let position = if upper - lower > 0.0 {
        (close - lower) / (upper - lower) * 100.0
    } else {
        50.0
    };

    let score = if (50.0..=80.0).contains(&position) {
        10
    } else if position > 80.0 && position <= 95.0 {
        5
    } else if position > 95.0 {
        2
    } else if (30.0..50.0).contains(&position) {
        4
    } else {
        0
    };

    SubScore {
        score,
        max_score: BOLL_MAX,
        passed: true,
        details: BollDetails {
            close,
            upper,
            middle,
            lower,
            position,
        },
    }
}

// ─── Volume ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct VolumeDetails {
    pub volume: f64,
    pub vol_ma5: f64,
    pub vol_ma10: f64,
    /// Today's volume over the 5-day average.
    pub ratio: f64,
}

/// Max 10, advisory. Volume above its 5- and 10-day averages, with a bonus
/// for a measured 1-2x expansion and a penalty for a >3x blow-out. The final
/// score never goes below zero.
pub fn volume_score(frame: &IndicatorFrame) -> SubScore<VolumeDetails> {
    if frame.len() < 10 {
        return SubScore::advisory_empty(VOLUME_MAX);
    }
    let t = frame.len() - 1;
    let volume = frame.series.volumes[t];
    let vol_ma5 = frame.vol_ma_at(5, t);
    let vol_ma10 = frame.vol_ma_at(10, t);
    if vol_ma5.is_nan() || vol_ma10.is_nan() || vol_ma5 == 0.0 {
        return SubScore::advisory_empty(VOLUME_MAX);
    }

    let ratio = volume / vol_ma5;

    let mut score = 0;
    if volume > vol_ma5 {
        score += 4;
    }
    if volume > vol_ma10 {
        score += 3;
    }
    if (1.0..=2.0).contains(&ratio) {
        score += 3;
    } else if ratio > 2.0 && ratio <= 3.0 {
        score += 1;
    } else if ratio > 3.0 {
        score -= 2;
    }

    SubScore {
        score: score.max(0),
        max_score: VOLUME_MAX,
        passed: true,
        details: VolumeDetails {
            volume,
            vol_ma5,
            vol_ma10,
            ratio,
        },
    }
}

// ─── Trend ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TrendDetails {
    /// Cumulative percent change over the last 5 bars.
    pub gain_5d: f64,
    /// Cumulative percent change over the last 20 bars.
    pub gain_20d: f64,
    pub yesterday_change: f64,
    pub in_best_5d: bool,
    pub in_best_20d: bool,
}

/// Max 10. Rewards a measured advance: 5- and 20-day cumulative gains inside
/// their best bands, plus a small pullback yesterday. Partial credit just
/// outside each band. Gate: neither horizon may exceed its ceiling (the
/// anti-chase safeguard).
pub fn trend_score(frame: &IndicatorFrame, bands: &TrendBands) -> SubScore<TrendDetails> {
    if frame.len() < 20 {
        return SubScore::gated_empty(TREND_MAX);
    }
    let changes = &frame.series.pct_changes;
    let gain_5d = sum_tail(changes, 5);
    let gain_20d = sum_tail(changes, 20);
    let yesterday_change = changes[changes.len() - 2];

    let mut score = 0;

    let in_best_5d = bands.best_5d.contains(gain_5d);
    if in_best_5d {
        score += 4;
    } else if gain_5d > bands.best_5d.max && gain_5d <= bands.best_5d.max + 3.0 {
        score += 2;
    } else if gain_5d >= 0.0 && gain_5d < bands.best_5d.min {
        score += 2;
    }

    let in_best_20d = bands.best_20d.contains(gain_20d);
    if in_best_20d {
        score += 4;
    } else if gain_20d > bands.best_20d.max && gain_20d <= bands.best_20d.max + 5.0 {
        score += 2;
    } else if gain_20d >= 0.0 && gain_20d < bands.best_20d.min {
        score += 2;
    }

    if bands.pullback.contains(yesterday_change) {
        score += 2;
    } else if (yesterday_change >= bands.pullback.min - 1.0 && yesterday_change < bands.pullback.min)
        || (yesterday_change > bands.pullback.max && yesterday_change <= bands.pullback.max + 0.5)
    {
        score += 1;
    }

    let passed = gain_5d <= bands.ceiling_5d && gain_20d <= bands.ceiling_20d;

    SubScore {
        score,
        max_score: TREND_MAX,
        passed,
        details: TrendDetails {
            gain_5d,
            gain_20d,
            yesterday_change,
            in_best_5d,
            in_best_20d,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrendBands;
    use crate::models::tests::{make_flat, make_series};
    use crate::models::IndicatorFrame;

    fn frame(n: usize) -> IndicatorFrame {
        IndicatorFrame::compute(make_series("600000", n, 10.0, 0.02))
    }

    #[test]
    fn gated_scorers_fail_closed_on_short_history() {
        let short = frame(10);
        assert!(!ma_score(&short).passed);
        assert_eq!(ma_score(&short).score, 0);
        assert!(!rsi_score(&short).passed);
        assert!(!kdj_score(&short).passed);
        assert!(!trend_score(&short, &TrendBands::default()).passed);
    }

    #[test]
    fn advisory_scorers_stay_neutral_on_short_history() {
        let short = frame(5);
        let macd = macd_score(&short);
        assert_eq!((macd.score, macd.passed), (0, true));
        let boll = boll_score(&short);
        assert_eq!((boll.score, boll.passed), (0, true));
        let volume = volume_score(&short);
        assert_eq!((volume.score, volume.passed), (0, true));
    }

    #[test]
    fn steady_riser_passes_ma_gate_with_full_marks() {
        // 130 bars climbing steadily from 10.00 to 13.00.
        let frame = IndicatorFrame::compute(make_series("600519", 130, 10.0, 3.0 / 129.0));
        let result = ma_score(&frame);
        assert!(result.passed);
        assert!(result.score >= 22, "score was {}", result.score);
        assert!(result.details.close_above_ma5);
        assert!(result.details.low_holds_ma5);
        assert!(result.details.ma5_rising);
        assert!(result.details.bullish_stack);
    }

    #[test]
    fn ma_gate_rejects_overextended_close() {
        // Close 8% above MA5: deviation gate must fail even though the close
        // is comfortably above the line.
        let mut series = make_series("600000", 40, 10.0, 0.01);
        let last = series.len() - 1;
        series.closes[last] *= 1.08;
        series.highs[last] = series.closes[last] * 1.01;
        series.lows[last] = series.closes[last] * 0.995;
        let frame = IndicatorFrame::compute(series);
        let result = ma_score(&frame);
        assert!(result.details.deviation_pct > 5.0);
        assert!(!result.passed);
    }

    #[test]
    fn rsi_zones_are_tiered() {
        let mut f = frame(40);
        let t = f.len() - 1;

        f.rsi14[t] = 55.0;
        let best = rsi_score(&f);
        assert_eq!((best.score, best.passed), (15, true));
        assert!(best.details.in_best_zone);

        f.rsi14[t] = 47.0;
        assert_eq!(rsi_score(&f).score, 10);

        f.rsi14[t] = 68.0;
        assert_eq!(rsi_score(&f).score, 10);

        f.rsi14[t] = 42.0;
        assert_eq!(rsi_score(&f).score, 8);

        f.rsi14[t] = 75.0;
        let overheated = rsi_score(&f);
        assert_eq!((overheated.score, overheated.passed), (3, true));

        f.rsi14[t] = 85.0;
        let extreme = rsi_score(&f);
        assert_eq!((extreme.score, extreme.passed), (0, false));
    }

    #[test]
    fn rsi_nan_fails_the_gate() {
        let flat = IndicatorFrame::compute(make_flat("600000", 40, 50.0));
        let result = rsi_score(&flat);
        assert_eq!((result.score, result.passed), (0, false));
    }

    #[test]
    fn kdj_gate_trips_above_110() {
        let mut f = frame(40);
        let t = f.len() - 1;
        f.j[t] = 115.0;
        assert!(!kdj_score(&f).passed);

        f.j[t] = 85.0;
        f.k[t] = 55.0;
        f.d[t] = 50.0;
        f.j[t - 1] = 80.0;
        let result = kdj_score(&f);
        assert!(result.passed);
        // K in band +5, J in band +5, golden +3, rising +2
        assert_eq!(result.score, 15);
    }

    #[test]
    fn boll_collapsed_bands_read_as_center() {
        let flat = IndicatorFrame::compute(make_flat("600000", 40, 50.0));
        let result = boll_score(&flat);
        assert_eq!(result.details.position, 50.0);
        assert_eq!(result.score, 10);
    }

    #[test]
    fn volume_blowout_is_penalized_but_floored() {
        let mut series = make_series("600000", 40, 10.0, 0.02);
        let last = series.len() - 1;
        series.volumes[last] = series.volumes[last - 1] * 10.0;
        let frame = IndicatorFrame::compute(series);
        let result = volume_score(&frame);
        // above both MAs (+7) but >3x ratio (-2)
        assert_eq!(result.score, 5);
        assert!(result.details.ratio > 3.0);
        assert!(result.score >= 0);
    }

    #[test]
    fn trend_gate_blocks_runaway_gains() {
        let mut series = make_series("600000", 40, 10.0, 0.02);
        let last = series.len() - 1;
        // 5-day cumulative gain of 25% trips the anti-chase ceiling.
        for i in (last - 4)..=last {
            series.pct_changes[i] = 5.0;
        }
        let frame = IndicatorFrame::compute(series);
        let result = trend_score(&frame, &TrendBands::default());
        assert!(result.details.gain_5d > 20.0);
        assert!(!result.passed);
    }

    #[test]
    fn trend_best_bands_earn_full_credit() {
        let mut series = make_series("600000", 40, 10.0, 0.02);
        let last = series.len() - 1;
        for change in series.pct_changes.iter_mut() {
            *change = 0.0;
        }
        // 5d sum = 8 (in [3,12]), 20d sum = 10 (in [8,20]), yesterday -1 (pullback)
        series.pct_changes[last] = 5.0;
        series.pct_changes[last - 1] = -1.0;
        series.pct_changes[last - 2] = 4.0;
        series.pct_changes[last - 10] = 2.0;
        let frame = IndicatorFrame::compute(series);
        let result = trend_score(&frame, &TrendBands::default());
        assert_eq!(result.score, 10);
        assert!(result.passed);
    }
}
