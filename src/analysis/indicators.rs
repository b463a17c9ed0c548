//! Rolling and exponentially-weighted indicator primitives.
//!
//! Every function is a pure transformation from input columns to a derived
//! column of the same length. Warmup rows (and rows whose window contains an
//! undefined value) come back as `f64::NAN`; consumers must treat NaN as
//! "insufficient history" and fail closed on any gating comparison. NaN
//! comparisons are always false, so `>`/`>=` gates get that for free.

use itertools::Itertools;
use statrs::statistics::Statistics;

/// Simple rolling mean. The first `window - 1` rows are NaN, as is any row
/// whose window contains a NaN.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Rolling *sample* standard deviation (ddof = 1, pinned; the provider-side
/// reference frames use the same default).
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().std_dev())
}

fn rolling_apply(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    for i in (window - 1)..values.len() {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = f(slice);
    }
    out
}

/// Rolling minimum with a growing head window (`min_periods = 1`): every row
/// has a value, early rows use however much history exists.
pub fn rolling_min_partial(values: &[f64], window: usize) -> Vec<f64> {
    rolling_partial(values, window, |acc, v| acc.min(v))
}

/// Rolling maximum with a growing head window (`min_periods = 1`).
pub fn rolling_max_partial(values: &[f64], window: usize) -> Vec<f64> {
    rolling_partial(values, window, |acc, v| acc.max(v))
}

fn rolling_partial(values: &[f64], window: usize, fold: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for i in 0..values.len() {
        let start = i.saturating_sub(window.saturating_sub(1));
        let mut acc = f64::NAN;
        for &v in &values[start..=i] {
            if v.is_nan() {
                continue;
            }
            acc = if acc.is_nan() { v } else { fold(acc, v) };
        }
        out[i] = acc;
    }
    out
}

/// Exponential recurrence `s[t] = α·x[t] + (1-α)·s[t-1]`, seeded with the
/// first defined value: the non-adjusted (adjust=False) semantics, no bias
/// correction. A NaN input carries the previous state forward in the output.
fn ewm(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    let mut state = f64::NAN;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            out[i] = state;
            continue;
        }
        state = if state.is_nan() {
            v
        } else {
            alpha * v + (1.0 - alpha) * state
        };
        out[i] = state;
    }
    out
}

/// EMA with span semantics: `α = 2 / (period + 1)`.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    ewm(values, 2.0 / (period as f64 + 1.0))
}

/// Exponential smoothing with center-of-mass semantics: `α = 1 / (1 + com)`.
fn ewm_com(values: &[f64], com: f64) -> Vec<f64> {
    ewm(values, 1.0 / (1.0 + com))
}

/// MACD line, signal line, histogram.
pub fn macd(close: &[f64], fast: usize, slow: usize, signal: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let ema_fast = ema(close, fast);
    let ema_slow = ema(close, slow);
    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&macd_line, signal);
    let histogram: Vec<f64> = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();
    (macd_line, signal_line, histogram)
}

/// RSI over simple rolling means of gains and losses (not Wilder's smoothing).
/// A zero average loss is an undefined ratio and yields NaN.
pub fn rsi(close: &[f64], period: usize) -> Vec<f64> {
    let n = close.len();
    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let delta = close[i] - close[i - 1];
        gains[i] = delta.max(0.0);
        losses[i] = (-delta).max(0.0);
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&gain, &loss)| {
            if gain.is_nan() || loss.is_nan() || loss == 0.0 {
                f64::NAN
            } else {
                100.0 - 100.0 / (1.0 + gain / loss)
            }
        })
        .collect()
}

/// K, D, J stochastic lines. RSV is undefined (NaN) on a window where
/// high == low; the smoothing carries across such bars instead of crashing.
pub fn kdj(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    n: usize,
    m1: usize,
    m2: usize,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let low_n = rolling_min_partial(low, n);
    let high_n = rolling_max_partial(high, n);

    let rsv: Vec<f64> = (0..close.len())
        .map(|i| {
            let range = high_n[i] - low_n[i];
            if range.abs() < f64::EPSILON || range.is_nan() {
                f64::NAN
            } else {
                (close[i] - low_n[i]) / range * 100.0
            }
        })
        .collect();

    let k = ewm_com(&rsv, m1 as f64 - 1.0);
    let d = ewm_com(&k, m2 as f64 - 1.0);
    let j: Vec<f64> = k.iter().zip(&d).map(|(k, d)| 3.0 * k - 2.0 * d).collect();
    (k, d, j)
}

/// Bollinger bands: (upper, middle, lower) at ±`width` sample standard deviations.
pub fn boll(close: &[f64], period: usize, width: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let middle = rolling_mean(close, period);
    let std = rolling_std(close, period);
    let upper: Vec<f64> = middle
        .iter()
        .zip(&std)
        .map(|(m, s)| m + width * s)
        .collect();
    let lower: Vec<f64> = middle
        .iter()
        .zip(&std)
        .map(|(m, s)| m - width * s)
        .collect();
    (upper, middle, lower)
}

/// Average true range. The first bar has no previous close, so its true
/// range is just high - low.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let tr: Vec<f64> = (0..close.len())
        .map(|i| {
            let hl = high[i] - low[i];
            if i == 0 {
                hl
            } else {
                let hc = (high[i] - close[i - 1]).abs();
                let lc = (low[i] - close[i - 1]).abs();
                hl.max(hc).max(lc)
            }
        })
        .collect();
    rolling_mean(&tr, period)
}

/// Golden cross: `short` moves from at-or-below to strictly above `long`
/// between bar t-1 and bar t. A single-bar inequality flip: never fires on a
/// bar where the relation merely persists, and NaN on either side suppresses it.
pub fn golden_cross(short: &[f64], long: &[f64]) -> Vec<bool> {
    cross(short, long, |s, l, ps, pl| s > l && ps <= pl)
}

/// Death cross: the symmetric opposite of [`golden_cross`].
pub fn death_cross(short: &[f64], long: &[f64]) -> Vec<bool> {
    cross(short, long, |s, l, ps, pl| s < l && ps >= pl)
}

fn cross(short: &[f64], long: &[f64], fires: impl Fn(f64, f64, f64, f64) -> bool) -> Vec<bool> {
    let n = short.len().min(long.len());
    let mut out = vec![false; n];
    for (i, ((prev_s, prev_l), (s, l))) in short
        .iter()
        .zip(long)
        .tuple_windows()
        .enumerate()
    {
        out[i + 1] = fires(*s, *l, *prev_s, *prev_l);
    }
    out
}
