//! Weighted composite of the seven sub-scores.

use serde::Serialize;

use crate::analysis::scorers::{
    self, BollDetails, KdjDetails, MaDetails, MacdDetails, RsiDetails, SubScore, TrendDetails,
    VolumeDetails,
};
use crate::config::TrendBands;
use crate::models::{IndicatorFrame, SubScores};

/// Sum of every scorer's maximum: 30 + 20 + 15 + 15 + 10 + 10 + 10.
pub const MAX_RAW_SCORE: i32 = scorers::MA_MAX
    + scorers::MACD_MAX
    + scorers::RSI_MAX
    + scorers::KDJ_MAX
    + scorers::BOLL_MAX
    + scorers::VOLUME_MAX
    + scorers::TREND_MAX;

/// One candidate's full evaluation for one day.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeScore {
    /// Unnormalized sum of sub-scores, 0..=110.
    pub raw_score: i32,
    /// Normalized to the 0-100 scale.
    pub total_score: f64,
    /// AND of the gating scorers (MA, RSI, KDJ, Trend). MACD, BOLL and
    /// Volume only contribute points.
    pub passed: bool,
    pub ma: SubScore<MaDetails>,
    pub macd: SubScore<MacdDetails>,
    pub rsi: SubScore<RsiDetails>,
    pub kdj: SubScore<KdjDetails>,
    pub boll: SubScore<BollDetails>,
    pub volume: SubScore<VolumeDetails>,
    pub trend: SubScore<TrendDetails>,
}

impl CompositeScore {
    pub fn sub_scores(&self) -> SubScores {
        SubScores {
            ma: self.ma.score,
            macd: self.macd.score,
            rsi: self.rsi.score,
            kdj: self.kdj.score,
            boll: self.boll.score,
            volume: self.volume.score,
            trend: self.trend.score,
        }
    }
}

/// Runs every sub-scorer over the frame and folds the results.
pub fn evaluate(frame: &IndicatorFrame, trend_bands: &TrendBands) -> CompositeScore {
    let ma = scorers::ma_score(frame);
    let macd = scorers::macd_score(frame);
    let rsi = scorers::rsi_score(frame);
    let kdj = scorers::kdj_score(frame);
    let boll = scorers::boll_score(frame);
    let volume = scorers::volume_score(frame);
    let trend = scorers::trend_score(frame, trend_bands);

    let raw_score = ma.score
        + macd.score
        + rsi.score
        + kdj.score
        + boll.score
        + volume.score
        + trend.score;
    let total_score = raw_score as f64 / MAX_RAW_SCORE as f64 * 100.0;
    let passed = ma.passed && trend.passed && rsi.passed && kdj.passed;

    CompositeScore {
        raw_score,
        total_score,
        passed,
        ma,
        macd,
        rsi,
        kdj,
        boll,
        volume,
        trend,
    }
}
