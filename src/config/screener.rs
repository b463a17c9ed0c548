use serde::{Deserialize, Serialize};

use crate::config::Band;

/// Market-cap bands are configured in hundred-million (亿) units; snapshot rows
/// carry base currency units.
pub const HUNDRED_MILLION: f64 = 1e8;

/// Cheap attribute filters applied to the snapshot table before any
/// per-symbol history fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage1Config {
    /// Symbol prefixes excluded outright (science-innovation board, Beijing exchange).
    pub excluded_prefixes: Vec<String>,
    /// Names containing this marker are excluded (special-treatment flag).
    pub excluded_name_marker: String,
    /// Daily percent-change band, inclusive.
    pub change_band: Band,
    /// Turnover-rate band (percent), inclusive.
    pub turnover_band: Band,
    /// Total market value band in 亿, inclusive.
    pub market_cap_band: Band,
    /// Keep at most this many candidates for deep analysis.
    pub max_candidates: usize,
    /// Re-sort survivors by percent change descending before applying the cap.
    pub sort_by_change: bool,
}

impl Default for Stage1Config {
    fn default() -> Self {
        Self {
            excluded_prefixes: vec!["688".into(), "8".into(), "4".into()],
            excluded_name_marker: "ST".into(),
            change_band: Band::new(2.0, 6.5),
            turnover_band: Band::new(3.0, 18.0),
            market_cap_band: Band::new(30.0, 500.0),
            max_candidates: 500,
            sort_by_change: true,
        }
    }
}

/// Bands for the trend scorer. The `best_*` bands earn full credit; the
/// `ceiling_*` values are the hard anti-chase gate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrendBands {
    pub best_5d: Band,
    pub best_20d: Band,
    pub pullback: Band,
    pub ceiling_5d: f64,
    pub ceiling_20d: f64,
}

impl Default for TrendBands {
    fn default() -> Self {
        Self {
            best_5d: Band::new(3.0, 12.0),
            best_20d: Band::new(8.0, 20.0),
            pullback: Band::new(-2.0, 0.5),
            ceiling_5d: 20.0,
            ceiling_20d: 30.0,
        }
    }
}

/// Full configuration for one composite screening run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    pub stage1: Stage1Config,
    pub trend: TrendBands,
    /// Composite score threshold for the ranked result set.
    pub min_score: f64,
    /// History window fetched per candidate, in calendar days before the target date.
    pub history_days: i64,
    /// Candidates with fewer bars than this are skipped before scoring.
    pub min_bars: usize,
    /// Concurrent history fetch + scoring tasks. 1 means sequential.
    pub workers: usize,
    /// Politeness delay between fetches in sequential mode, milliseconds.
    pub sequential_delay_ms: u64,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            stage1: Stage1Config::default(),
            trend: TrendBands::default(),
            min_score: 75.0,
            history_days: 90,
            min_bars: 30,
            workers: 10,
            sequential_delay_ms: 200,
        }
    }
}

/// The MA120-proximity screener: price hovering around the 120-day line with
/// a recent limit-up in the lookback window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    pub stage1: Stage1Config,
    /// Acceptable close/MA120 ratio, inclusive.
    pub ma120_ratio_band: Band,
    /// How many trailing bars to scan for a limit-up.
    pub limit_up_lookback: usize,
    /// Daily percent change counted as a limit-up.
    pub limit_up_threshold: f64,
    pub history_days: i64,
    pub min_bars: usize,
    pub workers: usize,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            stage1: Stage1Config {
                change_band: Band::new(2.5, 5.0),
                turnover_band: Band::new(5.0, 10.0),
                market_cap_band: Band::new(40.0, 300.0),
                max_candidates: 100,
                sort_by_change: false,
                ..Stage1Config::default()
            },
            ma120_ratio_band: Band::new(0.95, 1.05),
            limit_up_lookback: 20,
            limit_up_threshold: 9.5,
            history_days: 180,
            min_bars: 120,
            workers: 10,
        }
    }
}

/// Per-feature weights for the similar-stock blend. They sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub trend: f64,
    pub momentum: f64,
    pub volatility: f64,
    pub volume: f64,
    pub valuation: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            trend: 0.30,
            momentum: 0.25,
            volatility: 0.15,
            volume: 0.15,
            valuation: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityConfig {
    pub weights: SimilarityWeights,
    /// Minimum similarity score (0-100) to keep a candidate.
    pub min_score: f64,
    pub top_n: usize,
    pub history_days: i64,
    /// At most this many candidates are feature-extracted per run.
    pub max_candidates: usize,
    pub workers: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            weights: SimilarityWeights::default(),
            min_score: 60.0,
            top_n: 10,
            history_days: 180,
            max_candidates: 100,
            workers: 10,
        }
    }
}
