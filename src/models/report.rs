use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The seven sub-score points, exactly as they entered the composite sum.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SubScores {
    pub ma: i32,
    pub macd: i32,
    pub rsi: i32,
    pub kdj: i32,
    pub boll: i32,
    pub volume: i32,
    pub trend: i32,
}

/// Next trading day's realized outcome for one screened candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardReturn {
    pub next_date: NaiveDate,
    pub next_open: f64,
    pub next_close: f64,
    /// Next day's signed percent change.
    pub next_change: f64,
}

/// One ranked survivor of a composite screening pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningRow {
    pub symbol: String,
    pub name: String,
    pub screen_date: NaiveDate,
    pub total_score: f64,
    pub last_price: f64,
    pub pct_change: f64,
    pub turnover_rate: f64,
    pub market_cap_yi: f64,
    pub ma5: f64,
    pub ma5_deviation_pct: f64,
    pub macd: f64,
    pub rsi: f64,
    pub kdj_j: f64,
    pub vol_ratio: f64,
    pub gain_5d: f64,
    pub gain_20d: f64,
    pub yesterday_change: f64,
    pub scores: SubScores,
    /// `None` means "no future bar yet", a normal condition rather than an error.
    pub forward: Option<ForwardReturn>,
}

/// Aggregate next-day statistics for one screened day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DayStats {
    pub date: NaiveDate,
    pub selected: usize,
    /// Candidates with a known next-day outcome.
    pub samples: usize,
    pub avg_score: f64,
    pub avg_next_change: f64,
    /// Fraction of samples with a positive next-day change, in percent.
    pub win_rate: f64,
    pub best_next_change: f64,
    pub worst_next_change: f64,
}

/// Multi-day backtest rollup: one [`DayStats`] per day that produced candidates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub days: Vec<DayStats>,
}

impl BacktestSummary {
    pub fn total_selected(&self) -> usize {
        self.days.iter().map(|d| d.selected).sum()
    }

    pub fn avg_selected_per_day(&self) -> f64 {
        if self.days.is_empty() {
            return 0.0;
        }
        self.total_selected() as f64 / self.days.len() as f64
    }

    pub fn avg_next_change(&self) -> f64 {
        crate::utils::mean(&self.days.iter().map(|d| d.avg_next_change).collect::<Vec<_>>())
    }

    pub fn avg_win_rate(&self) -> f64 {
        crate::utils::mean(&self.days.iter().map(|d| d.win_rate).collect::<Vec<_>>())
    }
}

/// One survivor of the MA120-proximity screener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedRow {
    pub symbol: String,
    pub name: String,
    pub last_price: f64,
    pub pct_change: f64,
    pub ma120: f64,
    pub price_to_ma120: f64,
    pub turnover_rate: f64,
    pub market_cap_yi: f64,
    pub last_limit_up: NaiveDate,
    pub limit_up_count: usize,
}

/// One candidate ranked by similarity to the target symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarRow {
    pub symbol: String,
    pub name: String,
    /// Similarity score, 0-100.
    pub similarity: f64,
    pub last_price: f64,
    pub pct_change: f64,
    pub turnover_rate: f64,
    pub rsi: f64,
    pub ma_trend: f64,
    pub pe: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backtest_summary_averages() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
        let summary = BacktestSummary {
            days: vec![
                DayStats {
                    date,
                    selected: 4,
                    samples: 4,
                    avg_score: 80.0,
                    avg_next_change: 1.0,
                    win_rate: 50.0,
                    best_next_change: 3.0,
                    worst_next_change: -1.0,
                },
                DayStats {
                    date: date.succ_opt().unwrap(),
                    selected: 2,
                    samples: 2,
                    avg_score: 78.0,
                    avg_next_change: -0.5,
                    win_rate: 0.0,
                    best_next_change: 0.0,
                    worst_next_change: -1.0,
                },
            ],
        };
        assert_eq!(summary.total_selected(), 6);
        assert!((summary.avg_selected_per_day() - 3.0).abs() < 1e-12);
        assert!((summary.avg_next_change() - 0.25).abs() < 1e-12);
        assert!((summary.avg_win_rate() - 25.0).abs() < 1e-12);
    }
}
