//! Next-day validation and the multi-day backtest loop.

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use log::{debug, info, warn};

use crate::config::AdjustMode;
use crate::data::HistoryProvider;
use crate::engine::Screener;
use crate::models::{BacktestSummary, DayStats, ForwardReturn, OhlcvSeries, ScreeningRow};
use crate::utils::{calendar_days_inclusive, mean};

/// How far past the target date the forward window reaches. Ten calendar
/// days always cover at least one trading day when one exists.
const FORWARD_WINDOW_DAYS: i64 = 10;

/// The first bar strictly after `target_date`, or `None` when the future
/// hasn't happened yet, which is a normal condition rather than an error.
pub async fn next_day_performance(
    history: &dyn HistoryProvider,
    symbol: &str,
    target_date: NaiveDate,
) -> Option<ForwardReturn> {
    let end = target_date + Duration::days(FORWARD_WINDOW_DAYS);
    let bars = match history
        .fetch_history(symbol, target_date, end, AdjustMode::Forward)
        .await
    {
        Ok(bars) => bars,
        Err(err) => {
            debug!("[backtest] {symbol} forward fetch failed: {err:#}");
            return None;
        }
    };

    let series = OhlcvSeries::from_bars(symbol, bars);
    series.first_bar_after(target_date).map(|bar| ForwardReturn {
        next_date: bar.date,
        next_open: bar.open,
        next_close: bar.close,
        next_change: bar.pct_change,
    })
}

/// Folds one day's screened rows into aggregate next-day statistics.
/// `None` when the day selected nothing or no candidate has a forward bar.
pub fn aggregate_day(date: NaiveDate, rows: &[ScreeningRow]) -> Option<DayStats> {
    if rows.is_empty() {
        return None;
    }
    let next_changes: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.forward.map(|f| f.next_change))
        .collect();
    if next_changes.is_empty() {
        return None;
    }

    let wins = next_changes.iter().filter(|c| **c > 0.0).count();
    let scores: Vec<f64> = rows.iter().map(|r| r.total_score).collect();

    Some(DayStats {
        date,
        selected: rows.len(),
        samples: next_changes.len(),
        avg_score: mean(&scores),
        avg_next_change: mean(&next_changes),
        win_rate: wins as f64 / next_changes.len() as f64 * 100.0,
        best_next_change: next_changes.iter().copied().fold(f64::MIN, f64::max),
        worst_next_change: next_changes.iter().copied().fold(f64::MAX, f64::min),
    })
}

/// Repeats the whole screening pipeline once per calendar day in
/// `[start, end]` with next-day checks on. Non-trading days fall out
/// naturally as empty candidate sets. A day that errors is logged and
/// skipped; the walk always finishes.
pub async fn run_multi_day(
    screener: &Screener,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BacktestSummary> {
    info!("[backtest] {start} ~ {end} | min_score={}", screener.config().min_score);

    let mut days = Vec::new();
    for date in calendar_days_inclusive(start, end) {
        match screener.run(date, true).await {
            Ok(rows) => {
                if let Some(stats) = aggregate_day(date, &rows) {
                    info!(
                        "[backtest] {date} | selected={} | next_avg={:+.2}% | win_rate={:.1}%",
                        stats.selected, stats.avg_next_change, stats.win_rate,
                    );
                    days.push(stats);
                }
            }
            Err(err) => warn!("[backtest] {date} failed: {err:#}"),
        }
    }

    info!(
        "[backtest] COMPLETE | days={} | selected={} | avg_next={:+.2}% | avg_win_rate={:.1}%",
        days.len(),
        days.iter().map(|d| d.selected).sum::<usize>(),
        mean(&days.iter().map(|d| d.avg_next_change).collect::<Vec<_>>()),
        mean(&days.iter().map(|d| d.win_rate).collect::<Vec<_>>()),
    );

    Ok(BacktestSummary { days })
}
