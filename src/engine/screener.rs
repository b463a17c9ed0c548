//! The composite screening pipeline.
//!
//! snapshot -> stage-1 filter -> per-candidate history fetch -> indicators ->
//! sub-scores -> composite -> threshold -> ranked rows, optionally extended
//! with next-day realized returns. Candidates are fully independent, so the
//! deep-analysis stage is a bounded parallel map: results arrive unordered
//! and are sorted once at the end. A single candidate failing (fetch error,
//! thin history, failed gates) is skipped, never fatal; only a total
//! snapshot-fetch failure aborts the run.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use futures::StreamExt;
use log::{debug, error, info};

use crate::analysis::composite::{self, CompositeScore};
use crate::config::{AdjustMode, ScreenerConfig};
use crate::data::{HistoryProvider, SnapshotCache};
use crate::domain::InstrumentSnapshot;
use crate::engine::{next_day_performance, stage1};
use crate::models::{ForwardReturn, IndicatorFrame, OhlcvSeries, ScreeningRow};

pub struct Screener {
    cache: Arc<SnapshotCache>,
    history: Arc<dyn HistoryProvider>,
    config: ScreenerConfig,
}

impl Screener {
    pub fn new(
        cache: Arc<SnapshotCache>,
        history: Arc<dyn HistoryProvider>,
        config: ScreenerConfig,
    ) -> Self {
        Self {
            cache,
            history,
            config,
        }
    }

    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    /// One full screening pass for `target_date`. With `check_next_day` each
    /// surviving row also gets its next trading day's outcome (when a future
    /// bar exists yet).
    pub async fn run(
        &self,
        target_date: NaiveDate,
        check_next_day: bool,
    ) -> Result<Vec<ScreeningRow>> {
        info!(
            "[screen] {target_date} | min_score={} | workers={}",
            self.config.min_score, self.config.workers
        );

        // Total snapshot failure is the one fatal condition: the run aborts
        // and the caller sees an empty result set.
        let snapshot = match self.cache.get_or_refresh().await {
            Ok(rows) => rows,
            Err(err) => {
                error!("[screen] snapshot fetch failed, aborting run: {err:#}");
                return Ok(Vec::new());
            }
        };
        info!("[screen] snapshot: {} instruments", snapshot.len());

        let candidates = stage1::apply(&snapshot, &self.config.stage1);
        info!("[screen] stage-1 kept {} candidates", candidates.len());
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let start_date = target_date - chrono::Duration::days(self.config.history_days);
        let sequential = self.config.workers <= 1;
        let total = candidates.len();

        let mut rows: Vec<ScreeningRow> = futures::stream::iter(candidates.into_iter().map(
            |candidate| async move {
                let row = self
                    .evaluate_candidate(candidate, start_date, target_date, check_next_day)
                    .await;
                if sequential {
                    tokio::time::sleep(Duration::from_millis(self.config.sequential_delay_ms))
                        .await;
                }
                row
            },
        ))
        .buffer_unordered(self.config.workers.max(1))
        .filter_map(|row| async move { row })
        .collect()
        .await;

        // Unordered completion: rank once everything is in. Ties break on the
        // symbol so reruns are deterministic.
        rows.sort_by(|a, b| {
            b.total_score
                .partial_cmp(&a.total_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        info!("[screen] {}/{} candidates qualified", rows.len(), total);
        Ok(rows)
    }

    /// Deep analysis of one stage-1 survivor. Every failure mode maps to
    /// `None`; the batch never aborts on a single symbol.
    async fn evaluate_candidate(
        &self,
        candidate: InstrumentSnapshot,
        start_date: NaiveDate,
        target_date: NaiveDate,
        check_next_day: bool,
    ) -> Option<ScreeningRow> {
        let bars = match self
            .history
            .fetch_history(&candidate.symbol, start_date, target_date, AdjustMode::Forward)
            .await
        {
            Ok(bars) => bars,
            Err(err) => {
                debug!("[screen] {} history fetch failed: {err:#}", candidate.symbol);
                return None;
            }
        };
        if bars.len() < self.config.min_bars {
            debug!(
                "[screen] {} skipped: {} bars < {}",
                candidate.symbol,
                bars.len(),
                self.config.min_bars
            );
            return None;
        }

        let series = OhlcvSeries::from_bars(candidate.symbol.clone(), bars);
        let frame = IndicatorFrame::compute(series);
        let result = composite::evaluate(&frame, &self.config.trend);

        if !result.passed {
            debug!("[screen] {} failed a core gate", candidate.symbol);
            return None;
        }
        if result.total_score < self.config.min_score {
            debug!(
                "[screen] {} scored {:.0} < {}",
                candidate.symbol, result.total_score, self.config.min_score
            );
            return None;
        }

        info!(
            "[screen] {} {} scored {:.0}",
            candidate.symbol, candidate.name, result.total_score
        );

        let forward = if check_next_day {
            next_day_performance(self.history.as_ref(), &candidate.symbol, target_date).await
        } else {
            None
        };

        Some(build_row(candidate, target_date, &result, forward))
    }
}

fn build_row(
    candidate: InstrumentSnapshot,
    target_date: NaiveDate,
    result: &CompositeScore,
    forward: Option<ForwardReturn>,
) -> ScreeningRow {
    ScreeningRow {
        market_cap_yi: candidate.market_cap_yi(),
        symbol: candidate.symbol,
        name: candidate.name,
        screen_date: target_date,
        total_score: result.total_score,
        last_price: candidate.last_price,
        pct_change: candidate.pct_change,
        turnover_rate: candidate.turnover_rate,
        ma5: result.ma.details.ma5,
        ma5_deviation_pct: result.ma.details.deviation_pct,
        macd: result.macd.details.macd,
        rsi: result.rsi.details.rsi,
        kdj_j: result.kdj.details.j,
        vol_ratio: result.volume.details.ratio,
        gain_5d: result.trend.details.gain_5d,
        gain_20d: result.trend.details.gain_20d,
        yesterday_change: result.trend.details.yesterday_change,
        scores: result.sub_scores(),
        forward,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use std::collections::HashMap;

    use crate::config::{Band, Stage1Config};
    use crate::domain::DailyBar;

    pub(crate) struct StaticSnapshot(pub Vec<InstrumentSnapshot>);

    #[async_trait]
    impl crate::data::SnapshotProvider for StaticSnapshot {
        async fn fetch_snapshot(&self) -> Result<Vec<InstrumentSnapshot>> {
            Ok(self.0.clone())
        }
    }

    pub(crate) struct StaticHistory(pub HashMap<String, Vec<DailyBar>>);

    #[async_trait]
    impl HistoryProvider for StaticHistory {
        async fn fetch_history(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
            _adjust: AdjustMode,
        ) -> Result<Vec<DailyBar>> {
            Ok(self
                .0
                .get(symbol)
                .map(|bars| {
                    bars.iter()
                        .filter(|b| b.date >= start && b.date <= end)
                        .copied()
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    pub(crate) fn base_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    /// Alternating +1.0% / -0.5% bars with a net drift up. Passes every
    /// composite gate with room to spare (RSI ~67, J ~80, 5d gain +2%).
    pub(crate) fn zigzag_bars(n: usize) -> Vec<DailyBar> {
        let mut bars = Vec::with_capacity(n);
        let mut close = 10.0;
        for i in 0..n {
            let pct_change = if i == 0 {
                0.0
            } else if i % 2 == 1 {
                1.0
            } else {
                -0.5
            };
            close *= 1.0 + pct_change / 100.0;
            bars.push(DailyBar {
                date: base_date() + ChronoDuration::days(i as i64),
                open: close / (1.0 + pct_change / 100.0),
                high: close * 1.002,
                low: close * 0.999,
                close,
                volume: 10_000.0 + 50.0 * i as f64,
                pct_change,
                turnover: 5.0,
            });
        }
        bars
    }

    pub(crate) fn flat_bars(n: usize) -> Vec<DailyBar> {
        (0..n)
            .map(|i| DailyBar {
                date: base_date() + ChronoDuration::days(i as i64),
                open: 10.0,
                high: 10.0,
                low: 10.0,
                close: 10.0,
                volume: 10_000.0,
                pct_change: 0.0,
                turnover: 5.0,
            })
            .collect()
    }

    pub(crate) fn snapshot_row(symbol: &str, name: &str) -> InstrumentSnapshot {
        InstrumentSnapshot {
            symbol: symbol.into(),
            name: name.into(),
            last_price: 10.0,
            pct_change: 3.0,
            turnover_rate: 5.0,
            total_market_cap: 100.0 * crate::config::HUNDRED_MILLION,
            float_market_cap: 80.0 * crate::config::HUNDRED_MILLION,
            open: 9.9,
            high: 10.2,
            low: 9.8,
            volume: 1.0e6,
            amount: 1.0e9,
            volume_ratio: 1.2,
            pe_dynamic: 20.0,
        }
    }

    fn test_config(min_score: f64) -> ScreenerConfig {
        ScreenerConfig {
            min_score,
            workers: 4,
            stage1: Stage1Config {
                change_band: Band::new(2.0, 6.5),
                ..Stage1Config::default()
            },
            ..ScreenerConfig::default()
        }
    }

    fn make_screener(
        snapshot: Vec<InstrumentSnapshot>,
        history: HashMap<String, Vec<DailyBar>>,
        min_score: f64,
    ) -> Screener {
        let cache = Arc::new(SnapshotCache::new(
            Arc::new(StaticSnapshot(snapshot)),
            Duration::from_secs(60),
        ));
        Screener::new(cache, Arc::new(StaticHistory(history)), test_config(min_score))
    }

    #[tokio::test]
    async fn strong_candidate_survives_and_gets_forward_return() {
        // 61 bars: the screen runs on bar 59, bar 60 is the next trading day.
        let bars = zigzag_bars(61);
        let target_date = bars[59].date;
        let next = bars[60];

        let history = HashMap::from([("600000".to_string(), bars)]);
        let screener = make_screener(
            vec![snapshot_row("600000", "浦发银行")],
            history,
            60.0,
        );

        let rows = screener.run(target_date, true).await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert!(row.total_score >= 60.0);
        assert_eq!(row.screen_date, target_date);

        let forward = row.forward.expect("bar 60 exists, forward must be present");
        assert_eq!(forward.next_date, next.date);
        assert_eq!(forward.next_change, next.pct_change);
    }

    #[tokio::test]
    async fn gate_failure_excludes_regardless_of_threshold() {
        // Flat series: RSI is undefined, the gate fails closed, and even a
        // zero threshold must not resurrect the candidate.
        let history = HashMap::from([("600001".to_string(), flat_bars(61))]);
        let screener = make_screener(vec![snapshot_row("600001", "一潭死水")], history, 0.0);

        let rows = screener.run(base_date() + ChronoDuration::days(59), false).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn thin_history_is_skipped_not_fatal() {
        let good = zigzag_bars(61);
        let target_date = good[59].date;
        let history = HashMap::from([
            ("600000".to_string(), good),
            ("600002".to_string(), zigzag_bars(10)),
        ]);
        let screener = make_screener(
            vec![
                snapshot_row("600000", "浦发银行"),
                snapshot_row("600002", "次新股"),
            ],
            history,
            60.0,
        );

        let rows = screener.run(target_date, false).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].symbol, "600000");
        assert!(rows[0].forward.is_none());
    }

    #[tokio::test]
    async fn ranking_is_score_desc_then_symbol_asc() {
        let bars = zigzag_bars(61);
        let target_date = bars[59].date;
        let history = HashMap::from([
            ("600000".to_string(), bars.clone()),
            ("600003".to_string(), bars.clone()),
            ("000002".to_string(), bars),
        ]);
        let screener = make_screener(
            vec![
                snapshot_row("600003", "丙"),
                snapshot_row("000002", "甲"),
                snapshot_row("600000", "乙"),
            ],
            history,
            0.0,
        );

        let rows = screener.run(target_date, false).await.unwrap();
        assert_eq!(rows.len(), 3);
        // Identical histories mean identical scores: symbol breaks the tie.
        let symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["000002", "600000", "600003"]);
    }
}
