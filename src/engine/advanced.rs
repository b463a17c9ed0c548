//! MA120-proximity screener: price consolidating around the 120-day line
//! after a recent limit-up.

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use futures::StreamExt;
use log::{debug, error, info};

use crate::analysis::indicators;
use crate::config::{AdjustMode, AdvancedConfig};
use crate::data::{HistoryProvider, SnapshotCache};
use crate::domain::InstrumentSnapshot;
use crate::engine::stage1;
use crate::models::{AdvancedRow, OhlcvSeries};

pub struct AdvancedScreener {
    cache: Arc<SnapshotCache>,
    history: Arc<dyn HistoryProvider>,
    config: AdvancedConfig,
}

impl AdvancedScreener {
    pub fn new(
        cache: Arc<SnapshotCache>,
        history: Arc<dyn HistoryProvider>,
        config: AdvancedConfig,
    ) -> Self {
        Self {
            cache,
            history,
            config,
        }
    }

    pub async fn run(&self, target_date: NaiveDate) -> Result<Vec<AdvancedRow>> {
        info!(
            "[advanced] {target_date} | ratio {} | limit-up in last {} bars",
            self.config.ma120_ratio_band, self.config.limit_up_lookback
        );

        let snapshot = match self.cache.get_or_refresh().await {
            Ok(rows) => rows,
            Err(err) => {
                error!("[advanced] snapshot fetch failed, aborting run: {err:#}");
                return Ok(Vec::new());
            }
        };
        let candidates = stage1::apply(&snapshot, &self.config.stage1);
        info!("[advanced] stage-1 kept {} candidates", candidates.len());
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let start_date = target_date - chrono::Duration::days(self.config.history_days);
        let mut rows: Vec<AdvancedRow> = futures::stream::iter(
            candidates
                .into_iter()
                .map(|candidate| self.evaluate_candidate(candidate, start_date, target_date)),
        )
        .buffer_unordered(self.config.workers.max(1))
        .filter_map(|row| async move { row })
        .collect()
        .await;

        rows.sort_by(|a, b| {
            b.pct_change
                .partial_cmp(&a.pct_change)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        info!("[advanced] {} candidates qualified", rows.len());
        Ok(rows)
    }

    async fn evaluate_candidate(
        &self,
        candidate: InstrumentSnapshot,
        start_date: NaiveDate,
        target_date: NaiveDate,
    ) -> Option<AdvancedRow> {
        let bars = match self
            .history
            .fetch_history(&candidate.symbol, start_date, target_date, AdjustMode::Forward)
            .await
        {
            Ok(bars) => bars,
            Err(err) => {
                debug!("[advanced] {} history fetch failed: {err:#}", candidate.symbol);
                return None;
            }
        };
        if bars.len() < self.config.min_bars {
            return None;
        }

        let series = OhlcvSeries::from_bars(candidate.symbol.clone(), bars);
        let t = series.len() - 1;

        let ma120 = indicators::rolling_mean(&series.closes, 120)[t];
        if ma120.is_nan() {
            return None;
        }

        let close = series.closes[t];
        let ratio = close / ma120;
        if !self.config.ma120_ratio_band.contains(ratio) {
            debug!("[advanced] {} close/MA120 {:.3} outside band", series.symbol, ratio);
            return None;
        }

        // Any limit-up inside the lookback window qualifies; remember them all.
        let lookback_start = series.len().saturating_sub(self.config.limit_up_lookback);
        let limit_up_dates: Vec<NaiveDate> = (lookback_start..series.len())
            .filter(|&i| series.pct_changes[i] >= self.config.limit_up_threshold)
            .map(|i| series.dates[i])
            .collect();
        let last_limit_up = *limit_up_dates.last()?;

        info!(
            "[advanced] {} {} | close/MA120 {:.3} | {} limit-up(s)",
            candidate.symbol,
            candidate.name,
            ratio,
            limit_up_dates.len(),
        );

        Some(AdvancedRow {
            market_cap_yi: candidate.market_cap_yi(),
            symbol: candidate.symbol,
            name: candidate.name,
            last_price: close,
            pct_change: candidate.pct_change,
            ma120,
            price_to_ma120: ratio,
            turnover_rate: candidate.turnover_rate,
            last_limit_up,
            limit_up_count: limit_up_dates.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Band;
    use crate::domain::DailyBar;
    use crate::engine::screener::tests::{StaticHistory, StaticSnapshot, base_date};
    use chrono::Duration as ChronoDuration;
    use std::collections::HashMap;
    use std::time::Duration;

    /// 150 flat-ish bars hugging 10.0 so close/MA120 ≈ 1, with one +9.8%
    /// spike `spike_offset` bars from the end (price reverts next bar).
    fn consolidation_bars(n: usize, spike_offset: usize) -> Vec<DailyBar> {
        (0..n)
            .map(|i| {
                let spike = i == n - 1 - spike_offset;
                let close = if spike { 10.98 } else { 10.0 };
                DailyBar {
                    date: base_date() + ChronoDuration::days(i as i64),
                    open: 10.0,
                    high: close * 1.001,
                    low: 9.99,
                    close,
                    volume: 10_000.0,
                    pct_change: if spike { 9.8 } else { 0.0 },
                    turnover: 6.0,
                }
            })
            .collect()
    }

    fn advanced_snapshot(symbol: &str) -> InstrumentSnapshot {
        InstrumentSnapshot {
            symbol: symbol.into(),
            name: "整理平台".into(),
            last_price: 10.0,
            pct_change: 3.0,
            turnover_rate: 6.0,
            total_market_cap: 100.0 * crate::config::HUNDRED_MILLION,
            float_market_cap: 90.0 * crate::config::HUNDRED_MILLION,
            open: 9.9,
            high: 10.2,
            low: 9.8,
            volume: 1.0e6,
            amount: 1.0e9,
            volume_ratio: 1.2,
            pe_dynamic: 15.0,
        }
    }

    fn make_screener(history: HashMap<String, Vec<DailyBar>>, symbols: &[&str]) -> AdvancedScreener {
        let snapshot = symbols.iter().map(|s| advanced_snapshot(s)).collect();
        let cache = Arc::new(SnapshotCache::new(
            Arc::new(StaticSnapshot(snapshot)),
            Duration::from_secs(60),
        ));
        let config = AdvancedConfig {
            stage1: crate::config::Stage1Config {
                change_band: Band::new(2.5, 5.0),
                turnover_band: Band::new(5.0, 10.0),
                ..crate::config::Stage1Config::default()
            },
            ..AdvancedConfig::default()
        };
        AdvancedScreener::new(cache, Arc::new(StaticHistory(history)), config)
    }

    #[tokio::test]
    async fn keeps_ma120_consolidation_with_recent_limit_up() {
        let bars = consolidation_bars(150, 5);
        let target_date = bars[149].date;
        let history = HashMap::from([("600000".to_string(), bars)]);

        let rows = make_screener(history, &["600000"]).run(target_date).await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert!(row.price_to_ma120 > 0.95 && row.price_to_ma120 < 1.05);
        assert_eq!(row.limit_up_count, 1);
        assert_eq!(row.last_limit_up, target_date - ChronoDuration::days(5));
    }

    #[tokio::test]
    async fn drops_candidates_without_a_limit_up_in_the_window() {
        // Spike sits 30 bars back, outside the 20-bar lookback.
        let bars = consolidation_bars(150, 30);
        let target_date = bars[149].date;
        let history = HashMap::from([("600001".to_string(), bars)]);

        let rows = make_screener(history, &["600001"]).run(target_date).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn drops_thin_histories() {
        let bars = consolidation_bars(100, 5);
        let target_date = bars[99].date;
        let history = HashMap::from([("600002".to_string(), bars)]);

        let rows = make_screener(history, &["600002"]).run(target_date).await.unwrap();
        assert!(rows.is_empty());
    }
}
