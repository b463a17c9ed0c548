//! Similar-stock finder: feature-vector extraction plus a weighted
//! pairwise blend against one target symbol.

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use futures::StreamExt;
use log::{debug, error, info, warn};

use crate::analysis::similarity::{self, StockFeatures};
use crate::config::{AdjustMode, SimilarityConfig};
use crate::data::{HistoryProvider, SnapshotCache};
use crate::domain::InstrumentSnapshot;
use crate::models::{IndicatorFrame, OhlcvSeries, SimilarRow};

pub struct SimilarFinder {
    cache: Arc<SnapshotCache>,
    history: Arc<dyn HistoryProvider>,
    config: SimilarityConfig,
}

impl SimilarFinder {
    pub fn new(
        cache: Arc<SnapshotCache>,
        history: Arc<dyn HistoryProvider>,
        config: SimilarityConfig,
    ) -> Self {
        Self {
            cache,
            history,
            config,
        }
    }

    pub async fn run(&self, target_symbol: &str, target_date: NaiveDate) -> Result<Vec<SimilarRow>> {
        info!("[similar] target {target_symbol} | top {}", self.config.top_n);

        let snapshot = match self.cache.get_or_refresh().await {
            Ok(rows) => rows,
            Err(err) => {
                error!("[similar] snapshot fetch failed, aborting run: {err:#}");
                return Ok(Vec::new());
            }
        };
        let target_snapshot = snapshot.iter().find(|r| r.symbol == target_symbol);

        let Some(target_features) = self
            .extract(target_symbol, target_snapshot, target_date)
            .await
        else {
            warn!("[similar] cannot extract features for target {target_symbol}");
            return Ok(Vec::new());
        };
        info!(
            "[similar] target profile | trend {:+.2}% | rsi {:.1} | volatility {:.2}%",
            target_features.ma_trend, target_features.rsi, target_features.volatility,
        );

        // Same universe trim as the screeners: no science-innovation board,
        // no special-treatment names, and never the target itself.
        let candidates: Vec<InstrumentSnapshot> = snapshot
            .iter()
            .filter(|r| {
                r.symbol != target_symbol
                    && !r.symbol.starts_with("688")
                    && !r.name.contains("ST")
            })
            .take(self.config.max_candidates)
            .cloned()
            .collect();
        info!("[similar] scoring {} candidates", candidates.len());

        let mut rows: Vec<SimilarRow> = futures::stream::iter(candidates.into_iter().map(
            |candidate| async move {
                let features = self
                    .extract(&candidate.symbol, Some(&candidate), target_date)
                    .await?;
                let score =
                    similarity::similarity_score(&target_features, &features, &self.config.weights);
                if score < self.config.min_score {
                    return None;
                }
                Some(SimilarRow {
                    symbol: candidate.symbol,
                    name: candidate.name,
                    similarity: score,
                    last_price: candidate.last_price,
                    pct_change: candidate.pct_change,
                    turnover_rate: candidate.turnover_rate,
                    rsi: features.rsi,
                    ma_trend: features.ma_trend,
                    pe: features.pe,
                })
            },
        ))
        .buffer_unordered(self.config.workers.max(1))
        .filter_map(|row| async move { row })
        .collect()
        .await;

        rows.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        rows.truncate(self.config.top_n);

        info!("[similar] {} similar stocks found", rows.len());
        Ok(rows)
    }

    async fn extract(
        &self,
        symbol: &str,
        snapshot: Option<&InstrumentSnapshot>,
        target_date: NaiveDate,
    ) -> Option<StockFeatures> {
        let start_date = target_date - chrono::Duration::days(self.config.history_days);
        let bars = match self
            .history
            .fetch_history(symbol, start_date, target_date, AdjustMode::Forward)
            .await
        {
            Ok(bars) => bars,
            Err(err) => {
                debug!("[similar] {symbol} history fetch failed: {err:#}");
                return None;
            }
        };

        let series = OhlcvSeries::from_bars(symbol, bars);
        let frame = IndicatorFrame::compute(series);
        similarity::extract_features(&frame, snapshot)
    }
}
