//! Cheap attribute filters over the snapshot table: the cost-reduction gate
//! that runs before any per-symbol history fetch.

use std::cmp::Ordering;

use log::debug;

use crate::config::{HUNDRED_MILLION, Stage1Config};
use crate::domain::InstrumentSnapshot;

/// Sequential AND of the stage-1 conditions. Input order is preserved unless
/// the config asks for a percent-change re-sort, which only kicks in when the
/// survivor set exceeds the analysis cap.
pub fn apply(rows: &[InstrumentSnapshot], config: &Stage1Config) -> Vec<InstrumentSnapshot> {
    let mut kept: Vec<&InstrumentSnapshot> = rows
        .iter()
        .filter(|row| {
            !config
                .excluded_prefixes
                .iter()
                .any(|prefix| row.symbol.starts_with(prefix.as_str()))
                && !row.name.contains(&config.excluded_name_marker)
        })
        .collect();
    debug!("[stage1] board/name exclusions -> {}", kept.len());

    kept.retain(|row| config.change_band.contains(row.pct_change));
    debug!("[stage1] change {} -> {}", config.change_band, kept.len());

    kept.retain(|row| config.turnover_band.contains(row.turnover_rate));
    debug!("[stage1] turnover {} -> {}", config.turnover_band, kept.len());

    kept.retain(|row| {
        config
            .market_cap_band
            .contains(row.total_market_cap / HUNDRED_MILLION)
    });
    debug!(
        "[stage1] market cap {}亿 -> {}",
        config.market_cap_band,
        kept.len()
    );

    let mut kept: Vec<InstrumentSnapshot> = kept.into_iter().cloned().collect();
    if kept.len() > config.max_candidates {
        if config.sort_by_change {
            kept.sort_by(|a, b| {
                b.pct_change
                    .partial_cmp(&a.pct_change)
                    .unwrap_or(Ordering::Equal)
            });
        }
        kept.truncate(config.max_candidates);
        debug!("[stage1] capped to top {}", config.max_candidates);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Band;

    fn snapshot(symbol: &str, name: &str, pct_change: f64) -> InstrumentSnapshot {
        InstrumentSnapshot {
            symbol: symbol.into(),
            name: name.into(),
            last_price: 10.0,
            pct_change,
            turnover_rate: 5.0,
            total_market_cap: 100.0 * HUNDRED_MILLION,
            float_market_cap: 80.0 * HUNDRED_MILLION,
            open: 9.9,
            high: 10.2,
            low: 9.8,
            volume: 1.0e6,
            amount: 1.0e9,
            volume_ratio: 1.2,
            pe_dynamic: 20.0,
        }
    }

    #[test]
    fn change_band_boundaries_are_inclusive() {
        let rows: Vec<InstrumentSnapshot> = [2.9, 3.0, 5.0, 7.0, 7.1]
            .iter()
            .enumerate()
            .map(|(i, &chg)| snapshot(&format!("60000{i}"), "候选", chg))
            .collect();
        let config = Stage1Config {
            change_band: Band::new(3.0, 7.0),
            ..Stage1Config::default()
        };
        let kept = apply(&rows, &config);
        let changes: Vec<f64> = kept.iter().map(|r| r.pct_change).collect();
        assert_eq!(changes, vec![3.0, 5.0, 7.0]);
    }

    #[test]
    fn excludes_blacklisted_boards_and_st_names() {
        let rows = vec![
            snapshot("688001", "科创股", 4.0),
            snapshot("830001", "北交股", 4.0),
            snapshot("430001", "老三板", 4.0),
            snapshot("600001", "*ST退市", 4.0),
            snapshot("000001", "平安银行", 4.0),
        ];
        let kept = apply(&rows, &Stage1Config::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].symbol, "000001");
    }

    #[test]
    fn market_cap_band_is_in_hundred_million_units() {
        let mut small = snapshot("600001", "小盘", 4.0);
        small.total_market_cap = 10.0 * HUNDRED_MILLION;
        let mut big = snapshot("600002", "大盘", 4.0);
        big.total_market_cap = 900.0 * HUNDRED_MILLION;
        let in_band = snapshot("600003", "合适", 4.0);

        let kept = apply(&[small, big, in_band], &Stage1Config::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].symbol, "600003");
    }

    #[test]
    fn nan_fields_never_survive_a_band() {
        let mut suspended = snapshot("600004", "停牌", f64::NAN);
        suspended.turnover_rate = f64::NAN;
        assert!(apply(&[suspended], &Stage1Config::default()).is_empty());
    }

    #[test]
    fn cap_keeps_top_movers_when_sorting_is_on() {
        let rows: Vec<InstrumentSnapshot> = (0..5)
            .map(|i| snapshot(&format!("60000{i}"), "候选", 2.0 + i as f64 * 0.5))
            .collect();
        let config = Stage1Config {
            max_candidates: 2,
            sort_by_change: true,
            ..Stage1Config::default()
        };
        let kept = apply(&rows, &config);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].pct_change, 4.0);
        assert_eq!(kept[1].pct_change, 3.5);
    }

    #[test]
    fn order_is_preserved_under_the_cap() {
        let rows = vec![
            snapshot("600009", "九", 6.0),
            snapshot("600001", "一", 3.0),
        ];
        let kept = apply(&rows, &Stage1Config::default());
        assert_eq!(kept[0].symbol, "600009");
        assert_eq!(kept[1].symbol, "600001");
    }
}
