//! Terminal tables and the per-run CSV export.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{AdvancedRow, BacktestSummary, ScreeningRow, SimilarRow};
use crate::utils::{format_compact_date, mean};

#[derive(Tabled)]
struct ScreeningDisplay {
    #[tabled(rename = "代码")]
    symbol: String,
    #[tabled(rename = "名称")]
    name: String,
    #[tabled(rename = "评分")]
    score: String,
    #[tabled(rename = "最新价")]
    price: String,
    #[tabled(rename = "涨跌幅")]
    change: String,
    #[tabled(rename = "换手率")]
    turnover: String,
    #[tabled(rename = "偏离MA5")]
    deviation: String,
    #[tabled(rename = "RSI")]
    rsi: String,
    #[tabled(rename = "量比")]
    vol_ratio: String,
    #[tabled(rename = "5日涨幅")]
    gain_5d: String,
    #[tabled(rename = "次日涨跌")]
    next_change: String,
}

impl From<&ScreeningRow> for ScreeningDisplay {
    fn from(row: &ScreeningRow) -> Self {
        Self {
            symbol: row.symbol.clone(),
            name: row.name.clone(),
            score: format!("{:.0}", row.total_score),
            price: format!("{:.2}", row.last_price),
            change: format!("{:+.2}%", row.pct_change),
            turnover: format!("{:.2}%", row.turnover_rate),
            deviation: format!("{:+.2}%", row.ma5_deviation_pct),
            rsi: format!("{:.1}", row.rsi),
            vol_ratio: format!("{:.2}", row.vol_ratio),
            gain_5d: format!("{:+.2}%", row.gain_5d),
            next_change: match row.forward {
                Some(f) => format!("{:+.2}%", f.next_change),
                None => "无数据".to_string(),
            },
        }
    }
}

/// Ranked results plus the aggregate footer the terminal user reads first.
pub fn print_screening_table(rows: &[ScreeningRow], top_n: Option<usize>) {
    if rows.is_empty() {
        println!("没有筛选结果");
        return;
    }
    let shown = match top_n {
        Some(n) => &rows[..n.min(rows.len())],
        None => rows,
    };

    let table = Table::new(shown.iter().map(ScreeningDisplay::from)).with(Style::psql()).to_string();
    println!("{table}");

    let scores: Vec<f64> = shown.iter().map(|r| r.total_score).collect();
    let changes: Vec<f64> = shown.iter().map(|r| r.pct_change).collect();
    println!(
        "共 {} 只 | 平均评分 {:.1} | 平均涨幅 {:+.2}%",
        shown.len(),
        mean(&scores),
        mean(&changes),
    );

    let next_changes: Vec<f64> = shown
        .iter()
        .filter_map(|r| r.forward.map(|f| f.next_change))
        .collect();
    if !next_changes.is_empty() {
        let wins = next_changes.iter().filter(|c| **c > 0.0).count();
        println!(
            "次日表现: 有效样本 {} | 平均 {:+.2}% | 胜率 {:.1}% | 最大 {:+.2}% | 最小 {:+.2}%",
            next_changes.len(),
            mean(&next_changes),
            wins as f64 / next_changes.len() as f64 * 100.0,
            next_changes.iter().copied().fold(f64::MIN, f64::max),
            next_changes.iter().copied().fold(f64::MAX, f64::min),
        );
    }
}

#[derive(Tabled)]
struct DayStatsDisplay {
    #[tabled(rename = "日期")]
    date: String,
    #[tabled(rename = "选中")]
    selected: usize,
    #[tabled(rename = "平均评分")]
    avg_score: String,
    #[tabled(rename = "次日平均")]
    avg_next: String,
    #[tabled(rename = "胜率")]
    win_rate: String,
    #[tabled(rename = "最大涨幅")]
    best: String,
    #[tabled(rename = "最大跌幅")]
    worst: String,
}

pub fn print_backtest_summary(summary: &BacktestSummary) {
    if summary.days.is_empty() {
        println!("回测区间内没有产生任何候选");
        return;
    }

    let table = Table::new(summary.days.iter().map(|d| DayStatsDisplay {
        date: d.date.to_string(),
        selected: d.selected,
        avg_score: format!("{:.1}", d.avg_score),
        avg_next: format!("{:+.2}%", d.avg_next_change),
        win_rate: format!("{:.1}%", d.win_rate),
        best: format!("{:+.2}%", d.best_next_change),
        worst: format!("{:+.2}%", d.worst_next_change),
    }))
    .with(Style::psql())
    .to_string();
    println!("{table}");

    println!(
        "共 {} 个交易日 | 选中 {} 只 | 日均 {:.1} 只 | 平均次日 {:+.2}% | 平均胜率 {:.1}%",
        summary.days.len(),
        summary.total_selected(),
        summary.avg_selected_per_day(),
        summary.avg_next_change(),
        summary.avg_win_rate(),
    );
}

#[derive(Tabled)]
struct AdvancedDisplay {
    #[tabled(rename = "代码")]
    symbol: String,
    #[tabled(rename = "名称")]
    name: String,
    #[tabled(rename = "最新价")]
    price: String,
    #[tabled(rename = "涨跌幅")]
    change: String,
    #[tabled(rename = "价格/MA120")]
    ratio: String,
    #[tabled(rename = "换手率")]
    turnover: String,
    #[tabled(rename = "涨停日期")]
    last_limit_up: String,
    #[tabled(rename = "涨停次数")]
    limit_ups: usize,
}

pub fn print_advanced_table(rows: &[AdvancedRow]) {
    if rows.is_empty() {
        println!("没有筛选结果");
        return;
    }
    let table = Table::new(rows.iter().map(|r| AdvancedDisplay {
        symbol: r.symbol.clone(),
        name: r.name.clone(),
        price: format!("{:.2}", r.last_price),
        change: format!("{:+.2}%", r.pct_change),
        ratio: format!("{:.3}", r.price_to_ma120),
        turnover: format!("{:.2}%", r.turnover_rate),
        last_limit_up: r.last_limit_up.to_string(),
        limit_ups: r.limit_up_count,
    }))
    .with(Style::psql())
    .to_string();
    println!("{table}");
}

#[derive(Tabled)]
struct SimilarDisplay {
    #[tabled(rename = "代码")]
    symbol: String,
    #[tabled(rename = "名称")]
    name: String,
    #[tabled(rename = "相似度")]
    similarity: String,
    #[tabled(rename = "最新价")]
    price: String,
    #[tabled(rename = "涨跌幅")]
    change: String,
    #[tabled(rename = "RSI")]
    rsi: String,
    #[tabled(rename = "趋势")]
    trend: String,
}

pub fn print_similar_table(rows: &[SimilarRow]) {
    if rows.is_empty() {
        println!("未找到相似的股票");
        return;
    }
    let table = Table::new(rows.iter().map(|r| SimilarDisplay {
        symbol: r.symbol.clone(),
        name: r.name.clone(),
        similarity: format!("{:.1}", r.similarity),
        price: format!("{:.2}", r.last_price),
        change: format!("{:+.2}%", r.pct_change),
        rsi: format!("{:.1}", r.rsi),
        trend: format!("{:+.2}", r.ma_trend),
    }))
    .with(Style::psql())
    .to_string();
    println!("{table}");
}

/// Writes the full result set, sub-score columns included, to
/// `<dir>/tail_screen_<date>_<time>.csv` and returns the path.
pub fn export_screening_csv(rows: &[ScreeningRow], dir: &Path) -> Result<PathBuf> {
    let first = rows
        .first()
        .context("nothing to export: empty result set")?;
    let stamp = chrono::Local::now().format("%H%M%S");
    let path = dir.join(format!(
        "tail_screen_{}_{stamp}.csv",
        format_compact_date(first.screen_date),
    ));

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "symbol",
        "name",
        "screen_date",
        "total_score",
        "last_price",
        "pct_change",
        "turnover_rate",
        "market_cap_yi",
        "ma5",
        "ma5_deviation_pct",
        "macd",
        "rsi",
        "kdj_j",
        "vol_ratio",
        "gain_5d",
        "gain_20d",
        "yesterday_change",
        "score_ma",
        "score_macd",
        "score_rsi",
        "score_kdj",
        "score_boll",
        "score_volume",
        "score_trend",
        "next_date",
        "next_change",
    ])?;

    for row in rows {
        let (next_date, next_change) = match row.forward {
            Some(f) => (f.next_date.to_string(), format!("{:.2}", f.next_change)),
            None => (String::new(), String::new()),
        };
        writer.write_record([
            row.symbol.clone(),
            row.name.clone(),
            row.screen_date.to_string(),
            format!("{:.1}", row.total_score),
            format!("{:.2}", row.last_price),
            format!("{:.2}", row.pct_change),
            format!("{:.2}", row.turnover_rate),
            format!("{:.1}", row.market_cap_yi),
            format!("{:.3}", row.ma5),
            format!("{:.2}", row.ma5_deviation_pct),
            format!("{:.4}", row.macd),
            format!("{:.1}", row.rsi),
            format!("{:.1}", row.kdj_j),
            format!("{:.2}", row.vol_ratio),
            format!("{:.2}", row.gain_5d),
            format!("{:.2}", row.gain_20d),
            format!("{:.2}", row.yesterday_change),
            row.scores.ma.to_string(),
            row.scores.macd.to_string(),
            row.scores.rsi.to_string(),
            row.scores.kdj.to_string(),
            row.scores.boll.to_string(),
            row.scores.volume.to_string(),
            row.scores.trend.to_string(),
            next_date,
            next_change,
        ])?;
    }
    writer.flush()?;

    info!("[export] wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ForwardReturn, SubScores};
    use chrono::NaiveDate;

    fn sample_row() -> ScreeningRow {
        ScreeningRow {
            symbol: "600000".into(),
            name: "浦发银行".into(),
            screen_date: NaiveDate::from_ymd_opt(2026, 1, 6).unwrap(),
            total_score: 81.8,
            last_price: 10.5,
            pct_change: 3.2,
            turnover_rate: 4.4,
            market_cap_yi: 120.0,
            ma5: 10.3,
            ma5_deviation_pct: 1.9,
            macd: 0.08,
            rsi: 58.0,
            kdj_j: 72.0,
            vol_ratio: 1.4,
            gain_5d: 6.0,
            gain_20d: 14.0,
            yesterday_change: -0.8,
            scores: SubScores {
                ma: 30,
                macd: 16,
                rsi: 15,
                kdj: 13,
                boll: 5,
                volume: 10,
                trend: 10,
            },
            forward: Some(ForwardReturn {
                next_date: NaiveDate::from_ymd_opt(2026, 1, 7).unwrap(),
                next_open: 10.6,
                next_close: 10.8,
                next_change: 2.9,
            }),
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tailscreen_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn csv_export_includes_every_sub_score_column() {
        let dir = scratch_dir("csv_columns");
        let path = export_screening_csv(&[sample_row()], &dir).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        let mut lines = content.lines();
        let header = lines.next().unwrap();
        for column in ["score_ma", "score_macd", "score_rsi", "score_kdj", "score_boll", "score_volume", "score_trend"] {
            assert!(header.contains(column), "missing {column}");
        }
        let row = lines.next().unwrap();
        assert!(row.starts_with("600000,"));
        assert!(row.contains("2026-01-07"));
    }

    #[test]
    fn csv_export_refuses_an_empty_run() {
        assert!(export_screening_csv(&[], &std::env::temp_dir()).is_err());
    }

    #[test]
    fn filename_embeds_the_screen_date() {
        let dir = scratch_dir("csv_filename");
        let path = export_screening_csv(&[sample_row()], &dir).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        std::fs::remove_dir_all(&dir).ok();
        assert!(name.starts_with("tail_screen_20260106_"));
    }
}
