use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use tailscreen::config::{AdjustMode, AdvancedConfig, Band, EASTMONEY, ScreenerConfig, SimilarityConfig};
use tailscreen::data::{EastmoneyClient, HistoryProvider, SnapshotCache};
use tailscreen::engine::{
    self, AdvancedScreener, Screener, SimilarFinder, export_screening_csv, print_advanced_table,
    print_backtest_summary, print_screening_table, print_similar_table,
};
use tailscreen::models::OhlcvSeries;
use tailscreen::strategies::{
    DualMaStrategy, KdjStrategy, MacdStrategy, SignalStrategy, TradeAction, run_signal_backtest,
};
use tailscreen::utils::parse_compact_date;

#[derive(Parser, Debug)]
#[command(author, version, about = "A-share tail-market screener and backtester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite screening pass over the full market
    Screen {
        /// Target date YYYYMMDD; today when omitted
        #[arg(long)]
        date: Option<String>,
        /// Composite score threshold
        #[arg(long, default_value_t = 75.0)]
        min_score: f64,
        /// Fetch the next trading day's outcome for every survivor
        #[arg(long)]
        check_next_day: bool,
        /// Concurrent analysis tasks (1 = sequential with politeness delay)
        #[arg(long, default_value_t = 10)]
        workers: usize,
        /// Analysis cap after stage-1
        #[arg(long, default_value_t = 500)]
        cap: usize,
        #[arg(long, default_value_t = 2.0)]
        min_change: f64,
        #[arg(long, default_value_t = 6.5)]
        max_change: f64,
        #[arg(long, default_value_t = 3.0)]
        min_turnover: f64,
        #[arg(long, default_value_t = 18.0)]
        max_turnover: f64,
        /// Market-cap band, in 亿
        #[arg(long, default_value_t = 30.0)]
        min_market_cap: f64,
        #[arg(long, default_value_t = 500.0)]
        max_market_cap: f64,
        /// Directory for the CSV export; "-" disables it
        #[arg(long, default_value = "data")]
        out_dir: String,
        /// Rows shown in the terminal table
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
    /// Multi-day backtest: rerun the screen for every calendar day in a range
    Backtest {
        /// Start date YYYYMMDD
        #[arg(long)]
        start: String,
        /// End date YYYYMMDD, inclusive
        #[arg(long)]
        end: String,
        #[arg(long, default_value_t = 75.0)]
        min_score: f64,
        /// Analysis cap per day
        #[arg(long, default_value_t = 150)]
        cap: usize,
        #[arg(long, default_value_t = 10)]
        workers: usize,
    },
    /// MA120-proximity screen with a recent limit-up
    Advanced {
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value_t = 10)]
        workers: usize,
    },
    /// Rank the stocks most similar to a target symbol
    Similar {
        /// Target symbol, e.g. 600519
        symbol: String,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long, default_value_t = 60.0)]
        min_score: f64,
    },
    /// Replay a rule-signal strategy over one symbol's history
    Signals {
        symbol: String,
        #[arg(long, value_enum, default_value = "dual-ma")]
        strategy: StrategyKind,
        /// Start date YYYYMMDD; one year back when omitted
        #[arg(long)]
        start: Option<String>,
        /// End date YYYYMMDD; today when omitted
        #[arg(long)]
        end: Option<String>,
        #[arg(long, default_value_t = 100_000.0)]
        capital: f64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyKind {
    DualMa,
    Macd,
    Kdj,
}

#[derive(Tabled)]
struct TradeDisplay {
    #[tabled(rename = "日期")]
    date: String,
    #[tabled(rename = "操作")]
    action: &'static str,
    #[tabled(rename = "价格")]
    price: String,
    #[tabled(rename = "收益")]
    profit: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let (global_level, crate_level) = if cfg!(debug_assertions) {
        (LevelFilter::Warn, LevelFilter::Debug)
    } else {
        (LevelFilter::Warn, LevelFilter::Info)
    };
    env_logger::Builder::new()
        .filter(None, global_level)
        .filter(Some("tailscreen"), crate_level)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let client = Arc::new(EastmoneyClient::new()?);
    let cache = Arc::new(SnapshotCache::new(
        client.clone(),
        Duration::from_secs(EASTMONEY.snapshot_ttl_secs),
    ));
    let history: Arc<dyn HistoryProvider> = client;

    match cli.command {
        Command::Screen {
            date,
            min_score,
            check_next_day,
            workers,
            cap,
            min_change,
            max_change,
            min_turnover,
            max_turnover,
            min_market_cap,
            max_market_cap,
            out_dir,
            top,
        } => {
            let target_date = resolve_date(date.as_deref())?;
            let mut config = ScreenerConfig {
                min_score,
                workers,
                ..ScreenerConfig::default()
            };
            config.stage1.change_band = Band::new(min_change, max_change);
            config.stage1.turnover_band = Band::new(min_turnover, max_turnover);
            config.stage1.market_cap_band = Band::new(min_market_cap, max_market_cap);
            config.stage1.max_candidates = cap;

            let screener = Screener::new(cache, history, config);
            let rows = screener.run(target_date, check_next_day).await?;
            print_screening_table(&rows, Some(top));

            if out_dir != "-" && !rows.is_empty() {
                let dir = Path::new(&out_dir);
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
                let path = export_screening_csv(&rows, dir)?;
                println!("结果已保存到 {}", path.display());
            }
        }

        Command::Backtest {
            start,
            end,
            min_score,
            cap,
            workers,
        } => {
            let start = parse_compact_date(&start)?;
            let end = parse_compact_date(&end)?;
            let mut config = ScreenerConfig {
                min_score,
                workers,
                ..ScreenerConfig::default()
            };
            config.stage1.max_candidates = cap;

            let screener = Screener::new(cache, history, config);
            let summary = engine::run_multi_day(&screener, start, end).await?;
            print_backtest_summary(&summary);
        }

        Command::Advanced { date, workers } => {
            let target_date = resolve_date(date.as_deref())?;
            let config = AdvancedConfig {
                workers,
                ..AdvancedConfig::default()
            };
            let screener = AdvancedScreener::new(cache, history, config);
            let rows = screener.run(target_date).await?;
            print_advanced_table(&rows);
        }

        Command::Similar {
            symbol,
            top,
            min_score,
        } => {
            let config = SimilarityConfig {
                top_n: top,
                min_score,
                ..SimilarityConfig::default()
            };
            let finder = SimilarFinder::new(cache, history, config);
            let target_date = chrono::Local::now().date_naive();
            let rows = finder.run(&symbol, target_date).await?;
            print_similar_table(&rows);
        }

        Command::Signals {
            symbol,
            strategy,
            start,
            end,
            capital,
        } => {
            let end_date = resolve_date(end.as_deref())?;
            let start_date = match start.as_deref() {
                Some(s) => parse_compact_date(s)?,
                None => end_date - chrono::Duration::days(365),
            };

            let bars = history
                .fetch_history(&symbol, start_date, end_date, AdjustMode::Forward)
                .await?;
            anyhow::ensure!(!bars.is_empty(), "no history for {symbol}");
            let series = OhlcvSeries::from_bars(symbol, bars);

            let strategy: Box<dyn SignalStrategy> = match strategy {
                StrategyKind::DualMa => Box::new(DualMaStrategy::default()),
                StrategyKind::Macd => Box::new(MacdStrategy::default()),
                StrategyKind::Kdj => Box::new(KdjStrategy::default()),
            };
            let outcome = run_signal_backtest(strategy.as_ref(), &series, capital);

            if outcome.trades.is_empty() {
                println!("区间内没有产生任何交易信号");
            } else {
                let table = Table::new(outcome.trades.iter().map(|t| TradeDisplay {
                    date: t.date.to_string(),
                    action: match t.action {
                        TradeAction::Buy => "买入",
                        TradeAction::Sell => "卖出",
                    },
                    price: format!("{:.2}", t.price),
                    profit: match t.profit {
                        Some(p) => format!("{p:+.0}"),
                        None => String::new(),
                    },
                }))
                .with(Style::psql())
                .to_string();
                println!("{table}");
            }
            println!(
                "{} | 初始资金 {:.0} | 期末市值 {:.0} | 收益率 {:+.2}%",
                outcome.strategy, outcome.initial_capital, outcome.final_value, outcome.total_return_pct,
            );
        }
    }

    Ok(())
}

fn resolve_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => parse_compact_date(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}
