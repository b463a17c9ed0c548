mod advanced;
mod backtest;
mod export;
mod screener;
mod similar;
pub mod stage1;

pub use advanced::AdvancedScreener;
pub use backtest::{aggregate_day, next_day_performance, run_multi_day};
pub use export::{
    export_screening_csv, print_advanced_table, print_backtest_summary, print_screening_table,
    print_similar_table,
};
pub use screener::Screener;
pub use similar::SimilarFinder;
