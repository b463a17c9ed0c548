//! Configuration for the screener: tunable bands, weights, and provider constants.

mod eastmoney;
mod screener;
mod types;

// Re-export commonly used items
pub use eastmoney::{EASTMONEY, EastmoneyConfig};
pub use screener::{
    AdvancedConfig, HUNDRED_MILLION, ScreenerConfig, SimilarityConfig, SimilarityWeights,
    Stage1Config, TrendBands,
};
pub use types::{AdjustMode, Band};
