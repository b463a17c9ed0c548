#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::too_many_arguments)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod models;
pub mod strategies;
pub mod utils;

// Re-export commonly used types
pub use config::{AdvancedConfig, ScreenerConfig, SimilarityConfig};
pub use data::{EastmoneyClient, SnapshotCache};
pub use engine::{AdvancedScreener, Screener, SimilarFinder};
pub use models::{OhlcvSeries, ScreeningRow};
