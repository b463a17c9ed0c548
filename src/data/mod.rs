mod cache;
mod provider;
mod retry;

pub use cache::SnapshotCache;
pub use provider::{EastmoneyClient, HistoryProvider, SnapshotProvider};
pub use retry::{RetryPolicy, with_retry};
