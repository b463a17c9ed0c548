mod maths_utils;
mod time_utils;

pub use time_utils::{calendar_days_inclusive, format_compact_date, parse_compact_date};

pub(crate) use maths_utils::{mean, pct_diff, sum_tail};
