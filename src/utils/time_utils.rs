use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

const COMPACT_DATE_FORMAT: &str = "%Y%m%d";

/// Parses the compact `YYYYMMDD` form used on the provider wire (e.g. "20260106").
pub fn parse_compact_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, COMPACT_DATE_FORMAT)
        .with_context(|| format!("invalid date '{s}', expected YYYYMMDD"))
}

pub fn format_compact_date(date: NaiveDate) -> String {
    date.format(COMPACT_DATE_FORMAT).to_string()
}

/// Every calendar day in `[start, end]`, weekends and holidays included.
/// Callers that only care about trading days simply see empty result sets
/// on the days in between.
pub fn calendar_days_inclusive(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        current += Duration::days(1);
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_date_round_trip() {
        let date = parse_compact_date("20260106").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 1, 6).unwrap());
        assert_eq!(format_compact_date(date), "20260106");
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_compact_date("2026-01-06").is_err());
        assert!(parse_compact_date("20261345").is_err());
    }

    #[test]
    fn calendar_days_are_inclusive_of_both_ends() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
        let days = calendar_days_inclusive(start, end);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], start);
        assert_eq!(days[6], end);
    }
}
