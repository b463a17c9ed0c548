use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::DailyBar;

/// Column-oriented daily series for one symbol.
///
/// All vectors are parallel: index `i` across all fields is one bar.
/// Dates are strictly increasing with no duplicates; `from_bars` enforces the
/// invariant regardless of provider ordering. The series is never mutated in
/// place: indicator computation builds derived columns in a separate frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OhlcvSeries {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub opens: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,
    pub volumes: Vec<f64>,
    pub pct_changes: Vec<f64>,
    pub turnovers: Vec<f64>,
}

impl OhlcvSeries {
    pub fn from_bars(symbol: impl Into<String>, mut bars: Vec<DailyBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        let len = bars.len();
        let mut series = Self {
            symbol: symbol.into(),
            dates: Vec::with_capacity(len),
            opens: Vec::with_capacity(len),
            highs: Vec::with_capacity(len),
            lows: Vec::with_capacity(len),
            closes: Vec::with_capacity(len),
            volumes: Vec::with_capacity(len),
            pct_changes: Vec::with_capacity(len),
            turnovers: Vec::with_capacity(len),
        };

        for bar in bars {
            series.dates.push(bar.date);
            series.opens.push(bar.open);
            series.highs.push(bar.high);
            series.lows.push(bar.low);
            series.closes.push(bar.close);
            series.volumes.push(bar.volume);
            series.pct_changes.push(bar.pct_change);
            series.turnovers.push(bar.turnover);
        }

        series
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn bar(&self, idx: usize) -> DailyBar {
        DailyBar {
            date: self.dates[idx],
            open: self.opens[idx],
            high: self.highs[idx],
            low: self.lows[idx],
            close: self.closes[idx],
            volume: self.volumes[idx],
            pct_change: self.pct_changes[idx],
            turnover: self.turnovers[idx],
        }
    }

    /// First bar strictly after `date`, if any. Used by the forward-return lookup.
    pub fn first_bar_after(&self, date: NaiveDate) -> Option<DailyBar> {
        self.dates
            .iter()
            .position(|d| *d > date)
            .map(|idx| self.bar(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(y: i32, m: u32, d: u32, close: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
            pct_change: 0.0,
            turnover: 1.0,
        }
    }

    #[test]
    fn from_bars_sorts_and_dedups_dates() {
        let series = OhlcvSeries::from_bars(
            "600000",
            vec![
                bar(2026, 1, 7, 11.0),
                bar(2026, 1, 6, 10.0),
                bar(2026, 1, 6, 10.5),
            ],
        );
        assert_eq!(series.len(), 2);
        assert!(series.dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn first_bar_after_is_strict() {
        let series = OhlcvSeries::from_bars(
            "600000",
            vec![bar(2026, 1, 6, 10.0), bar(2026, 1, 7, 11.0)],
        );
        let target = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
        let next = series.first_bar_after(target).unwrap();
        assert_eq!(next.date, NaiveDate::from_ymd_opt(2026, 1, 7).unwrap());

        let late = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
        assert!(series.first_bar_after(late).is_none());
    }
}
