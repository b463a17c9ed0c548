use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::{AdjustMode, EASTMONEY};
use crate::data::{RetryPolicy, with_retry};
use crate::domain::{DailyBar, InstrumentSnapshot};
use crate::utils::format_compact_date;

/// Abstract interface for the realtime market table.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// One row per listed instrument, point in time.
    async fn fetch_snapshot(&self) -> Result<Vec<InstrumentSnapshot>>;
}

/// Abstract interface for per-symbol daily history.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Daily bars in `[start, end]`, ascending by date. Callers treat an
    /// error as "no data for this candidate" and move on.
    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        adjust: AdjustMode,
    ) -> Result<Vec<DailyBar>>;
}

/// Eastmoney push2 client implementing both provider traits.
pub struct EastmoneyClient {
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl EastmoneyClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(EASTMONEY.client.timeout_ms))
            .build()
            .context("building http client")?;
        Ok(Self {
            http,
            retry: RetryPolicy::default(),
        })
    }

    /// Exchange prefix for the kline endpoint: Shanghai symbols start with 6.
    fn secid(symbol: &str) -> String {
        if symbol.starts_with('6') {
            format!("1.{symbol}")
        } else {
            format!("0.{symbol}")
        }
    }
}

#[async_trait]
impl SnapshotProvider for EastmoneyClient {
    async fn fetch_snapshot(&self) -> Result<Vec<InstrumentSnapshot>> {
        let page_size = EASTMONEY.spot.page_size.to_string();
        with_retry(self.retry, "snapshot", || async {
            let response = self
                .http
                .get(EASTMONEY.spot.url)
                .query(&[
                    ("pn", "1"),
                    ("pz", page_size.as_str()),
                    ("po", "1"),
                    ("np", "1"),
                    ("fltt", "2"),
                    ("invt", "2"),
                    ("fid", "f3"),
                    ("fs", EASTMONEY.spot.markets),
                    ("fields", EASTMONEY.spot.fields),
                ])
                .send()
                .await?
                .error_for_status()?;
            let body: Value = response.json().await?;
            parse_spot_table(&body)
        })
        .await
    }
}

#[async_trait]
impl HistoryProvider for EastmoneyClient {
    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        adjust: AdjustMode,
    ) -> Result<Vec<DailyBar>> {
        let secid = Self::secid(symbol);
        let beg = format_compact_date(start);
        let end = format_compact_date(end);
        with_retry(self.retry, symbol, || async {
            let response = self
                .http
                .get(EASTMONEY.kline.url)
                .query(&[
                    ("secid", secid.as_str()),
                    ("klt", EASTMONEY.kline.period_daily),
                    ("fqt", adjust.wire_code()),
                    ("beg", beg.as_str()),
                    ("end", end.as_str()),
                    ("fields1", "f1,f2,f3,f4,f5,f6"),
                    ("fields2", "f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61"),
                ])
                .send()
                .await?
                .error_for_status()?;
            let body: Value = response.json().await?;
            parse_kline_table(&body)
        })
        .await
    }
}

fn parse_spot_table(body: &Value) -> Result<Vec<InstrumentSnapshot>> {
    let rows = body["data"]["diff"]
        .as_array()
        .ok_or_else(|| anyhow!("spot response missing data.diff"))?;

    let mut snapshots = Vec::with_capacity(rows.len());
    for row in rows {
        let symbol = match row["f12"].as_str() {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => continue,
        };
        snapshots.push(InstrumentSnapshot {
            symbol,
            name: row["f14"].as_str().unwrap_or_default().to_string(),
            last_price: field(row, "f2"),
            pct_change: field(row, "f3"),
            volume: field(row, "f5"),
            amount: field(row, "f6"),
            turnover_rate: field(row, "f8"),
            pe_dynamic: field(row, "f9"),
            volume_ratio: field(row, "f10"),
            high: field(row, "f15"),
            low: field(row, "f16"),
            open: field(row, "f17"),
            total_market_cap: field(row, "f20"),
            float_market_cap: field(row, "f21"),
        });
    }
    Ok(snapshots)
}

/// Suspended instruments report "-" instead of a number; those become NaN
/// and fall out of every band filter.
fn field(row: &Value, key: &str) -> f64 {
    row[key].as_f64().unwrap_or(f64::NAN)
}

fn parse_kline_table(body: &Value) -> Result<Vec<DailyBar>> {
    // An unknown symbol comes back with data: null. Empty series, not an error.
    let Some(klines) = body["data"]["klines"].as_array() else {
        return Ok(Vec::new());
    };

    klines
        .iter()
        .map(|line| {
            line.as_str()
                .ok_or_else(|| anyhow!("kline entry is not a string"))
                .and_then(parse_kline_row)
        })
        .collect()
}

/// One kline row: `date,open,close,high,low,volume,amount,amplitude,pct_change,change,turnover`.
fn parse_kline_row(line: &str) -> Result<DailyBar> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 11 {
        return Err(anyhow!("kline row has {} fields: {line}", parts.len()));
    }
    let num = |idx: usize| -> Result<f64> {
        parts[idx]
            .parse::<f64>()
            .with_context(|| format!("field {idx} in kline row '{line}'"))
    };
    Ok(DailyBar {
        date: NaiveDate::parse_from_str(parts[0], "%Y-%m-%d")
            .with_context(|| format!("date in kline row '{line}'"))?,
        open: num(1)?,
        close: num(2)?,
        high: num(3)?,
        low: num(4)?,
        volume: num(5)?,
        pct_change: num(8)?,
        turnover: num(10)?,
    })
}
