//! Wire constants for the Eastmoney push2 endpoints the providers talk to.

/// Realtime spot-table endpoint (one page of all listed A-share instruments).
pub struct SpotApi {
    pub url: &'static str,
    /// `fs` market selector: SH/SZ main boards plus ChiNext/STAR (filtered later).
    pub markets: &'static str,
    /// `fields` projection requested per row.
    pub fields: &'static str,
    pub page_size: usize,
}

/// Daily kline endpoint for one instrument.
pub struct KlineApi {
    pub url: &'static str,
    /// `klt=101`: daily bars.
    pub period_daily: &'static str,
}

pub struct ClientDefaults {
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_multiplier: f64,
}

pub struct EastmoneyConfig {
    pub spot: SpotApi,
    pub kline: KlineApi,
    pub client: ClientDefaults,
    /// Snapshot cache time-to-live, seconds.
    pub snapshot_ttl_secs: u64,
}

pub const EASTMONEY: EastmoneyConfig = EastmoneyConfig {
    spot: SpotApi {
        url: "https://82.push2.eastmoney.com/api/qt/clist/get",
        markets: "m:0+t:6,m:0+t:80,m:1+t:2,m:1+t:23",
        fields: "f2,f3,f5,f6,f8,f9,f10,f12,f14,f15,f16,f17,f20,f21",
        page_size: 6000,
    },
    kline: KlineApi {
        url: "https://push2his.eastmoney.com/api/qt/stock/kline/get",
        period_daily: "101",
    },
    client: ClientDefaults {
        timeout_ms: 30_000,
        max_attempts: 3,
        base_delay_ms: 500,
        backoff_multiplier: 2.0,
    },
    snapshot_ttl_secs: 60,
};
