use crate::config::Config;
use crate::errors::{Result, Rule1Error};
use crate::models::{DailyBar, PriceSeries};
use crate::sources::base::PriceSource;
use crate::ticker::Ticker;
use crate::util;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) rule1_check";

// Yahoo chart API v8 的响应结构
#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

impl ChartError {
    fn into_error(self, symbol: &str) -> Rule1Error {
        Rule1Error::data_unavailable(
            symbol,
            format!(
                "{}: {}",
                self.code.unwrap_or_else(|| "error".to_string()),
                self.description.unwrap_or_default()
            ),
        )
    }
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    long_name: Option<String>,
    short_name: Option<String>,
    #[serde(rename = "gmtoffset")]
    gmt_offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Tokyo time, used when the payload carries no offset.
const DEFAULT_GMT_OFFSET: i64 = 9 * 3600;

/// Error for a non-2xx chart response.
///
/// The `chart.error` object is preferred when the body carries one,
/// otherwise the HTTP status is reported.
fn http_error(symbol: &str, status: StatusCode, body: &str) -> Rule1Error {
    match serde_json::from_str::<ChartEnvelope>(body) {
        Ok(ChartEnvelope { chart: ChartBody { error: Some(err), .. } }) => err.into_error(symbol),
        _ => Rule1Error::data_unavailable(symbol, format!("HTTP {}", status)),
    }
}

/// Converts a chart payload into a series.
///
/// Rows whose high or low is null (halted days, the in-progress session)
/// are skipped. A chart `error` object becomes `DataUnavailable`.
pub fn parse_chart(symbol: &str, body: &str) -> Result<PriceSeries> {
    let envelope: ChartEnvelope = serde_json::from_str(body).map_err(|e| {
        Rule1Error::data_unavailable(symbol, format!("malformed chart payload: {}", e))
    })?;

    if let Some(err) = envelope.chart.error {
        return Err(err.into_error(symbol));
    }

    let result = envelope
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| Rule1Error::data_unavailable(symbol, "chart payload has no result"))?;

    let name = result.meta.long_name.or(result.meta.short_name);
    let offset = result.meta.gmt_offset.unwrap_or(DEFAULT_GMT_OFFSET);
    let quote = result
        .indicators
        .and_then(|mut i| if i.quote.is_empty() { None } else { Some(i.quote.remove(0)) })
        .unwrap_or_default();

    let value = |column: &[Option<f64>], i: usize| column.get(i).copied().flatten();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let (Some(high), Some(low)) = (value(&quote.high, i), value(&quote.low, i)) else {
            debug!("Skipping row {} of {}: no high/low", i, symbol);
            continue;
        };
        let Some(date) = util::local_date_from_timestamp(*ts, offset) else {
            warn!("Skipping row {} of {}: bad timestamp {}", i, symbol, ts);
            continue;
        };

        bars.push(DailyBar {
            date,
            open: value(&quote.open, i).unwrap_or(high),
            high,
            low,
            close: value(&quote.close, i).unwrap_or(low),
            volume: value(&quote.volume, i).unwrap_or_default().max(0.0) as u64,
        });
    }

    Ok(PriceSeries::new(symbol, name, bars))
}

/// Daily bars from the Yahoo Finance chart endpoint
pub struct YahooChartSource {
    client: Client,
    base_url: String,
    lookback_days: i64,
    min_request_interval: Duration,
    /// Start of the most recently reserved request slot.
    next_slot: Mutex<Option<Instant>>,
}

impl YahooChartSource {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Rule1Error::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            lookback_days: config.lookback_days,
            min_request_interval: config.min_request_interval,
            next_slot: Mutex::new(None),
        })
    }

    /// 等待请求频率限制
    ///
    /// Each caller reserves the next free slot under the lock, so concurrent
    /// fetches are spaced at least `min_request_interval` apart.
    async fn wait_for_rate_limit(&self) {
        let now = Instant::now();
        let slot = {
            let mut next_slot = self.next_slot.lock().unwrap_or_else(|e| e.into_inner());
            let slot = match *next_slot {
                Some(previous) => (previous + self.min_request_interval).max(now),
                None => now,
            };
            *next_slot = Some(slot);
            slot
        };

        if slot > now {
            debug!("等待 {:?} 以遵守频率限制", slot - now);
            tokio::time::sleep_until(slot).await;
        }
    }
}

#[async_trait]
impl PriceSource for YahooChartSource {
    fn source_name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch(&self, ticker: &Ticker) -> Result<PriceSeries> {
        let symbol = ticker.symbol.as_str();
        let (start, end) = util::lookback_range(util::tokyo_today(), self.lookback_days)?;
        let period1 = util::tokyo_midnight_timestamp(start)?;
        let period2 = util::tokyo_midnight_timestamp(end)?;
        info!("Fetching {} daily bars {} .. {}", symbol, start, end);

        // 限制请求频率
        self.wait_for_rate_limit().await;

        let response = self
            .client
            .get(format!("{}/v8/finance/chart/{}", self.base_url, symbol))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("includePrePost", "false".to_string()),
            ])
            .send()
            .await
            .map_err(|e| Rule1Error::data_unavailable(symbol, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Rule1Error::data_unavailable(symbol, e))?;

        if !status.is_success() {
            // 404 等也会带 chart.error，优先使用其中的描述
            return Err(http_error(symbol, status, &body));
        }

        let series = parse_chart(symbol, &body)?;
        debug!("获取到 {} 条K线记录", series.len());
        Ok(series)
    }
}
