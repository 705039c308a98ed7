//! Market and economic data sources for the daily producer.
//!
//! Crypto prices come from CoinGecko's simple-price endpoint, stock closes
//! from the Yahoo Finance chart API. Economic indicators are fixed readings
//! until a keyed feed is wired in.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use dataviz_models::{Category, ChartData, ChartType, DataPoint};

use crate::error::{WorkerError, WorkerResult};
use crate::topics::Topic;

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_YAHOO_URL: &str = "https://query1.finance.yahoo.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) dataviz-producer";

/// Something that can turn a topic into a data point.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, topic: &Topic) -> WorkerResult<DataPoint>;
}

/// HTTP-backed source for every topic kind.
pub struct MarketDataClient {
    client: Client,
    coingecko_url: String,
    yahoo_url: String,
}

#[derive(Debug, Deserialize)]
struct CoinPrice {
    usd: f64,
    #[serde(default)]
    usd_24h_change: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    #[serde(default)]
    result: Option<Vec<YahooResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl MarketDataClient {
    pub fn new() -> WorkerResult<Self> {
        Self::with_base_urls(DEFAULT_COINGECKO_URL, DEFAULT_YAHOO_URL)
    }

    pub fn with_base_urls(
        coingecko_url: impl Into<String>,
        yahoo_url: impl Into<String>,
    ) -> WorkerResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            coingecko_url: coingecko_url.into().trim_end_matches('/').to_string(),
            yahoo_url: yahoo_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URLs may be overridden with `COINGECKO_BASE_URL` and
    /// `YAHOO_BASE_URL`.
    pub fn from_env() -> WorkerResult<Self> {
        let coingecko = std::env::var("COINGECKO_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_COINGECKO_URL.to_string());
        let yahoo =
            std::env::var("YAHOO_BASE_URL").unwrap_or_else(|_| DEFAULT_YAHOO_URL.to_string());
        Self::with_base_urls(coingecko, yahoo)
    }

    async fn fetch_crypto(&self, symbol: &str, name: &str) -> WorkerResult<DataPoint> {
        let coin = coin_id(symbol);
        let url = format!("{}/simple/price", self.coingecko_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ids", coin.as_str()),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WorkerError::data_source(format!(
                "CoinGecko returned {} for {}",
                response.status(),
                symbol
            )));
        }

        let prices: HashMap<String, CoinPrice> = response.json().await?;
        let price = prices
            .get(&coin)
            .ok_or_else(|| WorkerError::data_source(format!("CoinGecko has no price for {}", coin)))?;

        let change_24h = price.usd_24h_change.unwrap_or(0.0);
        let yesterday = price.usd / (1.0 + change_24h / 100.0);
        debug!(symbol, today = price.usd, yesterday, "Fetched crypto price");

        Ok(comparison_point(
            format!("{} Price Update", name),
            Category::Crypto,
            yesterday,
            price.usd,
            "CoinGecko",
        ))
    }

    async fn fetch_stock(&self, symbol: &str, name: &str) -> WorkerResult<DataPoint> {
        let url = format!("{}/v8/finance/chart/{}", self.yahoo_url, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("range", "5d"), ("interval", "1d")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WorkerError::data_source(format!(
                "Yahoo Finance returned {} for {}",
                response.status(),
                symbol
            )));
        }

        let body: YahooChartResponse = response.json().await?;
        if let Some(err) = body.chart.error.filter(|e| !e.is_null()) {
            return Err(WorkerError::data_source(format!(
                "Yahoo Finance error for {}: {}",
                symbol, err
            )));
        }

        let closes: Vec<f64> = body
            .chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|r| r.indicators.quote.into_iter().next())
            .map(|q| q.close.into_iter().flatten().collect())
            .unwrap_or_default();

        let &[.., yesterday, today] = closes.as_slice() else {
            return Err(WorkerError::data_source(format!(
                "Yahoo Finance returned {} closes for {}",
                closes.len(),
                symbol
            )));
        };
        debug!(symbol, today, yesterday, "Fetched stock closes");

        Ok(comparison_point(
            format!("{} Stock Update", name),
            Category::Stocks,
            yesterday,
            today,
            "Yahoo Finance",
        ))
    }
}

#[async_trait]
impl DataSource for MarketDataClient {
    async fn fetch(&self, topic: &Topic) -> WorkerResult<DataPoint> {
        match topic {
            Topic::Crypto { symbol, name } => self.fetch_crypto(symbol, name).await,
            Topic::Stock { symbol, name } => self.fetch_stock(symbol, name).await,
            Topic::Economic { id, name } => economic_point(id, name)
                .ok_or_else(|| WorkerError::data_source(format!("Unknown indicator: {}", id))),
        }
    }
}

/// CoinGecko id for a ticker symbol.
pub fn coin_id(symbol: &str) -> String {
    match symbol.to_ascii_uppercase().as_str() {
        "BTC" => "bitcoin".to_string(),
        "ETH" => "ethereum".to_string(),
        "SOL" => "solana".to_string(),
        "DOGE" => "dogecoin".to_string(),
        "ADA" => "cardano".to_string(),
        _ => symbol.to_ascii_lowercase(),
    }
}

/// Fixed indicator readings, `None` for unknown ids.
pub fn economic_point(id: &str, name: &str) -> Option<DataPoint> {
    let (yesterday, today) = match id {
        "unemployment" => (4.0, 4.1),
        "inflation" => (3.2, 3.0),
        _ => return None,
    };
    Some(comparison_point(
        name.to_string(),
        Category::Economic,
        yesterday,
        today,
        "Federal Reserve",
    ))
}

fn comparison_point(
    title: String,
    category: Category,
    yesterday: f64,
    today: f64,
    source: &str,
) -> DataPoint {
    DataPoint {
        title,
        category,
        data: ChartData::comparison(yesterday, today),
        source: source.to_string(),
        chart_type: ChartType::Comparison,
        date: chrono::Local::now().format("%Y-%m-%d").to_string(),
    }
}
