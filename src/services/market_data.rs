use crate::errors::{AppError, Result};
use crate::models::market::StockQuote;
use chrono::Utc;
use dashmap::DashMap;
use reqwest::Client;
use std::time::{Duration, Instant};

/// Price data is cached for 5 minutes, matching the freshness the portfolio
/// widgets need.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Fetches stock quotes from Alpha Vantage with an in-process TTL cache.
/// Without an API key it serves deterministic mock quotes so the site still
/// renders in development.
pub struct MarketDataService {
    client: Client,
    api_key: Option<String>,
    cache: DashMap<String, (StockQuote, Instant)>,
}

impl MarketDataService {
    pub fn new(api_key: Option<String>) -> Self {
        if api_key.is_none() {
            tracing::warn!("ALPHA_VANTAGE_API_KEY not set - serving mock quotes");
        }
        Self {
            client: Client::new(),
            api_key,
            cache: DashMap::new(),
        }
    }

    pub async fn get_quote(&self, symbol: &str) -> Result<StockQuote> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(AppError::ValidationError("Symbol is required".to_string()));
        }

        if let Some(entry) = self.cache.get(&symbol) {
            let (quote, fetched_at) = entry.value();
            if fetched_at.elapsed() < CACHE_TTL {
                return Ok(quote.clone());
            }
        }

        let quote = match &self.api_key {
            Some(key) => self.fetch_alpha_vantage(&symbol, key).await?,
            None => Self::mock_quote(&symbol),
        };

        self.cache.insert(symbol, (quote.clone(), Instant::now()));
        Ok(quote)
    }

    async fn fetch_alpha_vantage(&self, symbol: &str, api_key: &str) -> Result<StockQuote> {
        let url = format!(
            "https://www.alphavantage.co/query?function=GLOBAL_QUOTE&symbol={}&apikey={}",
            symbol, api_key
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::UpstreamError(format!(
                "Alpha Vantage returned status {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await?;
        let quote = &body["Global Quote"];

        let price = quote["05. price"]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| {
                AppError::UpstreamError(format!("No quote data for symbol {}", symbol))
            })?;
        let change = quote["09. change"]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);
        let change_percent = quote["10. change percent"]
            .as_str()
            .and_then(|s| s.trim_end_matches('%').parse::<f64>().ok())
            .unwrap_or(0.0);

        Ok(StockQuote {
            symbol: symbol.to_string(),
            price,
            change,
            change_percent,
            currency: if symbol.ends_with(".NS") || symbol.ends_with(".BO") {
                "INR".to_string()
            } else {
                "USD".to_string()
            },
            timestamp: Utc::now(),
            source: "alpha_vantage".to_string(),
        })
    }

    /// Stable per-symbol pseudo-prices so the UI behaves consistently across
    /// reloads during development.
    fn mock_quote(symbol: &str) -> StockQuote {
        let seed: u32 = symbol.bytes().map(u32::from).sum();
        let price = 100.0 + f64::from(seed % 900);
        let change = f64::from(seed % 21) - 10.0;

        StockQuote {
            symbol: symbol.to_string(),
            price,
            change,
            change_percent: if price != 0.0 { change / price * 100.0 } else { 0.0 },
            currency: "INR".to_string(),
            timestamp: Utc::now(),
            source: "mock".to_string(),
        }
    }
}
