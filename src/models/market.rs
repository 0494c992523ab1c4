use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A point-in-time stock quote served to the portfolio widgets.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockQuote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub currency: String,
    pub timestamp: DateTime<Utc>,
    /// Which backend produced the quote: "alpha_vantage" or "mock".
    pub source: String,
}
