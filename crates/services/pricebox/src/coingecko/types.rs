//! CoinGecko API models

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Response of `/simple/price`, keyed by coin id
pub type SimplePriceResponse = HashMap<String, SimplePrice>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SimplePrice {
    pub usd: f64,
    pub eur: Option<f64>,
    pub r#try: Option<f64>,
    pub usd_market_cap: Option<f64>,
    pub usd_24h_change: Option<f64>,
}
