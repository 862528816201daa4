use iso8601_timestamp::Timestamp;
use monetari_coalesced::CoalescionServiceConfig;
use monetari_database::PriceRecord;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::coingecko::types;

/// Successful root response
#[derive(Serialize, Debug, ToSchema)]
pub struct RootResponse<'a> {
    pub message: &'a str,
    pub version: &'a str,
    /// How price lookups are batched
    pub batching: BatchingInfo,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq, Eq)]
/// Batching settings in effect
pub struct BatchingInfo {
    /// Longest a lookup waits for others to join its batch
    pub wait_time_ms: u64,
    /// Number of waiting lookups that send a batch immediately
    pub threshold: usize,
    /// How long a fetched price is reused
    pub cache_ttl_ms: u64,
}

impl From<&CoalescionServiceConfig> for BatchingInfo {
    fn from(config: &CoalescionServiceConfig) -> Self {
        Self {
            wait_time_ms: config.wait_time.as_millis() as u64,
            threshold: config.threshold,
            cache_ttl_ms: config.cache_ttl.as_millis() as u64,
        }
    }
}

/// Service health
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    /// Either `ok` or `shutting_down`
    #[schema(example = "ok")]
    pub status: String,
    /// Time of the check
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: Timestamp,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
/// Current price of a coin
pub struct PriceResponse {
    /// Normalised coin id
    #[schema(example = "bitcoin")]
    pub coin_id: String,
    /// Price in US dollars
    #[schema(example = 97000.12345678)]
    pub price_usd: f64,
    /// Price in euros
    #[schema(example = 89000.12345678)]
    pub price_eur: Option<f64>,
    /// Price in Turkish lira
    #[schema(example = 3200000.12345678)]
    pub price_try: Option<f64>,
    /// Market capitalisation in US dollars
    #[schema(example = 1900000000000.0)]
    pub market_cap: Option<f64>,
    /// Price change over the last 24 hours, in percent
    #[schema(example = 2.45)]
    pub change_24h: Option<f64>,
    /// Whether this response was served without a new upstream call,
    /// always false for history entries
    pub from_cache: bool,
    /// When this response was produced
    #[schema(value_type = String, format = DateTime)]
    pub queried_at: Timestamp,
}

impl PriceResponse {
    pub fn from_simple_price(coin_id: String, price: types::SimplePrice, from_cache: bool) -> Self {
        Self {
            coin_id,
            price_usd: price.usd,
            price_eur: price.eur,
            price_try: price.r#try,
            market_cap: price.usd_market_cap,
            change_24h: price.usd_24h_change,
            from_cache,
            queried_at: Timestamp::now_utc(),
        }
    }

    pub fn from_record(record: PriceRecord, from_cache: bool) -> Self {
        Self {
            coin_id: record.coin_id,
            price_usd: record.price_usd,
            price_eur: record.price_eur,
            price_try: record.price_try,
            market_cap: record.market_cap,
            change_24h: record.change_24h,
            from_cache,
            queried_at: record.queried_at,
        }
    }
}
