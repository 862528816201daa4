use async_trait::async_trait;
use monetari_coalesced::Fetch;
use monetari_result::{create_error, Error, Result};
use reqwest::{Client, RequestBuilder, StatusCode};

pub mod types;

/// Currencies requested for every coin
const VS_CURRENCIES: &str = "usd,eur,try";

/// Client for the CoinGecko public API
pub struct CoinGecko {
    api_url: String,
    api_key: Option<String>,
    client: Client,
}

impl CoinGecko {
    pub fn new(config: &monetari_config::CoinGecko) -> reqwest::Result<Self> {
        let api_key = Some(config.api_key.trim())
            .filter(|key| !key.is_empty())
            .map(ToOwned::to_owned);

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::builder().timeout(config.timeout()).build()?,
        })
    }

    fn simple_price(&self, coin_id: &str) -> RequestBuilder {
        let request = self
            .client
            .get(format!("{}/simple/price", self.api_url))
            .query(&[
                ("ids", coin_id),
                ("vs_currencies", VS_CURRENCIES),
                ("include_market_cap", "true"),
                ("include_24hr_change", "true"),
            ]);

        match &self.api_key {
            Some(key) => request.header("x-cg-demo-api-key", key),
            None => request,
        }
    }
}

#[async_trait]
impl Fetch for CoinGecko {
    type Value = types::SimplePrice;
    type Error = Error;

    async fn fetch(&self, coin_id: &str) -> Result<types::SimplePrice> {
        let response = self
            .simple_price(coin_id)
            .send()
            .await
            .map_err(|error| transport_error(coin_id, &error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        let body = response
            .json::<types::SimplePriceResponse>()
            .await
            .map_err(|error| transport_error(coin_id, &error))?;

        extract_price(coin_id, body)
    }
}

/// Map a failed or undecodable request
fn transport_error(coin_id: &str, error: &reqwest::Error) -> Error {
    if error.is_timeout() {
        tracing::warn!("CoinGecko request timed out for {coin_id}");
        create_error!(UpstreamTimeout)
    } else {
        tracing::error!("CoinGecko API error for {coin_id}: {error}");
        create_error!(UpstreamUnavailable {
            status: error.status().map(|status| status.as_u16())
        })
    }
}

/// Map a non-success HTTP status
fn status_error(status: StatusCode) -> Error {
    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!("CoinGecko rate limit reached (429)");
        create_error!(UpstreamRateLimited)
    } else {
        tracing::error!("CoinGecko API error: {status}");
        create_error!(UpstreamUnavailable {
            status: Some(status.as_u16())
        })
    }
}

/// Pick the requested coin out of a `/simple/price` body
fn extract_price(
    coin_id: &str,
    mut body: types::SimplePriceResponse,
) -> Result<types::SimplePrice> {
    body.remove(coin_id).ok_or_else(|| {
        create_error!(CoinNotFound {
            coin_id: coin_id.to_string()
        })
    })
}
