use iso8601_timestamp::Timestamp;
use monetari_coalesced::{CoalescionService, CoalescionServiceConfig, Fetch};
use monetari_database::{Database, PriceHistoryQuery, PriceRecord};
use monetari_result::{create_error, Error, Result};

use crate::{coingecko::types::SimplePrice, types::PriceResponse};

/// Any upstream able to quote a single coin
pub trait PriceSource: Fetch<Value = SimplePrice, Error = Error> {}

impl<T: Fetch<Value = SimplePrice, Error = Error>> PriceSource for T {}

/// Current prices, batched per coin in front of the upstream, with every
/// fresh lookup recorded for later history queries
pub struct PriceService<F: PriceSource> {
    coalescion: CoalescionService<F>,
    database: Database,
}

impl<F: PriceSource> Clone for PriceService<F> {
    fn clone(&self) -> Self {
        Self {
            coalescion: self.coalescion.clone(),
            database: self.database.clone(),
        }
    }
}

impl<F: PriceSource> PriceService<F> {
    pub fn new(config: CoalescionServiceConfig, source: F, database: Database) -> Self {
        Self {
            coalescion: CoalescionService::from_config(config, source),
            database,
        }
    }

    pub fn batching(&self) -> &CoalescionServiceConfig {
        self.coalescion.config()
    }

    /// Current price for an already validated coin id
    pub async fn current_price(&self, coin_id: &str) -> Result<PriceResponse> {
        let fetched = self.coalescion.get(coin_id).await.map_err(|error| match error {
            monetari_coalesced::Error::Upstream(error) => error,
            monetari_coalesced::Error::ShuttingDown => create_error!(ShuttingDown),
            monetari_coalesced::Error::RecvError => {
                tracing::error!("Price batch for {coin_id} was dropped without a result");
                create_error!(InternalError)
            }
        })?;

        let coin_id = monetari_coalesced::normalize(coin_id);
        if fetched.from_cache {
            return Ok(PriceResponse::from_simple_price(coin_id, fetched.value, true));
        }

        let price = fetched.value;
        let record = PriceRecord {
            id: String::new(),
            coin_id,
            price_usd: price.usd,
            price_eur: price.eur,
            price_try: price.r#try,
            market_cap: price.usd_market_cap,
            change_24h: price.usd_24h_change,
            queried_at: Timestamp::now_utc(),
        }
        .create(&self.database)
        .await
        .inspect_err(|error| tracing::error!("Failed to record price: {error}"))?;

        Ok(PriceResponse::from_record(record, false))
    }

    /// Recorded prices of a coin, newest first
    pub async fn history(
        &self,
        coin_id: &str,
        query: &PriceHistoryQuery,
    ) -> Result<Vec<PriceResponse>> {
        let records = PriceRecord::history(&self.database, coin_id, query)
            .await
            .inspect_err(|error| {
                tracing::error!("Failed to get price history for {coin_id}: {error}")
            })?;

        Ok(records
            .into_iter()
            .map(|record| PriceResponse::from_record(record, false))
            .collect())
    }

    pub async fn shutdown(&self) {
        self.coalescion.shutdown().await
    }

    pub async fn is_shut_down(&self) -> bool {
        self.coalescion.is_shut_down().await
    }
}
