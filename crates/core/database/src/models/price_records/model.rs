use iso8601_timestamp::Timestamp;
use monetari_result::Result;
use ulid::Ulid;

use crate::Database;

/// Records returned by a history lookup unless asked otherwise
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Most records a single history lookup may return
pub const MAX_HISTORY_LIMIT: usize = 1000;

auto_derived!(
    /// Price of a coin as seen by a fresh upstream lookup
    pub struct PriceRecord {
        /// Id
        #[serde(rename = "_id")]
        pub id: String,
        /// Normalised coin id
        pub coin_id: String,
        /// Price in US dollars
        pub price_usd: f64,
        /// Price in euros
        pub price_eur: Option<f64>,
        /// Price in Turkish lira
        pub price_try: Option<f64>,
        /// Market capitalisation in US dollars
        pub market_cap: Option<f64>,
        /// Price change over the last 24 hours, in percent
        pub change_24h: Option<f64>,
        /// When the upstream was asked
        pub queried_at: Timestamp,
    }
);

/// Range and page of a history lookup
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistoryQuery {
    /// Earliest `queried_at` to include
    pub from: Option<Timestamp>,
    /// Latest `queried_at` to include
    pub to: Option<Timestamp>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for PriceHistoryQuery {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            limit: DEFAULT_HISTORY_LIMIT,
            offset: 0,
        }
    }
}

impl PriceRecord {
    /// Assign a fresh id and save this record
    pub async fn create(mut self, db: &Database) -> Result<PriceRecord> {
        self.id = Ulid::new().to_string();
        db.insert_price_record(&self).await?;
        Ok(self)
    }

    /// Fetch the recorded prices of a coin, newest first
    pub async fn history(
        db: &Database,
        coin_id: &str,
        query: &PriceHistoryQuery,
    ) -> Result<Vec<PriceRecord>> {
        db.fetch_price_history(coin_id, query).await
    }
}
