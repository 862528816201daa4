use monetari_result::Result;

use crate::{PriceHistoryQuery, PriceRecord};

mod reference;

#[async_trait]
pub trait AbstractPriceRecords: Sync + Send {
    /// Insert a new price record
    async fn insert_price_record(&self, record: &PriceRecord) -> Result<()>;

    /// Fetch price records of a coin within the query's range, newest first
    async fn fetch_price_history(
        &self,
        coin_id: &str,
        query: &PriceHistoryQuery,
    ) -> Result<Vec<PriceRecord>>;
}
