use monetari_result::Result;

use super::AbstractPriceRecords;
use crate::{PriceHistoryQuery, PriceRecord, ReferenceDb};

#[async_trait]
impl AbstractPriceRecords for ReferenceDb {
    /// Insert a new price record
    async fn insert_price_record(&self, record: &PriceRecord) -> Result<()> {
        let mut price_records = self.price_records.lock().await;
        if price_records.contains_key(&record.id) {
            Err(create_database_error!("insert", "price_records"))
        } else {
            price_records.insert(record.id.to_string(), record.clone());
            Ok(())
        }
    }

    /// Fetch price records of a coin within the query's range, newest first
    async fn fetch_price_history(
        &self,
        coin_id: &str,
        query: &PriceHistoryQuery,
    ) -> Result<Vec<PriceRecord>> {
        let price_records = self.price_records.lock().await;

        let mut records: Vec<PriceRecord> = price_records
            .values()
            .filter(|record| {
                record.coin_id == coin_id
                    && query
                        .from
                        .as_ref()
                        .map_or(true, |from| &record.queried_at >= from)
                    && query.to.as_ref().map_or(true, |to| &record.queried_at <= to)
            })
            .cloned()
            .collect();

        records.sort_by(|a, b| {
            b.queried_at
                .cmp(&a.queried_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(records
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }
}
