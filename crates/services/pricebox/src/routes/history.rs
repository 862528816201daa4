use axum::{
    extract::{Path, Query, State},
    Json,
};
use iso8601_timestamp::Timestamp;
use monetari_database::{PriceHistoryQuery, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};
use monetari_result::{create_error, Result};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    prices::{PriceService, PriceSource},
    routes::price::validate_coin_id,
    types,
};

/// Range and page of a history request
#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// Earliest lookup to include (ISO 8601)
    #[param(example = "2024-01-01T00:00:00Z")]
    pub from: Option<String>,
    /// Latest lookup to include (ISO 8601)
    #[param(example = "2024-12-31T23:59:59Z")]
    pub to: Option<String>,
    /// Number of records, between 1 and 1000
    #[param(example = 100)]
    pub limit: Option<usize>,
    /// Number of records to skip
    #[param(example = 0)]
    pub offset: Option<usize>,
}

/// Parse a full timestamp, or a bare date taken as midnight UTC
fn parse_timestamp(field: &str, value: &str) -> Result<Timestamp> {
    Timestamp::parse(value)
        .or_else(|| Timestamp::parse(&format!("{value}T00:00:00Z")))
        .ok_or_else(|| {
            create_error!(FailedValidation {
                error: format!("{field} must be an ISO 8601 date")
            })
        })
}

impl HistoryParams {
    pub fn into_query(self) -> Result<PriceHistoryQuery> {
        let limit = self.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
            return Err(create_error!(FailedValidation {
                error: format!("limit must be between 1 and {MAX_HISTORY_LIMIT}")
            }));
        }

        Ok(PriceHistoryQuery {
            from: self
                .from
                .as_deref()
                .map(|value| parse_timestamp("from", value))
                .transpose()?,
            to: self
                .to
                .as_deref()
                .map(|value| parse_timestamp("to", value))
                .transpose()?,
            limit,
            offset: self.offset.unwrap_or(0),
        })
    }
}

/// Price history of a coin
///
/// Every lookup that reached upstream is recorded. Records are returned
/// newest first.
#[utoipa::path(
    get,
    path = "/v1/price/{coin_id}/history",
    tag = "Prices",
    params(
        ("coin_id" = String, Path, description = "Coin identifier", example = "bitcoin"),
        HistoryParams
    ),
    responses(
        (status = 200, description = "Recorded prices", body = [types::PriceResponse]),
        (status = 400, description = "Malformed coin id or query", body = monetari_result::Error),
        (status = 500, description = "History could not be read", body = monetari_result::Error)
    )
)]
pub async fn history<F: PriceSource>(
    Path(coin_id): Path<String>,
    Query(params): Query<HistoryParams>,
    State(prices): State<PriceService<F>>,
) -> Result<Json<Vec<types::PriceResponse>>> {
    let coin_id = validate_coin_id(&coin_id)?;
    let query = params.into_query()?;
    prices.history(&coin_id, &query).await.map(Json)
}
