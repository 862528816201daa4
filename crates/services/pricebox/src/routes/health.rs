use axum::{extract::State, Json};
use iso8601_timestamp::Timestamp;

use crate::{
    prices::{PriceService, PriceSource},
    types,
};

/// Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "Misc",
    responses(
        (status = 200, description = "Service health", body = types::HealthResponse)
    )
)]
pub async fn health<F: PriceSource>(
    State(prices): State<PriceService<F>>,
) -> Json<types::HealthResponse> {
    let status = if prices.is_shut_down().await {
        "shutting_down"
    } else {
        "ok"
    };

    Json(types::HealthResponse {
        status: status.to_string(),
        timestamp: Timestamp::now_utc(),
    })
}
