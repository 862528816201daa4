use axum::{extract::State, Json};

use crate::{
    prices::{PriceService, PriceSource},
    types,
};

/// Capture crate version from Cargo
static CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Root response from service
///
/// Reports the version along with the batching settings lookups are served
/// under.
#[utoipa::path(
    get,
    path = "/",
    tag = "Misc",
    responses(
        (status = 200, description = "Root response", body = inline(types::RootResponse))
    )
)]
pub async fn root<F: PriceSource>(
    State(prices): State<PriceService<F>>,
) -> Json<types::RootResponse<'static>> {
    Json(types::RootResponse {
        message: "Pricebox is batching prices!",
        version: CRATE_VERSION,
        batching: prices.batching().into(),
    })
}
