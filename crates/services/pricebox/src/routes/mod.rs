use crate::{middleware, prices::PriceSource, AppState};
use axum::routing::{get, Router};

pub mod health;
pub mod history;
pub mod price;
pub mod root;

#[cfg(test)]
mod test;

pub fn router<F: PriceSource>() -> Router<AppState<F>> {
    Router::new()
        .route("/", get(root::root::<F>))
        .route("/health", get(health::health::<F>))
        .route("/v1/price/:coin_id", get(price::price::<F>))
        .route("/v1/price/:coin_id/history", get(history::history::<F>))
        .layer(axum::middleware::from_fn(middleware::log_request))
}
