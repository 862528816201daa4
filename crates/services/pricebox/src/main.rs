use std::{
    future::Future,
    net::{Ipv4Addr, SocketAddr},
};

use axum::{extract::FromRef, Router};

use monetari_coalesced::CoalescionServiceConfig;
use monetari_config::config;
use monetari_database::DatabaseInfo;
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::{
    coingecko::CoinGecko,
    prices::{PriceService, PriceSource},
};

mod coingecko;
mod middleware;
mod prices;
mod routes;
mod types;

struct AppState<F: PriceSource> {
    pub prices: PriceService<F>,
}

impl<F: PriceSource> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            prices: self.prices.clone(),
        }
    }
}

impl<F: PriceSource> FromRef<AppState<F>> for PriceService<F> {
    fn from_ref(state: &AppState<F>) -> Self {
        state.prices.clone()
    }
}

/// Resolves once the process is asked to stop
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("Failed to listen for SIGTERM: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown requested, no longer accepting connections");
}

/// Stop admitting lookups as soon as `signal` fires, so lookups still waiting
/// in a batch are answered before the server drains its connections
async fn stop_on<F: PriceSource>(signal: impl Future<Output = ()>, prices: PriceService<F>) {
    signal.await;
    prices.shutdown().await;
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    // Configure logging and environment
    monetari_config::configure!(pricebox);

    // Configure API schema
    #[derive(OpenApi)]
    #[openapi(
        paths(
            routes::root::root,
            routes::health::health,
            routes::price::price,
            routes::history::history,
        ),
        tags(
            (name = "Misc", description = "Misc routes for microservice."),
            (name = "Prices", description = "Batched price lookups backed by CoinGecko.")
        ),
        components(
            schemas(
                monetari_result::Error,
                monetari_result::ErrorType,
                types::BatchingInfo,
                types::HealthResponse,
                types::PriceResponse,
            )
        ),
    )]
    struct ApiDoc;

    let config = config()
        .await
        .map_err(|error| std::io::Error::other(error.to_string()))?;

    let database = DatabaseInfo::Reference
        .connect()
        .await
        .map_err(std::io::Error::other)?;

    let coingecko = CoinGecko::new(&config.coingecko).map_err(std::io::Error::other)?;
    let prices = PriceService::new(
        CoalescionServiceConfig::from_millis(
            config.batch.wait_time_ms,
            config.batch.threshold,
            config.batch.cache_ttl_ms,
        ),
        coingecko,
        database,
    );

    let state = AppState {
        prices: prices.clone(),
    };

    // Configure Axum and router
    let app = Router::new()
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .merge(routes::router::<CoinGecko>())
        .with_state(state);

    // Configure TCP listener and bind
    let port = config.api.port;
    tracing::info!("Listening on 0.0.0.0:{port}");
    tracing::info!("Play around with the API: http://localhost:{port}/scalar");
    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = TcpListener::bind(&address).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(stop_on(shutdown_signal(), prices))
        .await?;

    tracing::info!("Pricebox stopped");

    Ok(())
}
