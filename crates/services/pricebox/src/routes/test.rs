use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use monetari_coalesced::{CoalescionServiceConfig, Fetch};
use monetari_database::{Database, ReferenceDb};
use monetari_result::{create_error, Error, Result};
use tokio::time::sleep;
use tower::ServiceExt;

use crate::{
    coingecko::types::SimplePrice,
    prices::PriceService,
    routes::router,
    types::{BatchingInfo, HealthResponse, PriceResponse},
    AppState,
};

/// Upstream double quoting a fixed set of coins
#[derive(Default)]
struct Quotes {
    calls: AtomicUsize,
}

#[async_trait]
impl Fetch for Quotes {
    type Value = SimplePrice;
    type Error = Error;

    async fn fetch(&self, coin_id: &str) -> Result<SimplePrice> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match coin_id {
            "bitcoin" => Ok(SimplePrice {
                usd: 97_000.5,
                eur: Some(89_000.25),
                r#try: Some(3_200_000.0),
                usd_market_cap: Some(1.9e12),
                usd_24h_change: Some(2.45),
            }),
            "tether" => Err(create_error!(UpstreamRateLimited)),
            _ => Err(create_error!(CoinNotFound {
                coin_id: coin_id.to_string()
            })),
        }
    }
}

type Prices = PriceService<Arc<Quotes>>;

/// Router over a mock upstream, flushing a batch once `threshold` lookups wait
fn app(threshold: usize) -> (Router, Prices, Arc<Quotes>) {
    let quotes = Arc::new(Quotes::default());

    let prices = PriceService::new(
        CoalescionServiceConfig::from_millis(5000, threshold, 5000),
        quotes.clone(),
        Database::Reference(ReferenceDb::default()),
    );

    let app = router().with_state(AppState {
        prices: prices.clone(),
    });

    (app, prices, quotes)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn root_reports_version_and_batching() {
    let (app, _, _) = app(4);
    let (status, body) = get(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let batching: BatchingInfo = serde_json::from_value(body["batching"].clone()).unwrap();
    assert_eq!(
        batching,
        BatchingInfo {
            wait_time_ms: 5000,
            threshold: 4,
            cache_ttl_ms: 5000,
        }
    );
}

#[tokio::test]
async fn health_follows_shutdown() {
    let (app, prices, _) = app(1);

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_value(body).unwrap();
    assert_eq!(health.status, "ok");

    prices.shutdown().await;

    let (_, body) = get(&app, "/health").await;
    assert_eq!(body["status"], "shutting_down");
}

#[tokio::test]
async fn price_is_fetched_then_cached() {
    let (app, _, quotes) = app(1);

    let (status, body) = get(&app, "/v1/price/BitCoin").await;
    assert_eq!(status, StatusCode::OK);

    let price: PriceResponse = serde_json::from_value(body).unwrap();
    assert_eq!(price.coin_id, "bitcoin");
    assert_eq!(price.price_usd, 97_000.5);
    assert_eq!(price.price_eur, Some(89_000.25));
    assert_eq!(price.price_try, Some(3_200_000.0));
    assert_eq!(price.market_cap, Some(1.9e12));
    assert_eq!(price.change_24h, Some(2.45));
    assert!(!price.from_cache);

    let (_, body) = get(&app, "/v1/price/bitcoin").await;
    assert_eq!(body["from_cache"], true);
    assert_eq!(quotes.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_coin_id_never_reaches_upstream() {
    let (app, _, quotes) = app(1);
    let (status, body) = get(&app, "/v1/price/shiba--inu").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "InvalidCoinId");
    assert_eq!(quotes.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upstream_errors_are_mapped() {
    let (app, _, _) = app(1);

    let (status, body) = get(&app, "/v1/price/not-a-coin").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["type"], "CoinNotFound");
    assert_eq!(body["coin_id"], "not-a-coin");

    let (status, body) = get(&app, "/v1/price/tether").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["type"], "UpstreamRateLimited");
}

#[tokio::test]
async fn lookups_after_shutdown_are_refused() {
    let (app, prices, quotes) = app(1);
    prices.shutdown().await;

    let (status, body) = get(&app, "/v1/price/bitcoin").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["type"], "ShuttingDown");
    assert_eq!(quotes.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn stop_signal_answers_queued_lookups() {
    let (app, prices, quotes) = app(10);

    let queued = tokio::spawn({
        let app = app.clone();
        async move { get(&app, "/v1/price/bitcoin").await }
    });

    // parked in its batch window, well before the deadline
    sleep(Duration::from_millis(100)).await;

    crate::stop_on(async {}, prices).await;

    let (status, body) = queued.await.unwrap();
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["type"], "ShuttingDown");
    assert_eq!(quotes.calls.load(Ordering::SeqCst), 0);

    let (_, body) = get(&app, "/health").await;
    assert_eq!(body["status"], "shutting_down");
}

#[tokio::test]
async fn fresh_lookups_are_recorded() {
    let (app, _, quotes) = app(1);

    get(&app, "/v1/price/bitcoin").await;
    let (_, body) = get(&app, "/v1/price/bitcoin").await;
    assert_eq!(body["from_cache"], true);
    assert_eq!(quotes.calls.load(Ordering::SeqCst), 1);

    // failed lookups leave nothing behind
    get(&app, "/v1/price/not-a-coin").await;

    let (status, body) = get(&app, "/v1/price/BitCoin/history").await;
    assert_eq!(status, StatusCode::OK);

    let history: Vec<PriceResponse> = serde_json::from_value(body).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].coin_id, "bitcoin");
    assert_eq!(history[0].price_usd, 97_000.5);
    assert!(!history[0].from_cache);

    let (_, body) = get(&app, "/v1/price/not-a-coin/history").await;
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test(start_paused = true)]
async fn history_is_newest_first() {
    let (app, _, quotes) = app(1);

    for _ in 0..3 {
        get(&app, "/v1/price/bitcoin").await;
        // let the cached price expire
        sleep(Duration::from_millis(5001)).await;
    }
    assert_eq!(quotes.calls.load(Ordering::SeqCst), 3);

    let (_, body) = get(&app, "/v1/price/bitcoin/history").await;
    let history: Vec<PriceResponse> = serde_json::from_value(body).unwrap();
    assert_eq!(history.len(), 3);
    assert!(history
        .windows(2)
        .all(|pair| pair[0].queried_at >= pair[1].queried_at));

    let (_, body) = get(&app, "/v1/price/bitcoin/history?limit=2&offset=2").await;
    let page: Vec<PriceResponse> = serde_json::from_value(body).unwrap();
    assert_eq!(page, history[2..].to_vec());
}

#[tokio::test]
async fn malformed_history_query_is_rejected() {
    let (app, _, _) = app(1);

    let (status, body) = get(&app, "/v1/price/bitcoin/history?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "FailedValidation");

    let (status, body) = get(&app, "/v1/price/bitcoin/history?from=soon").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "FailedValidation");

    let (status, body) = get(&app, "/v1/price/bit_coin/history").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "InvalidCoinId");
}
