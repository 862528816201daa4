use axum::{extract::Request, middleware::Next, response::Response};
use tokio::time::Instant;

/// Log every request once it has been answered
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        "{method} {path} {} - {}ms",
        response.status().as_u16(),
        start.elapsed().as_millis()
    );

    response
}
