use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::{Error, ErrorType};

impl ErrorType {
    /// HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorType::InvalidCoinId { .. } => StatusCode::BAD_REQUEST,
            ErrorType::FailedValidation { .. } => StatusCode::BAD_REQUEST,

            ErrorType::CoinNotFound { .. } => StatusCode::NOT_FOUND,
            ErrorType::UpstreamTimeout => StatusCode::SERVICE_UNAVAILABLE,
            ErrorType::UpstreamRateLimited => StatusCode::SERVICE_UNAVAILABLE,
            ErrorType::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,

            ErrorType::DatabaseError { .. } => StatusCode::INTERNAL_SERVER_ERROR,

            ErrorType::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            ErrorType::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// HTTP response builder for Error enum
impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        (self.error_type.status(), Json(&self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};

    use crate::create_error;

    #[tokio::test]
    async fn renders_status_and_body() {
        let response = create_error!(CoinNotFound {
            coin_id: "not-a-coin".to_string()
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["type"], "CoinNotFound");
        assert_eq!(value["coin_id"], "not-a-coin");
    }

    #[test]
    fn upstream_failures_are_unavailable() {
        assert_eq!(
            create_error!(UpstreamRateLimited).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            create_error!(ShuttingDown).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            create_error!(FailedValidation {
                error: "limit must be between 1 and 1000".to_string()
            })
            .into_response()
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            create_error!(InvalidCoinId {
                reason: "empty".to_string()
            })
            .into_response()
            .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
