use axum::{
    extract::{Path, State},
    Json,
};
use monetari_result::{create_error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    prices::{PriceService, PriceSource},
    types,
};

static RE_COIN_ID: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-z0-9]+(-[a-z0-9]+)*$").unwrap());

const MAX_COIN_ID_LENGTH: usize = 100;

/// Normalise a coin id from the path and check it is well formed
pub fn validate_coin_id(coin_id: &str) -> Result<String> {
    let coin_id = coin_id.trim().to_lowercase();

    if coin_id.is_empty() || coin_id.len() > MAX_COIN_ID_LENGTH {
        return Err(create_error!(InvalidCoinId {
            reason: format!("coin id must be between 1 and {MAX_COIN_ID_LENGTH} characters")
        }));
    }

    if !RE_COIN_ID.is_match(&coin_id) {
        return Err(create_error!(InvalidCoinId {
            reason: "coin id may only contain lowercase letters, numbers and single hyphens (e.g. bitcoin, shiba-inu)".to_string()
        }));
    }

    Ok(coin_id)
}

/// Current price of a coin
///
/// Lookups for the same coin are batched, so a response may take up to the
/// configured wait time unless enough requests arrive together.
#[utoipa::path(
    get,
    path = "/v1/price/{coin_id}",
    tag = "Prices",
    params(
        ("coin_id" = String, Path, description = "Coin identifier", example = "bitcoin")
    ),
    responses(
        (status = 200, description = "Current price", body = types::PriceResponse),
        (status = 400, description = "Malformed coin id", body = monetari_result::Error),
        (status = 404, description = "Unknown coin", body = monetari_result::Error),
        (status = 503, description = "Upstream unavailable or shutting down", body = monetari_result::Error)
    )
)]
pub async fn price<F: PriceSource>(
    Path(coin_id): Path<String>,
    State(prices): State<PriceService<F>>,
) -> Result<Json<types::PriceResponse>> {
    let coin_id = validate_coin_id(&coin_id)?;
    prices.current_price(&coin_id).await.map(Json)
}

#[cfg(test)]
mod tests {
    use monetari_result::ErrorType;

    use super::validate_coin_id;

    #[test]
    fn normalises_coin_id() {
        assert_eq!(validate_coin_id("  Bitcoin ").unwrap(), "bitcoin");
        assert_eq!(validate_coin_id("shiba-inu").unwrap(), "shiba-inu");
        assert_eq!(validate_coin_id("usd-coin-2").unwrap(), "usd-coin-2");
    }

    #[test]
    fn rejects_malformed_coin_id() {
        for coin_id in ["", "   ", "-bitcoin", "bitcoin-", "shiba--inu", "bit_coin", "bit coin", "₿"] {
            let error = validate_coin_id(coin_id).unwrap_err();
            assert!(
                matches!(error.error_type, ErrorType::InvalidCoinId { .. }),
                "{coin_id:?} was accepted"
            );
        }
    }

    #[test]
    fn rejects_overlong_coin_id() {
        assert!(validate_coin_id(&"a".repeat(100)).is_ok());
        assert!(validate_coin_id(&"a".repeat(101)).is_err());
    }
}
