use std::fmt;

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

#[cfg(feature = "axum")]
pub mod axum;

/// Result type with custom Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error information
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// Type of error and additional information
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub error_type: ErrorType,

    /// Where this error occurred
    pub location: String,
}

/// Possible error types
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorType {
    // ? Request related errors
    InvalidCoinId {
        reason: String,
    },
    FailedValidation {
        error: String,
    },

    // ? Upstream related errors
    CoinNotFound {
        coin_id: String,
    },
    UpstreamTimeout,
    UpstreamRateLimited,
    UpstreamUnavailable {
        status: Option<u16>,
    },

    // ? Storage related errors
    DatabaseError {
        operation: String,
        collection: String,
    },

    // ? General errors
    ShuttingDown,
    InternalError,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorType::InvalidCoinId { reason } => write!(f, "Invalid coin id: {reason}"),
            ErrorType::FailedValidation { error } => write!(f, "Validation failed: {error}"),
            ErrorType::CoinNotFound { coin_id } => write!(f, "Coin not found: {coin_id}"),
            ErrorType::UpstreamTimeout => write!(f, "Upstream request timed out"),
            ErrorType::UpstreamRateLimited => write!(f, "Upstream rate limit exceeded"),
            ErrorType::UpstreamUnavailable { status: Some(status) } => {
                write!(f, "Upstream unavailable (status {status})")
            }
            ErrorType::UpstreamUnavailable { status: None } => write!(f, "Upstream unavailable"),
            ErrorType::DatabaseError {
                operation,
                collection,
            } => write!(f, "Database error during {operation} on {collection}"),
            ErrorType::ShuttingDown => write!(f, "Service is shutting down"),
            ErrorType::InternalError => write!(f, "Internal error"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error_type, self.location)
    }
}

impl std::error::Error for Error {}

#[macro_export]
macro_rules! create_error {
    ( $error: ident $( $tt:tt )? ) => {
        $crate::Error {
            error_type: $crate::ErrorType::$error $( $tt )?,
            location: format!("{}:{}:{}", file!(), line!(), column!()),
        }
    };
}

#[macro_export]
macro_rules! create_database_error {
    ( $operation: expr, $collection: expr ) => {
        $crate::create_error!(DatabaseError {
            operation: $operation.to_string(),
            collection: $collection.to_string()
        })
    };
}
