use std::{fmt, time::Duration};

use cached::proc_macro::cached;
use config::{
    builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File, FileFormat,
};
use futures_locks::RwLock;
use once_cell::sync::Lazy;
use serde::Deserialize;

static CONFIG_BUILDER: Lazy<RwLock<ConfigBuilder<DefaultState>>> =
    Lazy::new(|| RwLock::new(builder()));

/// Configuration sources in order of precedence, lowest first:
/// bundled defaults, a local `Monetari.toml`, then `MONETARI_*` variables
/// (e.g. `MONETARI_BATCH__THRESHOLD=5`).
pub fn builder() -> ConfigBuilder<DefaultState> {
    let mut builder = Config::builder().add_source(File::from_str(
        include_str!("../Monetari.toml"),
        FileFormat::Toml,
    ));

    if std::path::Path::new("Monetari.toml").exists() {
        builder = builder.add_source(File::new("Monetari.toml", FileFormat::Toml));
    }

    builder.add_source(
        Environment::with_prefix("MONETARI")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}

#[derive(Deserialize, Debug, Clone)]
pub struct Api {
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct CoinGecko {
    pub api_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
}

impl CoinGecko {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl fmt::Debug for CoinGecko {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinGecko")
            .field("api_url", &self.api_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Batch {
    /// Deadline before a non-empty batch is flushed
    pub wait_time_ms: u64,
    /// Number of waiting requests that flush a batch immediately
    pub threshold: usize,
    /// How long a successful result is served from cache
    pub cache_ttl_ms: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub api: Api,
    pub coingecko: CoinGecko,
    pub batch: Batch,
}

impl Settings {
    /// Check value ranges, reporting every violation at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.api.port < 1 {
            errors.push("api.port must be at least 1");
        }

        if self.coingecko.api_url.trim().is_empty() {
            errors.push("coingecko.api_url must not be empty");
        }

        if self.batch.wait_time_ms < 100 {
            errors.push("batch.wait_time_ms must be at least 100");
        }

        if self.batch.threshold < 1 {
            errors.push("batch.threshold must be at least 1");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }
}

/// Configure logging and common environment variables
pub fn setup_logging(service: &str) {
    dotenv::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    tracing::info!(
        "Starting Monetari {service} [version {}]",
        env!("CARGO_PKG_VERSION")
    );
}

/// Set up logging for a service binary and report its configuration
#[macro_export]
macro_rules! configure {
    ($service: ident) => {
        $crate::setup_logging(stringify!($service));
        $crate::init().await;
    };
}

pub async fn init() {
    match config().await {
        Ok(settings) => tracing::info!(":: Monetari Configuration ::\n{settings:?}"),
        Err(error) => tracing::error!("Invalid configuration: {error}"),
    }
}

pub async fn read() -> Result<Config, ConfigError> {
    CONFIG_BUILDER.read().await.clone().build()
}

/// Load and validate settings, bypassing the cache
pub async fn settings() -> Result<Settings, ConfigError> {
    let settings = read().await?.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

#[cached(time = 30, result = true)]
pub async fn config() -> Result<Settings, ConfigError> {
    settings().await
}

#[cfg(test)]
mod tests {
    use crate::{builder, settings, Settings};

    fn build(overrides: &[(&str, i64)]) -> Settings {
        let mut builder = builder();
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value).unwrap();
        }

        builder.build().unwrap().try_deserialize().unwrap()
    }

    #[tokio::test]
    async fn bundled_defaults_are_valid() {
        let settings = settings().await.unwrap();

        assert_eq!(settings.api.port, 3000);
        assert_eq!(settings.batch.wait_time_ms, 5000);
        assert_eq!(settings.batch.threshold, 3);
        assert_eq!(settings.batch.cache_ttl_ms, 5000);
        assert_eq!(settings.coingecko.api_url, "https://api.coingecko.com/api/v3");
    }

    #[test]
    fn overrides_take_precedence() {
        let settings = build(&[("batch.threshold", 5), ("coingecko.timeout_ms", 2500)]);

        assert_eq!(settings.batch.threshold, 5);
        assert_eq!(settings.coingecko.timeout().as_millis(), 2500);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validation_reports_every_violation() {
        let settings = build(&[("batch.wait_time_ms", 50), ("batch.threshold", 0)]);

        let message = settings.validate().unwrap_err().to_string();
        assert!(message.contains("batch.wait_time_ms"));
        assert!(message.contains("batch.threshold"));
    }

    #[test]
    fn api_key_is_not_logged() {
        let mut settings = build(&[]);
        settings.coingecko.api_key = "secret".to_string();

        assert!(!format!("{settings:?}").contains("secret"));
    }
}
