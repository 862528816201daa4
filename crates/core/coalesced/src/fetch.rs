use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;

/// Single-key upstream lookup driven by [`CoalescionService`](crate::CoalescionService).
///
/// Called at most once per flushed batch window. Any timeout or retry policy
/// belongs to the implementation; whatever it returns is handed to every
/// waiter of the batch as-is.
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    type Value: Clone + Send + Sync + 'static;
    type Error: Clone + Debug + Send + Sync + 'static;

    async fn fetch(&self, key: &str) -> Result<Self::Value, Self::Error>;
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for Arc<T> {
    type Value = T::Value;
    type Error = T::Error;

    async fn fetch(&self, key: &str) -> Result<Self::Value, Self::Error> {
        (**self).fetch(key).await
    }
}

/// Value returned to a caller along with where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fetched<Value> {
    pub value: Value,
    /// Whether the value was served without this caller's batch reaching
    /// upstream, either from the cache or from an already running call
    pub from_cache: bool,
}
