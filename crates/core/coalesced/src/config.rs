use std::time::Duration;

#[derive(Clone, PartialEq, Eq, Debug)]
/// Config values for [`CoalescionService`](crate::CoalescionService).
pub struct CoalescionServiceConfig {
    /// How long a batch window stays open before it is flushed
    pub wait_time: Duration,
    /// How many waiters close a batch window immediately
    pub threshold: usize,
    /// How long a successful result is served without a new upstream call
    pub cache_ttl: Duration,
}

impl CoalescionServiceConfig {
    pub fn from_millis(wait_time_ms: u64, threshold: usize, cache_ttl_ms: u64) -> Self {
        Self {
            wait_time: Duration::from_millis(wait_time_ms),
            threshold,
            cache_ttl: Duration::from_millis(cache_ttl_ms),
        }
    }
}

impl Default for CoalescionServiceConfig {
    fn default() -> Self {
        Self {
            wait_time: Duration::from_secs(5),
            threshold: 3,
            cache_ttl: Duration::from_secs(5),
        }
    }
}
