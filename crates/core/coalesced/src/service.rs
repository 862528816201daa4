use std::sync::Arc;

use tokio::{
    sync::{oneshot, watch::Receiver, Mutex},
    task::JoinHandle,
    time::{sleep, Instant},
};

use crate::{
    cache::TtlCache,
    inflight::{self, InflightRegistry, Slot},
    key::normalize,
    window::{self, BatchWindow, Windows},
    CoalescionServiceConfig, Error, Fetch, Fetched,
};

type Outcome<F> = Result<Fetched<<F as Fetch>::Value>, Error<<F as Fetch>::Error>>;

/// Everything the service knows about its keys, guarded by a single lock.
struct Registry<Value, E> {
    windows: Windows<Value, E>,
    inflight: InflightRegistry<Value, E>,
    cache: TtlCache<Value>,
    next_id: u64,
    closed: bool,
}

impl<Value: Clone, E: Clone> Registry<Value, E> {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

struct Inner<F: Fetch> {
    config: CoalescionServiceConfig,
    fetcher: F,
    state: Mutex<Registry<F::Value, F::Error>>,
}

/// How a caller is going to be served once the lock is released
enum Pending<Value, E> {
    Inflight(Receiver<Slot<Value, E>>),
    Batched(oneshot::Receiver<Result<Fetched<Value>, Error<E>>>),
}

/// Coalesces concurrent lookups of the same key into a single upstream call.
///
/// A lookup is served from the TTL cache when possible, otherwise it attaches
/// to the upstream call already running for the key, otherwise it joins the
/// key's batch window. A window is flushed once when either its deadline
/// passes or enough callers have joined, whichever happens first.
pub struct CoalescionService<F: Fetch> {
    inner: Arc<Inner<F>>,
}

impl<F: Fetch> Clone for CoalescionService<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<F: Fetch> CoalescionService<F> {
    pub fn from_config(config: CoalescionServiceConfig, fetcher: F) -> Self {
        let state = Registry {
            windows: Windows::new(),
            inflight: InflightRegistry::new(),
            cache: TtlCache::new(config.cache_ttl),
            next_id: 0,
            closed: false,
        };

        Self {
            inner: Arc::new(Inner {
                config,
                fetcher,
                state: Mutex::new(state),
            }),
        }
    }

    pub fn config(&self) -> &CoalescionServiceConfig {
        &self.inner.config
    }

    /// Look up `key`, sharing the upstream call with every other caller
    /// asking for the same key around the same time.
    pub async fn get(&self, key: &str) -> Outcome<F> {
        let key = normalize(key);

        let pending = {
            let mut state = self.inner.state.lock().await;

            if state.closed {
                return Err(Error::ShuttingDown);
            }

            if let Some(value) = state.cache.get(&key, Instant::now()) {
                tracing::debug!("Cache hit for {key}");
                return Ok(Fetched {
                    value: value.clone(),
                    from_cache: true,
                });
            }

            if let Some(receiver) = state.inflight.attach(&key) {
                tracing::debug!("Inflight hit for {key}");
                Pending::Inflight(receiver)
            } else {
                let (send, recv) = oneshot::channel();
                self.admit(&mut state, key, send);
                Pending::Batched(recv)
            }
        };

        match pending {
            Pending::Inflight(receiver) => {
                inflight::wait_for(receiver).await.map(|value| Fetched {
                    value,
                    from_cache: true,
                })
            }
            Pending::Batched(receiver) => receiver.await.map_err(|_| Error::RecvError)?,
        }
    }

    /// Reject everyone still waiting on a batch window and drop all state.
    ///
    /// Upstream calls already running are left to finish; callers attached
    /// to them still receive their outcome. Later lookups fail with
    /// [`Error::ShuttingDown`].
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        state.closed = true;

        for (key, mut window) in state.windows.drain() {
            window.cancel_deadline();
            window.reject(Error::ShuttingDown);
            tracing::warn!("Rejected pending batch for {key} on shutdown");
        }

        state.cache.clear();
        state.inflight.clear();
    }

    pub async fn is_shut_down(&self) -> bool {
        self.inner.state.lock().await.closed
    }

    /// Number of batch windows currently accepting callers
    pub async fn open_windows(&self) -> usize {
        self.inner.state.lock().await.windows.len()
    }

    /// Number of upstream calls currently executing
    pub async fn inflight_calls(&self) -> usize {
        self.inner.state.lock().await.inflight.len()
    }

    /// Number of cached keys, fresh or not
    pub async fn cached_keys(&self) -> usize {
        self.inner.state.lock().await.cache.len()
    }

    /// Join or open the batch window for `key`, flushing it once it is full.
    fn admit(
        &self,
        state: &mut Registry<F::Value, F::Error>,
        key: String,
        waiter: window::Waiter<F::Value, F::Error>,
    ) {
        let threshold = self.inner.config.threshold;

        let waiting = match state.windows.get_mut(&key) {
            Some(window) => {
                let waiting = window.join(waiter);
                tracing::debug!("Request added to batch for {key} ({waiting} pending)");
                waiting
            }
            None => {
                let id = state.next_id();
                let deadline = (threshold > 1).then(|| self.arm_deadline(key.clone(), id));
                state.windows.open(key.clone(), id, waiter, deadline);
                tracing::info!("Batch started for {key}");
                1
            }
        };

        if waiting >= threshold {
            if let Some(mut window) = state.windows.take(&key, None) {
                tracing::info!("Threshold reached for {key}, flushing");
                window.cancel_deadline();
                self.flush(state, key, window);
            }
        }
    }

    /// Flush the window `id` of `key` once the configured wait time passes,
    /// unless something else closed it first.
    fn arm_deadline(&self, key: String, id: u64) -> JoinHandle<()> {
        let service = self.clone();
        let wait_time = self.inner.config.wait_time;

        tokio::spawn(async move {
            sleep(wait_time).await;

            let mut state = service.inner.state.lock().await;
            if let Some(window) = state.windows.take(&key, Some(id)) {
                tracing::debug!("Wait time elapsed for {key}, flushing");
                service.flush(&mut state, key, window);
            }
        })
    }

    /// Turn a closed window into exactly one upstream call.
    ///
    /// The call runs on its own task so that it completes even if every
    /// caller of the window has gone away, and so that a panicking fetcher
    /// still releases the key.
    fn flush(
        &self,
        state: &mut Registry<F::Value, F::Error>,
        key: String,
        window: BatchWindow<F::Value, F::Error>,
    ) {
        let id = window.id();
        let send = state.inflight.register(&key, id);
        let waiters = window.into_waiters();
        let inner = self.inner.clone();

        tokio::spawn(async move {
            let call = tokio::spawn({
                let inner = inner.clone();
                let key = key.clone();
                async move { inner.fetcher.fetch(&key).await }
            });

            let outcome = call.await;

            {
                let mut state = inner.state.lock().await;

                if let Ok(Ok(value)) = &outcome {
                    // shutdown has already dropped the cache for good
                    if !state.closed {
                        state.cache.insert(key.clone(), value.clone(), Instant::now());
                    }
                }

                state.inflight.settle(&key, id);
            }

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(error) => {
                    // dropping the sender and the waiters hands everyone a RecvError
                    tracing::error!("Upstream call for {key} did not complete: {error}");
                    return;
                }
            };

            send.send_modify(|slot| {
                slot.replace(outcome.clone());
            });

            match &outcome {
                Ok(_) => tracing::info!(
                    "Batch flushed for {key}, served {} requests",
                    waiters.len()
                ),
                Err(error) => tracing::error!("Batch failed for {key}: {error:?}"),
            }

            window::fan_out(waiters, &outcome);
        });
    }

    /// Hold the registry lock from the moment `held` fires until `release`
    /// resolves, so tests can line up contenders behind it.
    #[cfg(test)]
    pub(crate) async fn lock_until(
        &self,
        held: oneshot::Sender<()>,
        release: oneshot::Receiver<()>,
    ) {
        let _state = self.inner.state.lock().await;
        let _ = held.send(());
        let _ = release.await;
    }
}
