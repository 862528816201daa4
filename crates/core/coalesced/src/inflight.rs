use std::collections::HashMap;

use tokio::sync::watch::{channel as watch_channel, Receiver, Sender};

use crate::Error;

/// Shared slot an upstream outcome is published into, `None` until it settles
pub(crate) type Slot<Value, E> = Option<Result<Value, E>>;

struct InflightCall<Value, E> {
    id: u64,
    receiver: Receiver<Slot<Value, E>>,
}

/// Upstream calls currently executing, at most one per key.
pub(crate) struct InflightRegistry<Value, E> {
    calls: HashMap<String, InflightCall<Value, E>>,
}

impl<Value, E> InflightRegistry<Value, E> {
    pub fn new() -> Self {
        Self {
            calls: HashMap::new(),
        }
    }

    /// Record a call for `key` identified by `id`. The returned sender is
    /// used to publish the outcome to everyone who attached meanwhile.
    pub fn register(&mut self, key: &str, id: u64) -> Sender<Slot<Value, E>> {
        let (send, recv) = watch_channel(None);

        self.calls.insert(
            key.to_string(),
            InflightCall {
                id,
                receiver: recv,
            },
        );

        send
    }

    /// Subscribe to the outcome of the call running for `key`, if any
    pub fn attach(&self, key: &str) -> Option<Receiver<Slot<Value, E>>> {
        self.calls.get(key).map(|call| call.receiver.clone())
    }

    /// Forget the call for `key`, but only if it is still the one identified
    /// by `id`
    pub fn settle(&mut self, key: &str, id: u64) -> bool {
        if self.calls.get(key).is_some_and(|call| call.id == id) {
            self.calls.remove(key);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }
}

/// Wait until an in-flight call has published its outcome.
pub(crate) async fn wait_for<Value: Clone, E: Clone>(
    mut receiver: Receiver<Slot<Value, E>>,
) -> Result<Value, Error<E>> {
    let slot = receiver
        .wait_for(|slot| slot.is_some())
        .await
        .map_err(|_| Error::RecvError)?;

    match &*slot {
        Some(Ok(value)) => Ok(value.clone()),
        Some(Err(error)) => Err(Error::Upstream(error.clone())),
        None => Err(Error::RecvError),
    }
}
