use std::collections::HashMap;

use tokio::{sync::oneshot, task::JoinHandle};

use crate::{Error, Fetched};

/// Completion handle held on behalf of a single caller
pub(crate) type Waiter<Value, E> = oneshot::Sender<Result<Fetched<Value>, Error<E>>>;

/// Callers queued for the next upstream call of one key.
pub(crate) struct BatchWindow<Value, E> {
    id: u64,
    waiters: Vec<Waiter<Value, E>>,
    deadline: Option<JoinHandle<()>>,
}

impl<Value: Clone, E: Clone> BatchWindow<Value, E> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Queue another caller, returns how many are now waiting
    pub fn join(&mut self, waiter: Waiter<Value, E>) -> usize {
        self.waiters.push(waiter);
        self.waiters.len()
    }

    /// Stop the deadline timer if it has not fired yet.
    ///
    /// Must not be called from within the timer task itself.
    pub fn cancel_deadline(&mut self) {
        if let Some(deadline) = self.deadline.take() {
            deadline.abort();
        }
    }

    pub fn into_waiters(self) -> Vec<Waiter<Value, E>> {
        self.waiters
    }

    /// Reject every waiter with the same error
    pub fn reject(self, error: Error<E>) {
        for waiter in self.waiters {
            let _ = waiter.send(Err(error.clone()));
        }
    }
}

/// Settle every waiter of a flushed window with the upstream outcome, in the
/// order they joined.
pub(crate) fn fan_out<Value: Clone, E: Clone>(
    waiters: Vec<Waiter<Value, E>>,
    outcome: &Result<Value, E>,
) {
    let result = outcome
        .clone()
        .map(|value| Fetched {
            value,
            from_cache: false,
        })
        .map_err(Error::Upstream);

    // a caller that gave up has dropped its receiver, nothing to deliver
    for waiter in waiters {
        let _ = waiter.send(result.clone());
    }
}

/// Open batch windows, at most one per key.
pub(crate) struct Windows<Value, E> {
    open: HashMap<String, BatchWindow<Value, E>>,
}

impl<Value: Clone, E: Clone> Windows<Value, E> {
    pub fn new() -> Self {
        Self {
            open: HashMap::new(),
        }
    }

    /// Open a new window for `key` with its first waiter.
    pub fn open(
        &mut self,
        key: String,
        id: u64,
        waiter: Waiter<Value, E>,
        deadline: Option<JoinHandle<()>>,
    ) {
        debug_assert!(!self.open.contains_key(&key), "batch window already open");

        self.open.insert(
            key,
            BatchWindow {
                id,
                waiters: vec![waiter],
                deadline,
            },
        );
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut BatchWindow<Value, E>> {
        self.open.get_mut(key)
    }

    /// Close the window for `key` so nobody else can join it.
    ///
    /// With `id` set, only a window with that identity is taken; a timer
    /// waking up late must not close a newer window for the same key.
    pub fn take(&mut self, key: &str, id: Option<u64>) -> Option<BatchWindow<Value, E>> {
        match (self.open.get(key), id) {
            (Some(window), Some(id)) if window.id != id => None,
            (Some(_), _) => self.open.remove(key),
            (None, _) => None,
        }
    }

    pub fn drain(&mut self) -> Vec<(String, BatchWindow<Value, E>)> {
        self.open.drain().collect()
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }
}
