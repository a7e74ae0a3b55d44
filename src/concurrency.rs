//! Per-key request deduplication
//!
//! At most one remote request runs per key. Later callers asking for the
//! same key while it is pending join the pending request and receive a clone
//! of its outcome. The entry is dropped when the request resolves, so the
//! next call after completion starts a fresh request.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Pending<T> = Shared<BoxFuture<'static, T>>;

/// Map from key to the single pending request for that key
pub struct InFlight<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pending: Mutex<HashMap<K, (u64, Pending<T>)>>,
    next_ticket: AtomicU64,
}

/// Handle returned by [`InFlight::join_or_start`]
pub struct Joined<T: Clone> {
    pub future: Shared<BoxFuture<'static, T>>,
    /// False when the caller joined a request already in flight
    pub started: bool,
}

impl<K, T> InFlight<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Join the pending request for `key`, or start one with `start`.
    ///
    /// `start` runs only when nothing is pending for `key`; it is invoked
    /// while the map lock is held, so it must not touch this `InFlight`.
    pub fn join_or_start<F, Fut>(self: &Arc<Self>, key: K, start: F) -> Joined<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut pending = self.pending.lock();
        if let Some((_, future)) = pending.get(&key) {
            return Joined {
                future: future.clone(),
                started: false,
            };
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let request = start();
        let this = Arc::clone(self);
        let cleanup_key = key.clone();
        let future = async move {
            let outcome = request.await;
            this.finish(&cleanup_key, ticket);
            outcome
        }
        .boxed()
        .shared();

        pending.insert(key, (ticket, future.clone()));
        Joined {
            future,
            started: true,
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    fn finish(&self, key: &K, ticket: u64) {
        let mut pending = self.pending.lock();
        if pending.get(key).map(|(t, _)| *t) == Some(ticket) {
            pending.remove(key);
        }
    }
}

impl<K, T> Default for InFlight<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
