//! # Store
//!
//! Single source of truth for application state, with subscriptions scoped
//! to a sub-path of the root record.
//!
//! ```text
//!   set(path, v) ──▶ Mutex<Inner>
//!                     ├── state: S
//!                     └── subscribers ──┬──▶ Subscription<T1>  (path a.b)
//!                                       ├──▶ Subscription<T2>  (path a.c)
//!                                       └──▶ ...
//! ```
//!
//! Every write re-reads each subscriber's path and forwards the value only
//! when it differs from what that subscriber last saw. Fan-out runs under
//! the lock, so a subscriber observes writes in the order they were made and
//! has them queued before `set` returns.

use std::borrow::Cow;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use log::{debug, trace};
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// A typed lens into the root state `S` addressing a value of type `T`.
///
/// Reads return owned values so keyed paths (map entries) can fall back to a
/// default when the key is absent.
pub struct Path<S, T> {
    name: Cow<'static, str>,
    read: Arc<dyn Fn(&S) -> T + Send + Sync>,
    write: Arc<dyn Fn(&mut S, T) + Send + Sync>,
}

impl<S, T> Path<S, T> {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        read: impl Fn(&S) -> T + Send + Sync + 'static,
        write: impl Fn(&mut S, T) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            read: Arc::new(read),
            write: Arc::new(write),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read(&self, state: &S) -> T {
        (self.read)(state)
    }

    pub fn write(&self, state: &mut S, value: T) {
        (self.write)(state, value)
    }
}

impl<S, T> Clone for Path<S, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            read: Arc::clone(&self.read),
            write: Arc::clone(&self.write),
        }
    }
}

impl<S, T> fmt::Debug for Path<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Path").field(&self.name).finish()
    }
}

/// Pushes the new state to one subscriber. Returns `false` once the
/// subscriber has gone away so it can be pruned.
type Notifier<S> = Box<dyn FnMut(&S) -> bool + Send>;

struct Inner<S> {
    state: S,
    subscribers: Vec<Notifier<S>>,
}

/// Process-wide observable state container. Cloning shares the same state.
pub struct Store<S> {
    inner: Arc<Mutex<Inner<S>>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Send + 'static> Store<S> {
    pub fn new(state: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Snapshot read of the value at `path`.
    pub fn get<T>(&self, path: &Path<S, T>) -> T {
        path.read(&self.inner.lock().state)
    }

    /// Clone of the whole root record.
    pub fn snapshot(&self) -> S
    where
        S: Clone,
    {
        self.inner.lock().state.clone()
    }

    /// Replaces the value at `path` and notifies subscribers.
    pub fn set<T>(&self, path: &Path<S, T>, value: T) {
        self.update(path, move |current| *current = value);
    }

    /// Read-modify-write of the value at `path` under the store lock.
    ///
    /// `f` sees the current value and may change it in place; whatever it
    /// returns is handed back to the caller. `f` runs under the lock and must
    /// not call back into the store.
    pub fn update<T, R>(&self, path: &Path<S, T>, f: impl FnOnce(&mut T) -> R) -> R {
        let mut inner = self.inner.lock();
        let mut value = path.read(&inner.state);
        let result = f(&mut value);
        path.write(&mut inner.state, value);
        trace!("Store write at {}", path.name());

        let Inner { state, subscribers } = &mut *inner;
        let before = subscribers.len();
        subscribers.retain_mut(|notify| notify(&*state));
        if subscribers.len() != before {
            debug!(
                "Pruned {} closed subscription(s)",
                before - subscribers.len()
            );
        }
        result
    }

    /// Subscribes to the value at `path`.
    ///
    /// The current value is delivered first; afterwards only values that
    /// differ from the previously delivered one are sent.
    pub fn subscribe<T>(&self, path: &Path<S, T>) -> Subscription<T>
    where
        T: Clone + PartialEq + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();

        let mut last = path.read(&inner.state);
        // Receiver is alive in this scope, the send cannot fail.
        let _ = tx.send(last.clone());

        let path = path.clone();
        debug!("New subscription at {}", path.name());
        inner.subscribers.push(Box::new(move |state: &S| {
            let value = path.read(state);
            if value == last {
                return !tx.is_closed();
            }
            last = value.clone();
            tx.send(value).is_ok()
        }));

        Subscription { rx }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

/// Stream of distinct values at one path. Dropping it unsubscribes.
pub struct Subscription<T> {
    rx: UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Returns an already-queued value without waiting.
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
