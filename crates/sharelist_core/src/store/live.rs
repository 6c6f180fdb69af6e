//! Live-query registry and subscription handles.
//!
//! # Responsibility
//! - Track active live queries and the topic each one watches.
//! - Re-run a query after a relevant commit and hand back a delivery
//!   closure that pushes the full snapshot to the listener's sink.
//!
//! # Invariants
//! - A snapshot is only delivered if its revision is newer than the last
//!   accepted one and its content differs from it.
//! - A sink is never entered by two threads at once. Concurrent writers
//!   hand their snapshot to whichever thread is already delivering, which
//!   passes on only the newest one.
//! - A sink that writes back into the store is re-entered only after it
//!   returns; its own follow-up snapshot is queued, not nested.
//! - Once a `Subscription` is dropped its sink is never called again.

use crate::model::list::ListId;
use log::{debug, warn};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Collection a write touched or a live query watches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// The top-level lists collection, including member rows.
    Lists,
    /// The tasks nested under one list.
    Tasks(ListId),
}

impl Topic {
    fn label(&self) -> &'static str {
        match self {
            Self::Lists => "lists",
            Self::Tasks(_) => "tasks",
        }
    }
}

/// Deferred snapshot push, run after the connection lock is released.
pub(crate) type Delivery = Box<dyn FnOnce() + Send>;

pub(crate) trait LiveListener: Send + Sync {
    fn topic(&self) -> &Topic;
    fn refresh(&self, conn: &Connection, revision: u64) -> Option<Delivery>;
}

struct DeliveryState<T> {
    revision: u64,
    last: Option<Vec<T>>,
    outbox: Outbox<Vec<T>>,
}

/// Latest-wins handoff between writer threads and the one thread
/// currently running a sink.
pub(crate) struct Outbox<T> {
    pending: Option<T>,
    draining: bool,
}

impl<T> Default for Outbox<T> {
    fn default() -> Self {
        Self {
            pending: None,
            draining: false,
        }
    }
}

impl<T> Outbox<T> {
    /// Queues `value`, replacing anything not yet delivered.
    ///
    /// Returns `true` when the caller became the drainer and must call
    /// [`drain_outbox`].
    pub(crate) fn push(&mut self, value: T) -> bool {
        self.pending = Some(value);
        if self.draining {
            return false;
        }
        self.draining = true;
        true
    }

    fn take(&mut self) -> Option<T> {
        let next = self.pending.take();
        if next.is_none() {
            self.draining = false;
        }
        next
    }
}

/// Delivers queued values one at a time with the state lock released
/// around each `deliver` call.
pub(crate) fn drain_outbox<'a, S, T, P, D>(
    mutex: &'a Mutex<S>,
    mut guard: MutexGuard<'a, S>,
    outbox: P,
    deliver: D,
) where
    P: Fn(&mut S) -> &mut Outbox<T>,
    D: Fn(T),
{
    loop {
        let Some(next) = outbox(&mut *guard).take() else {
            return;
        };
        drop(guard);
        deliver(next);
        guard = lock_ignoring_poison(mutex);
    }
}

/// One registered query plus its sink.
pub(crate) struct LiveQuery<T, E, Q, S> {
    topic: Topic,
    query: Q,
    sink: Arc<S>,
    active: Arc<AtomicBool>,
    state: Arc<Mutex<DeliveryState<T>>>,
    _error: PhantomData<fn() -> E>,
}

impl<T, E, Q, S> LiveQuery<T, E, Q, S>
where
    T: Clone + PartialEq + Send + 'static,
    E: Display,
    Q: Fn(&Connection) -> Result<Vec<T>, E> + Send + Sync,
    S: Fn(Vec<T>) + Send + Sync + 'static,
{
    pub(crate) fn new(topic: Topic, query: Q, sink: S) -> Self {
        Self {
            topic,
            query,
            sink: Arc::new(sink),
            active: Arc::new(AtomicBool::new(true)),
            state: Arc::new(Mutex::new(DeliveryState {
                revision: 0,
                last: None,
                outbox: Outbox::default(),
            })),
            _error: PhantomData,
        }
    }

    pub(crate) fn run(&self, conn: &Connection) -> Result<Vec<T>, E> {
        (self.query)(conn)
    }

    pub(crate) fn active_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }

    pub(crate) fn delivery(&self, rows: Vec<T>, revision: u64) -> Delivery {
        let sink = Arc::clone(&self.sink);
        let active = Arc::clone(&self.active);
        let state = Arc::clone(&self.state);
        Box::new(move || {
            if !active.load(Ordering::Acquire) {
                return;
            }
            let mut guard = lock_ignoring_poison(&state);
            if guard.last.is_some() && revision <= guard.revision {
                return;
            }
            guard.revision = revision;
            if guard.last.as_ref() == Some(&rows) {
                return;
            }
            guard.last = Some(rows.clone());
            if !guard.outbox.push(rows) {
                return;
            }
            drain_outbox(
                &*state,
                guard,
                |state: &mut DeliveryState<T>| &mut state.outbox,
                |rows| {
                    if active.load(Ordering::Acquire) {
                        sink(rows);
                    }
                },
            );
        })
    }
}

impl<T, E, Q, S> LiveListener for LiveQuery<T, E, Q, S>
where
    T: Clone + PartialEq + Send + 'static,
    E: Display,
    Q: Fn(&Connection) -> Result<Vec<T>, E> + Send + Sync,
    S: Fn(Vec<T>) + Send + Sync + 'static,
{
    fn topic(&self) -> &Topic {
        &self.topic
    }

    fn refresh(&self, conn: &Connection, revision: u64) -> Option<Delivery> {
        if !self.active.load(Ordering::Acquire) {
            return None;
        }
        match self.run(conn) {
            Ok(rows) => Some(self.delivery(rows, revision)),
            Err(err) => {
                warn!(
                    "event=live_query_refresh module=store status=error topic={} revision={revision} error={err}",
                    self.topic.label()
                );
                None
            }
        }
    }
}

/// Registry of active live queries.
#[derive(Default)]
pub struct LiveQueryRegistry {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Arc<dyn LiveListener>>>,
}

impl LiveQueryRegistry {
    pub(crate) fn register(&self, listener: Arc<dyn LiveListener>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let topic = listener.topic().label();
        lock_ignoring_poison(&self.listeners).insert(id, listener);
        debug!("event=live_query_register module=store status=ok subscription_id={id} topic={topic}");
        id
    }

    fn unregister(&self, id: u64) {
        if lock_ignoring_poison(&self.listeners).remove(&id).is_some() {
            debug!("event=live_query_cancel module=store status=ok subscription_id={id}");
        }
    }

    /// Listeners watching any of `topics`.
    pub(crate) fn matching(&self, topics: &[Topic]) -> Vec<Arc<dyn LiveListener>> {
        lock_ignoring_poison(&self.listeners)
            .values()
            .filter(|listener| topics.contains(listener.topic()))
            .cloned()
            .collect()
    }

    /// Number of live queries currently registered.
    pub fn len(&self) -> usize {
        lock_ignoring_poison(&self.listeners).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle for one live query; dropping it unsubscribes.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<LiveQueryRegistry>,
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub(crate) fn new(id: u64, registry: Weak<LiveQueryRegistry>, active: Arc<AtomicBool>) -> Self {
        Self {
            id,
            registry,
            active,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stops delivery and unregisters the query.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

pub(crate) fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
