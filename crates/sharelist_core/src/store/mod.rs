//! Embedded document store with live queries.
//!
//! # Responsibility
//! - Serialize access to one migrated SQLite connection.
//! - Run every write as an all-or-nothing transaction.
//! - Push fresh query snapshots to live subscribers after each commit.
//!
//! # Invariants
//! - Live-query callbacks never run while the connection lock is held,
//!   so a callback may itself read or write through the store.
//! - The store revision increases by one per committed write.
//! - `created_at` values handed out by `next_created_at` are strictly
//!   increasing per table.

pub mod live;

use crate::db::{open_db, open_db_in_memory, DbResult};
use live::{lock_ignoring_poison, LiveListener, LiveQuery, LiveQueryRegistry, Subscription, Topic};
use log::debug;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::fmt::Display;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// Shared handle to one SQLite-backed document store.
pub struct DocumentStore {
    conn: Mutex<Connection>,
    revision: AtomicU64,
    live: Arc<LiveQueryRegistry>,
}

impl DocumentStore {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Arc<Self> {
        Arc::new(Self {
            conn: Mutex::new(conn),
            revision: AtomicU64::new(0),
            live: Arc::new(LiveQueryRegistry::default()),
        })
    }

    /// Opens (or creates) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Arc<Self>> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens a fresh in-memory database and wraps it.
    pub fn open_in_memory() -> DbResult<Arc<Self>> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Current write revision.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Number of live queries still registered.
    pub fn active_subscriptions(&self) -> usize {
        self.live.len()
    }

    /// Runs a read-only operation against the connection.
    pub fn read<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
    {
        let conn = self.lock();
        op(&*conn)
    }

    /// Runs `op` inside an immediate transaction, commits, then notifies
    /// live queries watching any of `topics`.
    ///
    /// An error from `op` rolls the whole transaction back and nothing
    /// is published.
    pub fn write<T, E, F>(&self, topics: &[Topic], op: F) -> Result<T, E>
    where
        E: From<rusqlite::Error>,
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    {
        let (value, deliveries) = {
            let mut conn = self.lock();
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let value = op(&tx)?;
            tx.commit()?;

            let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
            let deliveries: Vec<_> = self
                .live
                .matching(topics)
                .iter()
                .filter_map(|listener| listener.refresh(&*conn, revision))
                .collect();
            debug!(
                "event=store_write module=store status=ok revision={revision} deliveries={}",
                deliveries.len()
            );
            (value, deliveries)
        };

        for deliver in deliveries {
            deliver();
        }
        Ok(value)
    }

    /// Registers a live query on `topic`.
    ///
    /// The current snapshot is delivered before this returns, unless a
    /// concurrent write already produced a newer one. Later snapshots
    /// follow every committed write on the topic whose result differs
    /// from the last one delivered. Calls into `sink` never overlap.
    pub fn subscribe<T, E, Q, S>(&self, topic: Topic, query: Q, sink: S) -> Result<Subscription, E>
    where
        T: Clone + PartialEq + Send + 'static,
        E: Display + 'static,
        Q: Fn(&Connection) -> Result<Vec<T>, E> + Send + Sync + 'static,
        S: Fn(Vec<T>) + Send + Sync + 'static,
    {
        let listener = Arc::new(LiveQuery::new(topic, query, sink));
        let (subscription, initial) = {
            let conn = self.lock();
            let rows = listener.run(&*conn)?;
            let revision = self.revision();
            let active = listener.active_flag();
            let initial = listener.delivery(rows, revision);
            let id = self.live.register(listener as Arc<dyn LiveListener>);
            (
                Subscription::new(id, Arc::downgrade(&self.live), active),
                initial,
            )
        };

        initial();
        Ok(subscription)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        lock_ignoring_poison(&self.conn)
    }
}

/// Next creation timestamp for `table`: wall clock in epoch milliseconds,
/// bumped past the newest existing row so ordering stays strict.
pub(crate) fn next_created_at(tx: &Transaction<'_>, table: &'static str) -> rusqlite::Result<i64> {
    let newest: Option<i64> = tx
        .query_row(&format!("SELECT MAX(created_at) FROM {table};"), [], |row| {
            row.get(0)
        })
        .optional()?
        .flatten();
    let now = now_epoch_ms();
    Ok(match newest {
        Some(newest) if newest >= now => newest + 1,
        _ => now,
    })
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
