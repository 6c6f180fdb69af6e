//! Keyed union of the owned and shared list streams.
//!
//! # Invariants
//! - A list present in both sources appears exactly once; the shared
//!   copy wins because it is inserted last.
//! - Output order is `created_at DESC, id ASC`, independent of which
//!   source ticked first.
//! - Every tick of either source emits; a source that has not reported
//!   yet counts as empty.
//! - The caller's sink is never entered concurrently, and a newer merged
//!   set is never overtaken by an older one.

use crate::identity::SessionUser;
use crate::model::list::{ListId, TodoList};
use crate::repo::list_repo::{ListRepository, RepoResult};
use crate::store::live::{drain_outbox, lock_ignoring_poison, Outbox, Subscription};
use log::debug;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Merges two list snapshots into one, keyed by list id.
pub fn merge_lists(owned: &[TodoList], shared: &[TodoList]) -> Vec<TodoList> {
    let mut by_id: BTreeMap<ListId, TodoList> = BTreeMap::new();
    for list in owned.iter().chain(shared) {
        by_id.insert(list.id, list.clone());
    }
    let mut merged: Vec<TodoList> = by_id.into_values().collect();
    merged.sort_by_key(|list| (Reverse(list.created_at), list.id));
    merged
}

#[derive(Default)]
struct MergeState {
    owned: Vec<TodoList>,
    shared: Vec<TodoList>,
    outbox: Outbox<Vec<TodoList>>,
}

#[derive(Clone, Copy)]
enum Source {
    Owned,
    Shared,
}

impl MergeState {
    fn apply(&mut self, source: Source, lists: Vec<TodoList>) -> Vec<TodoList> {
        match source {
            Source::Owned => self.owned = lists,
            Source::Shared => self.shared = lists,
        }
        merge_lists(&self.owned, &self.shared)
    }
}

/// Both underlying live queries of one merged view.
///
/// Dropping it, or calling [`cancel`](Self::cancel), cancels both.
#[must_use = "dropping an AccessibleListsSubscription cancels it immediately"]
#[derive(Debug)]
pub struct AccessibleListsSubscription {
    owned: Subscription,
    shared: Subscription,
}

impl AccessibleListsSubscription {
    /// Ids of the two underlying live queries, owned first.
    pub fn ids(&self) -> (u64, u64) {
        (self.owned.id(), self.shared.id())
    }

    pub fn cancel(self) {
        let (owned, shared) = self.ids();
        debug!("event=accessible_lists_cancel module=sync status=ok owned_id={owned} shared_id={shared}");
    }
}

/// Live view of every list `user` owns or is a member of.
///
/// `sink` receives the full merged set on every tick of either source,
/// starting with the owned snapshot delivered during subscription.
pub fn watch_accessible_lists<R, S>(
    repo: &R,
    user: &SessionUser,
    sink: S,
) -> RepoResult<AccessibleListsSubscription>
where
    R: ListRepository,
    S: Fn(Vec<TodoList>) + Send + Sync + 'static,
{
    let state = Arc::new(Mutex::new(MergeState::default()));
    let sink = Arc::new(sink);

    let owned = repo.watch_owned_lists(&user.id, merge_sink(&state, &sink, Source::Owned))?;
    let shared = repo.watch_shared_lists(&user.email, merge_sink(&state, &sink, Source::Shared))?;

    debug!(
        "event=accessible_lists_watch module=sync status=ok owned_id={} shared_id={}",
        owned.id(),
        shared.id()
    );
    Ok(AccessibleListsSubscription { owned, shared })
}

fn merge_sink<S>(
    state: &Arc<Mutex<MergeState>>,
    sink: &Arc<S>,
    source: Source,
) -> impl Fn(Vec<TodoList>) + Send + Sync + 'static
where
    S: Fn(Vec<TodoList>) + Send + Sync + 'static,
{
    let state = Arc::clone(state);
    let sink = Arc::clone(sink);
    move |lists| {
        let mut guard = lock_ignoring_poison(&state);
        let merged = guard.apply(source, lists);
        if !guard.outbox.push(merged) {
            return;
        }
        // The lock is released around each call so the sink may write to the store.
        drain_outbox(
            &*state,
            guard,
            |state: &mut MergeState| &mut state.outbox,
            |merged| sink(merged),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{merge_lists, MergeState, Source};
    use crate::model::list::{Role, TodoList};
    use crate::model::user::{NormalizedEmail, UserId};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn list(title: &str, created_at: i64) -> TodoList {
        let owner = NormalizedEmail::parse("owner@x.com").unwrap();
        let mut members = BTreeMap::new();
        members.insert(owner.clone(), Role::Admin);
        TodoList::from_parts(
            Uuid::new_v4(),
            title.to_string(),
            UserId::new("u1"),
            owner,
            members,
            created_at,
        )
    }

    #[test]
    fn merge_deduplicates_regardless_of_source_order() {
        let a = list("A", 3);
        let b = list("B", 2);
        let c = list("C", 1);

        let forward = merge_lists(&[a.clone(), b.clone()], &[b.clone(), c.clone()]);
        let backward = merge_lists(&[b.clone(), c.clone()], &[a.clone(), b.clone()]);

        let titles: Vec<_> = forward.iter().map(|list| list.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn shared_copy_wins_on_conflict() {
        let owned = list("Old title", 1);
        let mut shared = owned.clone();
        shared.title = "New title".to_string();

        let merged = merge_lists(&[owned], &[shared]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "New title");
    }

    #[test]
    fn state_emits_on_first_tick_of_either_source() {
        let mut state = MergeState::default();
        let merged = state.apply(Source::Owned, vec![list("A", 1)]);
        assert_eq!(merged.len(), 1);

        let merged = state.apply(Source::Shared, vec![list("B", 2)]);
        let titles: Vec<_> = merged.iter().map(|list| list.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);

        let merged = state.apply(Source::Owned, Vec::new());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "B");
    }
}
