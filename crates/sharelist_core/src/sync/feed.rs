//! Session-driven accessible-lists feed.
//!
//! # Invariants
//! - At most one merged subscription is open at a time.
//! - The previous subscription is cancelled before a new one opens.
//! - Signing out emits exactly one empty list set.

use crate::identity::{AuthEvent, IdentityProvider, SessionUser};
use crate::model::list::TodoList;
use crate::repo::list_repo::{ListRepository, RepoResult};
use crate::sync::merge::{watch_accessible_lists, AccessibleListsSubscription};
use log::info;
use std::sync::Arc;

type ListsSink = Arc<dyn Fn(Vec<TodoList>) + Send + Sync>;

/// Keeps one merged list view in step with the signed-in user.
pub struct AccessibleListsFeed<R: ListRepository> {
    repo: R,
    sink: ListsSink,
    active: Option<(SessionUser, AccessibleListsSubscription)>,
}

impl<R: ListRepository> AccessibleListsFeed<R> {
    /// Creates an idle feed; nothing is emitted until the first event.
    pub fn new<S>(repo: R, sink: S) -> Self
    where
        S: Fn(Vec<TodoList>) + Send + Sync + 'static,
    {
        Self {
            repo,
            sink: Arc::new(sink),
            active: None,
        }
    }

    /// User the feed currently follows.
    pub fn current_user(&self) -> Option<&SessionUser> {
        self.active.as_ref().map(|(user, _)| user)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Applies one sign-in state transition.
    pub fn handle(&mut self, event: AuthEvent) -> RepoResult<()> {
        // Cancel first so the old user's listeners never outlive the switch.
        self.active = None;

        match event {
            AuthEvent::SignedIn(user) => {
                let sink = Arc::clone(&self.sink);
                let subscription =
                    watch_accessible_lists(&self.repo, &user, move |lists| sink(lists))?;
                info!("event=lists_feed_sign_in module=sync status=ok user_id={}", user.id);
                self.active = Some((user, subscription));
            }
            AuthEvent::SignedOut => {
                info!("event=lists_feed_sign_out module=sync status=ok");
                (self.sink)(Vec::new());
            }
        }
        Ok(())
    }

    /// Re-reads the provider's current session and applies it.
    pub fn sync_with<P: IdentityProvider + ?Sized>(&mut self, provider: &P) -> RepoResult<()> {
        self.handle(AuthEvent::from_session(provider.current_user()))
    }
}
