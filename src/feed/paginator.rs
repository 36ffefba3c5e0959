use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::api::{FeedApi, FeedSource, PostsPage};
use crate::app::{MurmurError, Result};
use crate::config::FeedConfig;
use crate::domain::{FeedItem, PollState, PostEdit, ReactionKind, UniqueId};
use crate::feed::events::{FeedEvent, FeedEvents, Notification};
use crate::feed::merge::{merge_incoming, MergePolicy};
use crate::feed::request_state::{Operation, RequestState, RequestTracker};

/// Every id fetched this session, in the order first seen, plus whether the
/// server may still have more.
#[derive(Debug, Clone)]
pub struct FetchCursor {
    order: Vec<UniqueId>,
    seen: HashSet<UniqueId>,
    has_more: bool,
}

impl Default for FetchCursor {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            seen: HashSet::new(),
            has_more: true,
        }
    }
}

impl FetchCursor {
    pub fn ids(&self) -> &[UniqueId] {
        &self.order
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Returns true if the id had not been seen before.
    pub fn record(&mut self, id: UniqueId) -> bool {
        if self.seen.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    fn exhaust(&mut self) {
        self.has_more = false;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    /// A page arrived; `items` are the ones not seen before, newest first
    Loaded { items: Vec<FeedItem>, has_more: bool },
    /// Another fetch was already running; nothing was requested
    InFlight,
    /// The server already reported the end of the feed; nothing was requested
    Exhausted,
    /// The response arrived after shutdown and was dropped
    Discarded,
}

#[derive(Default)]
struct FeedState {
    items: Vec<FeedItem>,
    cursor: FetchCursor,
    polls: PollState,
    requests: RequestTracker,
    generation: u64,
}

impl FeedState {
    fn position(&self, id: UniqueId) -> Option<usize> {
        self.items.iter().position(|item| item.unique_id() == id)
    }

    fn find_mut(&mut self, id: UniqueId) -> Option<&mut FeedItem> {
        self.items.iter_mut().find(|item| item.unique_id() == id)
    }
}

/// Clears the loading flag when the fetch finishes, fails or is dropped.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Incrementally loaded, de-duplicated feed with optimistic mutations.
///
/// Share it behind an [`Arc`]; every method takes `&self`. List state sits
/// behind one mutex that is never held across a server call.
pub struct FeedPaginator {
    api: Arc<dyn FeedApi + Send + Sync>,
    source: FeedSource,
    policy: MergePolicy,
    rollback_on_error: bool,
    state: Mutex<FeedState>,
    loading: AtomicBool,
    closed: AtomicBool,
    events: FeedEvents,
}

impl FeedPaginator {
    pub fn new(api: Arc<dyn FeedApi + Send + Sync>, source: FeedSource, config: &FeedConfig) -> Self {
        let policy = MergePolicy {
            promote_recent_own: source.promotes_recent_own(),
            recent_own_window: config.recent_own_window(),
        };

        Self {
            api,
            source,
            policy,
            rollback_on_error: config.rollback_on_error,
            state: Mutex::new(FeedState::default()),
            loading: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            events: FeedEvents::new(config.event_capacity),
        }
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn report(&self, context: &str, err: &MurmurError) {
        error!("{}: {}", context, err);
        self.events.notify(Notification::error(err.user_message()));
    }

    pub fn source(&self) -> FeedSource {
        self.source
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    pub fn items(&self) -> Vec<FeedItem> {
        self.state().items.clone()
    }

    pub fn get(&self, id: UniqueId) -> Option<FeedItem> {
        let state = self.state();
        state.position(id).map(|index| state.items[index].clone())
    }

    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_more(&self) -> bool {
        self.state().cursor.has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn fetched_ids(&self) -> Vec<UniqueId> {
        self.state().cursor.ids().to_vec()
    }

    pub fn poll_selection(&self, id: UniqueId) -> Option<u32> {
        self.state().polls.selection(&id)
    }

    pub fn request_state(&self, id: UniqueId, op: Operation) -> RequestState {
        self.state().requests.state(id, op)
    }

    /// Load the next page, sending every id fetched so far as the exclusion
    /// list. A page with no unseen ids ends the feed for good (until
    /// [`refresh`](Self::refresh)).
    ///
    /// If a refresh happens while the request is out, the stale page is
    /// dropped and the first page of the new session is requested instead.
    pub async fn fetch_next_page(&self) -> Result<FetchOutcome> {
        if self.is_closed() {
            return Ok(FetchOutcome::Discarded);
        }

        let Some(_guard) = LoadingGuard::acquire(&self.loading) else {
            debug!("Fetch already in flight, skipping");
            return Ok(FetchOutcome::InFlight);
        };

        loop {
            let (exclude, generation) = {
                let state = self.state();
                if !state.cursor.has_more() {
                    return Ok(FetchOutcome::Exhausted);
                }
                (state.cursor.ids().to_vec(), state.generation)
            };

            debug!("Fetching {:?} page, excluding {} ids", self.source, exclude.len());

            let page = match self.api.fetch_posts(self.source, &exclude).await {
                Ok(page) => page,
                Err(e) => {
                    self.report("Error fetching posts", &e);
                    return Err(e);
                }
            };

            if self.is_closed() {
                debug!("Dropping page that arrived after shutdown");
                return Ok(FetchOutcome::Discarded);
            }

            let Some((fresh, has_more)) = self.apply_page(page, generation) else {
                debug!("Dropping page that arrived after a refresh, fetching again");
                continue;
            };

            if !has_more {
                info!("No new posts, feed exhausted");
                self.events.publish(FeedEvent::Exhausted);
                return Ok(FetchOutcome::Loaded {
                    items: Vec::new(),
                    has_more: false,
                });
            }

            info!("Loaded {} new posts", fresh.len());
            self.events.publish(FeedEvent::PageLoaded {
                added: fresh.len(),
                has_more: true,
            });

            return Ok(FetchOutcome::Loaded {
                items: fresh,
                has_more: true,
            });
        }
    }

    /// Record a page's ids and merge its unseen items, returning them along
    /// with whether the feed may have more. `None` if the page belongs to an
    /// earlier generation.
    fn apply_page(&self, page: PostsPage, generation: u64) -> Option<(Vec<FeedItem>, bool)> {
        let mut state = self.state();
        if state.generation != generation {
            return None;
        }

        let mut new_ids = page
            .rejected
            .iter()
            .filter(|id| state.cursor.record(**id))
            .count();

        let mut fresh = Vec::new();
        for item in page.items {
            if state.cursor.record(item.unique_id()) {
                new_ids += 1;
                fresh.push(item);
            }
        }

        if new_ids == 0 {
            state.cursor.exhaust();
            return Some((fresh, false));
        }

        fresh.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let existing = std::mem::take(&mut state.items);
        state.items = merge_incoming(existing, fresh.clone(), Utc::now(), &self.policy);
        Some((fresh, true))
    }

    /// Drop everything fetched so far and load the first page again.
    ///
    /// When a fetch is already running it picks up the new session itself;
    /// this call then reports [`FetchOutcome::InFlight`].
    pub async fn refresh(&self) -> Result<FetchOutcome> {
        {
            let mut state = self.state();
            state.items.clear();
            state.cursor.reset();
            state.polls.clear();
            state.requests.clear();
            state.generation += 1;
        }
        self.events.publish(FeedEvent::Refreshed);

        self.fetch_next_page().await
    }

    /// Replace the whole list, e.g. after another view edited posts.
    pub fn replace_items(&self, items: Vec<FeedItem>) {
        let count = {
            let mut state = self.state();
            let mut seen = HashSet::new();
            let items: Vec<FeedItem> = items
                .into_iter()
                .filter(|item| seen.insert(item.unique_id()))
                .collect();
            for item in &items {
                state.cursor.record(item.unique_id());
            }
            state.items = items;
            state.items.len()
        };

        self.events.publish(FeedEvent::Replaced { count });
    }

    /// Stop applying server responses. Requests already on the wire still
    /// complete but their results are ignored.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Toggle the current user's reaction, applying it locally before the
    /// server answers.
    pub async fn toggle_reaction(&self, id: UniqueId, kind: ReactionKind) -> Result<FeedItem> {
        let (previous, optimistic, generation) = {
            let mut state = self.state();
            let generation = state.generation;
            let item = state
                .find_mut(id)
                .ok_or_else(|| MurmurError::ItemNotFound(id.to_string()))?;

            let previous = item.reactions.clone();
            let transition = item.reactions.toggle(kind);
            debug!("Reaction on {}: {:?}", id, transition);
            let optimistic = item.clone();

            state.requests.begin(id, Operation::Reaction);
            (previous, optimistic, generation)
        };
        self.events.publish(FeedEvent::ItemUpdated(id));

        let result = self.api.react(id, kind).await;

        if self.is_closed() {
            return result.map(|_| optimistic);
        }

        match result {
            Ok(snapshot) => {
                let updated = {
                    let mut state = self.state();
                    if state.generation != generation {
                        None
                    } else {
                        state.requests.finish(id, Operation::Reaction, None);
                        match (snapshot, state.find_mut(id)) {
                            (Some(summary), Some(item)) => {
                                item.reactions = summary;
                                Some(item.clone())
                            }
                            (None, Some(item)) => Some(item.clone()),
                            (_, None) => None,
                        }
                    }
                };

                match updated {
                    Some(item) => {
                        self.events.publish(FeedEvent::ItemUpdated(id));
                        Ok(item)
                    }
                    None => Ok(optimistic),
                }
            }
            Err(e) => {
                let reverted = {
                    let mut state = self.state();
                    if state.generation != generation {
                        false
                    } else {
                        state
                            .requests
                            .finish(id, Operation::Reaction, Some(e.user_message()));
                        match state.find_mut(id) {
                            // Only undo if nothing changed the reactions since
                            Some(item)
                                if self.rollback_on_error
                                    && item.reactions == optimistic.reactions =>
                            {
                                item.reactions = previous;
                                true
                            }
                            _ => false,
                        }
                    }
                };

                if reverted {
                    warn!("Reverted reaction on {}", id);
                    self.events.publish(FeedEvent::ItemUpdated(id));
                }
                self.report("Error updating reaction", &e);
                Err(e)
            }
        }
    }

    /// Remove an item locally, then delete it on the server.
    pub async fn delete_item(&self, id: UniqueId) -> Result<()> {
        let (index, removed, generation) = {
            let mut state = self.state();
            if state.requests.is_pending(id, Operation::Delete) {
                return Err(MurmurError::RequestPending(id.to_string()));
            }
            let index = state
                .position(id)
                .ok_or_else(|| MurmurError::ItemNotFound(id.to_string()))?;
            let removed = state.items.remove(index);
            state.requests.begin(id, Operation::Delete);
            (index, removed, state.generation)
        };
        self.events.publish(FeedEvent::ItemRemoved(id));

        let result = self.api.delete_post(id).await;

        if self.is_closed() {
            return result;
        }

        match result {
            Ok(()) => {
                {
                    let mut state = self.state();
                    if state.generation == generation {
                        state.requests.finish(id, Operation::Delete, None);
                        state.polls.forget(&id);
                    }
                }
                info!("Deleted {}", id);
                self.events
                    .notify(Notification::success("Post deleted successfully!"));
                Ok(())
            }
            Err(e) => {
                let restored = {
                    let mut state = self.state();
                    if state.generation != generation {
                        false
                    } else {
                        state
                            .requests
                            .finish(id, Operation::Delete, Some(e.user_message()));
                        if self.rollback_on_error && state.position(id).is_none() {
                            let index = index.min(state.items.len());
                            state.items.insert(index, removed);
                            true
                        } else {
                            false
                        }
                    }
                };

                if restored {
                    warn!("Restored {} after failed delete", id);
                    self.events.publish(FeedEvent::ItemRestored(id));
                }
                self.report("Error deleting post", &e);
                Err(e)
            }
        }
    }

    /// Edit a page post. The edit is checked locally first and only written
    /// into the list once the server accepts it.
    pub async fn edit_item(&self, id: UniqueId, edit: PostEdit) -> Result<FeedItem> {
        let (checked, mut edited, generation) = {
            let mut state = self.state();
            if state.requests.is_pending(id, Operation::Edit) {
                return Err(MurmurError::RequestPending(id.to_string()));
            }
            let index = state
                .position(id)
                .ok_or_else(|| MurmurError::ItemNotFound(id.to_string()))?;
            let item = state.items[index].clone();

            let checked = match edit.check(&item) {
                Ok(checked) => checked,
                Err(e) => {
                    drop(state);
                    let err = MurmurError::from(e);
                    self.report("Rejected post edit", &err);
                    return Err(err);
                }
            };

            state.requests.begin(id, Operation::Edit);
            (checked, item, state.generation)
        };
        checked.apply(&mut edited);

        let result = self.api.update_post(&checked).await;

        if self.is_closed() {
            return result.map(|_| edited);
        }

        let applied = {
            let mut state = self.state();
            if state.generation != generation {
                None
            } else {
                let error = result.as_ref().err().map(MurmurError::user_message);
                state.requests.finish(id, Operation::Edit, error);

                match (&result, state.find_mut(id)) {
                    (Ok(()), Some(item)) => {
                        checked.apply(item);
                        let item = item.clone();
                        if checked.poll.is_some() {
                            state.polls.forget(&id);
                        }
                        Some(item)
                    }
                    _ => None,
                }
            }
        };

        match result {
            Ok(()) => {
                info!("Updated {}", id);
                if applied.is_some() {
                    self.events.publish(FeedEvent::ItemUpdated(id));
                }
                self.events
                    .notify(Notification::success("Post updated successfully!"));
                Ok(applied.unwrap_or(edited))
            }
            Err(e) => {
                self.report("Error updating post", &e);
                Err(e)
            }
        }
    }

    /// Flip an item's saved flag locally, then take the server's value.
    pub async fn toggle_saved(&self, id: UniqueId) -> Result<bool> {
        let (previous, generation) = {
            let mut state = self.state();
            let generation = state.generation;
            let item = state
                .find_mut(id)
                .ok_or_else(|| MurmurError::ItemNotFound(id.to_string()))?;
            let previous = item.is_saved;
            item.is_saved = !previous;
            state.requests.begin(id, Operation::Save);
            (previous, generation)
        };
        self.events.publish(FeedEvent::ItemUpdated(id));

        let result = self.api.toggle_saved(id).await;

        if self.is_closed() {
            return result;
        }

        let changed = {
            let mut state = self.state();
            if state.generation != generation {
                false
            } else {
                let error = result.as_ref().err().map(MurmurError::user_message);
                state.requests.finish(id, Operation::Save, error);

                match (&result, state.find_mut(id)) {
                    (Ok(saved), Some(item)) => {
                        let changed = item.is_saved != *saved;
                        item.is_saved = *saved;
                        changed
                    }
                    (Err(_), Some(item)) if self.rollback_on_error && item.is_saved != previous => {
                        item.is_saved = previous;
                        true
                    }
                    _ => false,
                }
            }
        };

        if changed {
            self.events.publish(FeedEvent::ItemUpdated(id));
        }
        if let Err(e) = &result {
            self.report("Error saving post", e);
        }
        result
    }

    /// Load a single post by numeric id, as a shared link does. If the post
    /// is already in the list its copy is replaced with the server's.
    pub async fn open_shared(&self, post_id: i64) -> Result<FeedItem> {
        let generation = self.state().generation;

        let item = match self.api.fetch_post(post_id).await {
            Ok(item) => item,
            Err(e) => {
                self.report("Error fetching post", &e);
                return Err(e);
            }
        };

        if self.is_closed() {
            return Ok(item);
        }

        let id = item.unique_id();
        let replaced = {
            let mut state = self.state();
            if state.generation != generation {
                false
            } else if let Some(existing) = state.find_mut(id) {
                *existing = item.clone();
                true
            } else {
                false
            }
        };

        if replaced {
            self.events.publish(FeedEvent::ItemUpdated(id));
        }
        Ok(item)
    }

    /// Bump the comment count after a comment was posted on an item.
    pub fn record_comment(&self, id: UniqueId) -> Result<u32> {
        let count = {
            let mut state = self.state();
            let item = state
                .find_mut(id)
                .ok_or_else(|| MurmurError::ItemNotFound(id.to_string()))?;
            item.comment_count = item.comment_count.saturating_add(1);
            item.comment_count
        };

        self.events.publish(FeedEvent::ItemUpdated(id));
        Ok(count)
    }

    /// Remember the user's poll choice. Local only.
    pub fn vote_poll(&self, id: UniqueId, option_id: u32) -> Result<()> {
        {
            let mut state = self.state();
            let index = state
                .position(id)
                .ok_or_else(|| MurmurError::ItemNotFound(id.to_string()))?;
            let poll = state.items[index]
                .poll()
                .ok_or_else(|| MurmurError::Validation(format!("{} is not a poll", id)))?;
            if poll.option(option_id).is_none() {
                return Err(MurmurError::Validation(format!(
                    "{} has no option {}",
                    id, option_id
                )));
            }
            state.polls.select(id, option_id);
        }

        self.events.publish(FeedEvent::ItemUpdated(id));
        Ok(())
    }
}
