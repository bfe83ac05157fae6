//! The synchronization core of the Mosaic client: every independently
//! fetched list the app renders is cached here, and every user action is
//! applied optimistically through one coordinator so the change shows up in
//! each list that holds the item, instantly, with rollback on remote
//! failure.

pub mod chat;
pub mod consts;
mod error;
pub mod feed;
pub mod mock;
pub mod search;
pub mod service;
pub mod time;

pub use error::*;

use chat::{conversation::Conversation, typing::TypingWatcher};
use feed::{actions::FeedActions, loader::FeedLoader, store::FeedStore, visibility::ViewTracker};
use metrics::ClientMetricTx;
use search::SearchDebouncer;
use service::{ContentService, MessageService};
use types::ids::{ConversationId, UserId};

/// One signed-in app session. Owns the feed cache and every engine
/// component; created at login, cleared at logout. Components are reached
/// through this handle rather than through globals, so the whole state has
/// an explicit lifecycle.
pub struct Session<S> {
    viewer: UserId,
    service: S,
    store: FeedStore,
    feeds: FeedLoader<S>,
    actions: FeedActions<S>,
    search: SearchDebouncer<S>,
    views: ViewTracker<S>,
    typing: TypingWatcher<S>,
}

impl<S> Session<S>
where
    S: ContentService + MessageService + Clone + Send + Sync + 'static,
{
    pub fn new(service: S, viewer: UserId) -> Self {
        Self::with_metrics(service, viewer, ClientMetricTx::mock())
    }

    pub fn with_metrics(service: S, viewer: UserId, metrics: ClientMetricTx) -> Self {
        let store = FeedStore::new();
        Self {
            viewer,
            store: store.clone(),
            feeds: FeedLoader::new(store.clone(), service.clone(), viewer),
            actions: FeedActions::new(store.clone(), service.clone(), viewer, metrics.clone()),
            search: SearchDebouncer::new(store.clone(), service.clone(), viewer),
            views: ViewTracker::new(service.clone(), viewer, metrics),
            typing: TypingWatcher::new(service.clone()),
            service,
        }
    }

    pub fn viewer(&self) -> UserId {
        self.viewer
    }

    pub fn store(&self) -> &FeedStore {
        &self.store
    }

    pub fn feeds(&self) -> &FeedLoader<S> {
        &self.feeds
    }

    pub fn actions(&self) -> &FeedActions<S> {
        &self.actions
    }

    pub fn search(&self) -> &SearchDebouncer<S> {
        &self.search
    }

    pub fn views(&self) -> &ViewTracker<S> {
        &self.views
    }

    pub fn typing(&self) -> &TypingWatcher<S> {
        &self.typing
    }

    /// Opens a conversation backed by this session's service handle.
    pub fn conversation(&self, id: ConversationId, peer: UserId) -> Conversation<S> {
        Conversation::new(id, peer, self.viewer, self.service.clone())
    }

    /// Logout: drops every cached list and cancels all scheduled work.
    pub fn clear(&self) {
        self.search.cancel_pending();
        self.views.reset();
        self.typing.stop_all();
        self.store.clear();
    }
}
