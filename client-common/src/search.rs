use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use tokio::task::JoinHandle;
use types::{
    feed::{FeedItem, FeedName},
    ids::UserId,
};

use crate::{consts::SEARCH_DEBOUNCE, feed::store::FeedStore, service::ContentService};

/// Coalesces a fast-changing query into one delayed backend call. Each
/// keystroke supersedes the scheduled call before it; a response whose
/// generation is no longer current is discarded, so results can never
/// flicker back to an earlier keystroke.
pub struct SearchDebouncer<S> {
    store: FeedStore,
    service: S,
    viewer: UserId,
    generation: Arc<AtomicU64>,
    scheduled: Mutex<Option<JoinHandle<()>>>,
}

impl<S> SearchDebouncer<S>
where
    S: ContentService + Clone + Send + Sync + 'static,
{
    pub fn new(store: FeedStore, service: S, viewer: UserId) -> Self {
        Self {
            store,
            service,
            viewer,
            generation: Arc::new(AtomicU64::new(0)),
            scheduled: Mutex::new(None),
        }
    }

    /// Called on every keystroke. An empty query clears the results
    /// synchronously and never reaches the backend.
    pub fn on_query_change(&self, query: &str) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = self.scheduled.lock().unwrap().take() {
            previous.abort();
        }

        let query = query.trim().to_owned();
        if query.is_empty() {
            self.store.set_items(FeedName::SearchResults, Vec::new());
            return;
        }

        let store = self.store.clone();
        let service = self.service.clone();
        let viewer = self.viewer;
        let current = Arc::clone(&self.generation);

        let task = tokio::spawn(async move {
            tokio::time::sleep(SEARCH_DEBOUNCE).await;
            if current.load(Ordering::SeqCst) != generation {
                return;
            }

            store.set_loading(FeedName::SearchResults, true);
            let (posts, users) = futures_util::join!(
                service.fetch_feed(FeedName::SearchResults, viewer, Some(&query)),
                service.search_users(&query),
            );

            // a newer query may have landed while we were waiting
            if current.load(Ordering::SeqCst) != generation {
                return;
            }

            match (posts, users) {
                (Ok(posts), Ok(users)) => {
                    let mut merged: Vec<FeedItem> =
                        users.into_iter().map(FeedItem::User).collect();
                    merged.extend(posts);
                    store.set_items(FeedName::SearchResults, merged);
                }
                (posts, users) => {
                    if let Err(e) = posts {
                        log::warn!("post search for {query:?} failed: {e}");
                    }
                    if let Err(e) = users {
                        log::warn!("user search for {query:?} failed: {e}");
                    }
                    store.set_loading(FeedName::SearchResults, false);
                }
            }
        });
        *self.scheduled.lock().unwrap() = Some(task);
    }

    /// Cancels a scheduled-but-unsent query, e.g. on teardown.
    pub fn cancel_pending(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = self.scheduled.lock().unwrap().take() {
            previous.abort();
        }
    }
}

impl<S> Drop for SearchDebouncer<S> {
    fn drop(&mut self) {
        if let Some(previous) = self.scheduled.lock().unwrap().take() {
            previous.abort();
        }
    }
}
