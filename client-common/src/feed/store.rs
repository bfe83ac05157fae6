use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use types::feed::{FeedItem, FeedName};
use web_time::SystemTime;

/// Snapshot of one cached feed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CacheEntry {
    pub items: Vec<FeedItem>,
    pub loading: bool,
    pub last_fetched_at: Option<SystemTime>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FeedChange {
    /// One feed's items were replaced wholesale.
    Replaced(FeedName),
    Loading(FeedName),
    /// A broadcast touched every cached feed.
    Updated,
    Removed,
    Cleared,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(FeedChange) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

/// The one shared cache behind every feed the app renders. Each `FeedName`
/// owns an independent list; `update_all`/`remove_where` are the broadcast
/// primitives that keep an item's state consistent across every list that
/// happens to contain it, without knowing in advance which lists do.
///
/// All mutation is synchronous; subscribers are notified before the mutating
/// call returns.
#[derive(Clone, Default)]
pub struct FeedStore {
    feeds: Arc<RwLock<HashMap<FeedName, CacheEntry>>>,
    subscribers: Arc<RwLock<Subscribers>>,
}

/// Pre-mutation snapshot of every list entry an optimistic action touched,
/// with enough position information to restore removed entries verbatim.
#[derive(Clone, Debug, Default)]
pub struct MutationRecord {
    entries: Vec<(FeedName, usize, FeedItem)>,
}

impl MutationRecord {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot of a feed; an empty entry is created on first access.
    pub fn snapshot(&self, feed: FeedName) -> CacheEntry {
        let mut feeds = self.feeds.write().unwrap();
        feeds.entry(feed).or_default().clone()
    }

    pub fn items(&self, feed: FeedName) -> Vec<FeedItem> {
        self.snapshot(feed).items
    }

    pub fn is_loading(&self, feed: FeedName) -> bool {
        self.snapshot(feed).loading
    }

    /// Replaces the list wholesale, stamping the fetch time and clearing the
    /// loading flag.
    pub fn set_items(&self, feed: FeedName, items: Vec<FeedItem>) {
        {
            let mut feeds = self.feeds.write().unwrap();
            let entry = feeds.entry(feed).or_default();
            entry.items = items;
            entry.loading = false;
            entry.last_fetched_at = Some(SystemTime::now());
        }
        self.notify(FeedChange::Replaced(feed));
    }

    pub fn set_loading(&self, feed: FeedName, loading: bool) {
        {
            let mut feeds = self.feeds.write().unwrap();
            feeds.entry(feed).or_default().loading = loading;
        }
        self.notify(FeedChange::Loading(feed));
    }

    /// Applies `f` to every item of every cached feed, synchronously.
    pub fn update_all(&self, mut f: impl FnMut(&mut FeedItem)) {
        {
            let mut feeds = self.feeds.write().unwrap();
            for entry in feeds.values_mut() {
                for item in &mut entry.items {
                    f(item);
                }
            }
        }
        self.notify(FeedChange::Updated);
    }

    /// Removes matching items from every cached feed.
    pub fn remove_where(&self, mut pred: impl FnMut(&FeedItem) -> bool) {
        {
            let mut feeds = self.feeds.write().unwrap();
            for entry in feeds.values_mut() {
                entry.items.retain(|item| !pred(item));
            }
        }
        self.notify(FeedChange::Removed);
    }

    /// Clones every matching item, remembering which feed and position it
    /// came from.
    pub fn capture_where(&self, mut pred: impl FnMut(&FeedItem) -> bool) -> MutationRecord {
        let feeds = self.feeds.read().unwrap();
        let mut entries = Vec::new();
        for (feed, entry) in feeds.iter() {
            for (idx, item) in entry.items.iter().enumerate() {
                if pred(item) {
                    entries.push((*feed, idx, item.clone()));
                }
            }
        }
        MutationRecord { entries }
    }

    /// Puts captured items back: in place where the key still exists, at the
    /// captured index where it does not. Covers rollback of both field
    /// transforms and removals.
    pub fn restore(&self, record: MutationRecord) {
        {
            let mut feeds = self.feeds.write().unwrap();
            for (feed, idx, item) in record.entries {
                let entry = feeds.entry(feed).or_default();
                let key = item.key();
                match entry.items.iter().position(|it| it.key() == key) {
                    Some(pos) => entry.items[pos] = item,
                    None => {
                        let at = idx.min(entry.items.len());
                        entry.items.insert(at, item);
                    }
                }
            }
        }
        self.notify(FeedChange::Updated);
    }

    /// Drops every cached list. Called at logout.
    pub fn clear(&self) {
        self.feeds.write().unwrap().clear();
        self.notify(FeedChange::Cleared);
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(FeedChange) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut subs = self.subscribers.write().unwrap();
        subs.next_id += 1;
        let id = SubscriptionId(subs.next_id);
        subs.listeners.push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers
            .write()
            .unwrap()
            .listeners
            .retain(|(sid, _)| *sid != id);
    }

    fn notify(&self, change: FeedChange) {
        let listeners: Vec<Listener> = {
            let subs = self.subscribers.read().unwrap();
            subs.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use types::ids::PostId;

    use super::*;
    use crate::mock::test_post;

    #[test]
    fn first_access_creates_an_empty_entry() {
        let store = FeedStore::new();
        let entry = store.snapshot(FeedName::Trend);
        assert!(entry.items.is_empty());
        assert!(!entry.loading);
        assert!(entry.last_fetched_at.is_none());
    }

    #[test]
    fn update_all_reaches_every_feed() {
        let store = FeedStore::new();
        store.set_items(FeedName::Trend, vec![FeedItem::Post(test_post(42))]);
        store.set_items(
            FeedName::Following,
            vec![FeedItem::Post(test_post(1)), FeedItem::Post(test_post(42))],
        );

        store.update_all(|item| {
            if let Some(post) = item.as_post_mut() {
                post.apply_to(PostId(42), &mut |p| p.is_liked = true);
            }
        });

        for feed in [FeedName::Trend, FeedName::Following] {
            let liked = store
                .items(feed)
                .iter()
                .filter_map(|i| i.as_post().map(|p| (p.id, p.is_liked)))
                .collect::<Vec<_>>();
            assert!(liked.contains(&(PostId(42), true)), "{feed} not updated");
        }
        // the unrelated post is untouched
        assert!(store.items(FeedName::Following)[0]
            .as_post()
            .is_some_and(|p| !p.is_liked));
    }

    #[test]
    fn remove_where_removes_from_every_feed() {
        let store = FeedStore::new();
        store.set_items(
            FeedName::Movie,
            vec![FeedItem::Post(test_post(7)), FeedItem::Post(test_post(8))],
        );
        store.set_items(FeedName::Book, vec![FeedItem::Post(test_post(8))]);

        store.remove_where(|item| item.as_post().is_some_and(|p| p.id == PostId(7)));

        assert_eq!(store.items(FeedName::Movie).len(), 1);
        assert_eq!(store.items(FeedName::Book).len(), 1);
        for feed in FeedName::ALL {
            assert!(!store
                .items(feed)
                .iter()
                .any(|i| i.as_post().is_some_and(|p| p.id == PostId(7))));
        }
    }

    #[test]
    fn restore_reverts_a_transform_exactly() {
        let store = FeedStore::new();
        store.set_items(FeedName::Trend, vec![FeedItem::Post(test_post(1))]);
        let before = store.snapshot(FeedName::Trend);

        let record =
            store.capture_where(|item| item.as_post().is_some_and(|p| p.id == PostId(1)));
        store.update_all(|item| {
            if let Some(post) = item.as_post_mut() {
                post.is_liked = true;
                post.like_count = 99;
            }
        });
        store.restore(record);

        assert_eq!(store.snapshot(FeedName::Trend).items, before.items);
    }

    #[test]
    fn restore_reinserts_removed_items_at_their_position() {
        let store = FeedStore::new();
        store.set_items(
            FeedName::Trend,
            vec![
                FeedItem::Post(test_post(1)),
                FeedItem::Post(test_post(2)),
                FeedItem::Post(test_post(3)),
            ],
        );
        let before = store.items(FeedName::Trend);

        let record =
            store.capture_where(|item| item.as_post().is_some_and(|p| p.id == PostId(2)));
        store.remove_where(|item| item.as_post().is_some_and(|p| p.id == PostId(2)));
        assert_eq!(store.items(FeedName::Trend).len(), 2);

        store.restore(record);
        assert_eq!(store.items(FeedName::Trend), before);
    }

    #[test]
    fn subscribers_are_notified_synchronously_and_can_unsubscribe() {
        let store = FeedStore::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let sub = store.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        store.set_items(FeedName::Trend, vec![]);
        store.update_all(|_| {});
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        store.unsubscribe(sub);
        store.remove_where(|_| false);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clear_drops_every_feed() {
        let store = FeedStore::new();
        store.set_items(FeedName::Trend, vec![FeedItem::Post(test_post(1))]);
        store.set_items(FeedName::Saved, vec![FeedItem::Post(test_post(2))]);
        store.clear();
        for feed in FeedName::ALL {
            assert!(store.items(feed).is_empty());
        }
    }
}
