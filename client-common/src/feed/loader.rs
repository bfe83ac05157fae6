use std::sync::Mutex;

use tokio::time::Instant;
use types::{
    feed::{FeedItem, FeedName},
    ids::UserId,
};

use crate::{
    consts::{
        FEEDBACK_PROMPT_COOLDOWN, FEED_FETCH_TIMEOUT, SUGGESTED_USERS_INDEX,
        SUGGESTED_USERS_MIN_ITEMS,
    },
    error::{Error, Result},
    feed::store::FeedStore,
    service::ContentService,
};

/// Fetches feeds into the store. A populated feed is served from cache until
/// a refresh is forced; a failed fetch leaves whatever the feed previously
/// held.
pub struct FeedLoader<S> {
    store: FeedStore,
    service: S,
    viewer: UserId,
    last_feedback_prompt: Mutex<Option<Instant>>,
}

impl<S: ContentService> FeedLoader<S> {
    pub fn new(store: FeedStore, service: S, viewer: UserId) -> Self {
        Self {
            store,
            service,
            viewer,
            last_feedback_prompt: Mutex::new(None),
        }
    }

    pub async fn load(&self, feed: FeedName, refresh: bool) -> Result<()> {
        if !refresh && !self.store.snapshot(feed).items.is_empty() {
            self.store.set_loading(feed, false);
            return Ok(());
        }

        self.store.set_loading(feed, true);
        let fetched = tokio::time::timeout(
            FEED_FETCH_TIMEOUT,
            self.service.fetch_feed(feed, self.viewer, None),
        )
        .await;

        let items = match fetched {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => {
                self.store.set_loading(feed, false);
                log::warn!("failed to load {feed}: {e}");
                return Err(Error::remote(e));
            }
            Err(_) => {
                self.store.set_loading(feed, false);
                log::warn!("loading {feed} timed out");
                return Err(Error::Timeout);
            }
        };

        let items = if feed == FeedName::Trend {
            self.inject_synthetic_cards(items)
        } else {
            items
        };
        self.store.set_items(feed, items);
        Ok(())
    }

    pub async fn refresh(&self, feed: FeedName) -> Result<()> {
        self.load(feed, true).await
    }

    fn inject_synthetic_cards(&self, mut items: Vec<FeedItem>) -> Vec<FeedItem> {
        if items.len() >= SUGGESTED_USERS_MIN_ITEMS {
            let at = SUGGESTED_USERS_INDEX.min(items.len());
            items.insert(at, FeedItem::SuggestedUsers);
        }

        let mut last = self.last_feedback_prompt.lock().unwrap();
        let cooled = last.map_or(true, |at| at.elapsed() >= FEEDBACK_PROMPT_COOLDOWN);
        if cooled {
            // prompt next to the most recent post that asked for feedback
            let slot = items
                .iter()
                .rposition(|item| item.as_post().is_some_and(|p| p.request_feedback));
            if let Some(pos) = slot {
                let target = items[pos]
                    .as_post()
                    .map(|p| p.id)
                    .expect("slot is a post");
                items.insert(pos + 1, FeedItem::FeedbackPrompt { target });
                *last = Some(Instant::now());
            }
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use types::{feed::ItemKey, ids::PostId};

    use super::*;
    use crate::mock::{ContentCall, MockContentService, test_post};

    fn posts(ids: impl IntoIterator<Item = u64>) -> Vec<FeedItem> {
        ids.into_iter().map(|id| FeedItem::Post(test_post(id))).collect()
    }

    #[tokio::test]
    async fn populated_feed_is_served_from_cache() {
        let service = MockContentService::new();
        service.set_feed(FeedName::Book, posts([1, 2]));
        let store = FeedStore::new();
        let loader = FeedLoader::new(store.clone(), service.clone(), UserId(9));

        loader.load(FeedName::Book, false).await.unwrap();
        loader.load(FeedName::Book, false).await.unwrap();

        let fetches = service
            .calls()
            .into_iter()
            .filter(|c| matches!(c, ContentCall::FetchFeed(FeedName::Book, _)))
            .count();
        assert_eq!(fetches, 1);
        assert_eq!(store.items(FeedName::Book).len(), 2);
    }

    #[tokio::test]
    async fn refresh_always_refetches() {
        let service = MockContentService::new();
        service.set_feed(FeedName::Music, posts([1]));
        let store = FeedStore::new();
        let loader = FeedLoader::new(store.clone(), service.clone(), UserId(9));

        loader.load(FeedName::Music, false).await.unwrap();
        service.set_feed(FeedName::Music, posts([1, 2, 3]));
        loader.refresh(FeedName::Music).await.unwrap();

        assert_eq!(store.items(FeedName::Music).len(), 3);
    }

    #[tokio::test]
    async fn failure_keeps_prior_content_and_clears_loading() {
        let service = MockContentService::new();
        service.set_feed(FeedName::Movie, posts([1, 2]));
        let store = FeedStore::new();
        let loader = FeedLoader::new(store.clone(), service.clone(), UserId(9));

        loader.load(FeedName::Movie, false).await.unwrap();
        service.fail_requests(true);
        assert!(loader.refresh(FeedName::Movie).await.is_err());

        assert_eq!(store.items(FeedName::Movie).len(), 2);
        assert!(!store.is_loading(FeedName::Movie));
    }

    #[tokio::test]
    async fn one_failing_feed_does_not_poison_the_others() {
        let service = MockContentService::new();
        service.set_feed(FeedName::Book, posts([1]));
        let store = FeedStore::new();
        let loader = FeedLoader::new(store.clone(), service.clone(), UserId(9));
        loader.load(FeedName::Book, false).await.unwrap();

        service.fail_requests(true);
        assert!(loader.load(FeedName::Movie, false).await.is_err());

        assert_eq!(store.items(FeedName::Book).len(), 1);
        assert!(store.items(FeedName::Movie).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_fetch_times_out_as_a_failure() {
        let service = MockContentService::new();
        service.set_feed(FeedName::Trend, posts([1]));
        service.delay_responses(Some(FEED_FETCH_TIMEOUT + Duration::from_secs(5)));
        let store = FeedStore::new();
        let loader = FeedLoader::new(store.clone(), service.clone(), UserId(9));

        let res = loader.load(FeedName::Trend, false).await;
        assert!(matches!(res, Err(Error::Timeout)));
        assert!(!store.is_loading(FeedName::Trend));
    }

    #[tokio::test]
    async fn suggested_users_block_is_injected_into_large_trend_feeds() {
        let service = MockContentService::new();
        service.set_feed(FeedName::Trend, posts([1, 2, 3, 4, 5, 6]));
        let store = FeedStore::new();
        let loader = FeedLoader::new(store.clone(), service.clone(), UserId(9));

        loader.load(FeedName::Trend, false).await.unwrap();

        let items = store.items(FeedName::Trend);
        assert_eq!(items[SUGGESTED_USERS_INDEX], FeedItem::SuggestedUsers);
        assert_eq!(items.len(), 7);
    }

    #[tokio::test]
    async fn short_trend_feeds_get_no_suggested_users() {
        let service = MockContentService::new();
        service.set_feed(FeedName::Trend, posts([1, 2]));
        let store = FeedStore::new();
        let loader = FeedLoader::new(store.clone(), service.clone(), UserId(9));

        loader.load(FeedName::Trend, false).await.unwrap();

        assert!(!store
            .items(FeedName::Trend)
            .iter()
            .any(|i| matches!(i, FeedItem::SuggestedUsers)));
    }

    #[tokio::test(start_paused = true)]
    async fn feedback_prompt_is_rate_limited_per_session() {
        let service = MockContentService::new();
        let mut wants_feedback = test_post(3);
        wants_feedback.request_feedback = true;
        service.set_feed(
            FeedName::Trend,
            vec![
                FeedItem::Post(test_post(1)),
                FeedItem::Post(test_post(2)),
                FeedItem::Post(wants_feedback),
            ],
        );
        let store = FeedStore::new();
        let loader = FeedLoader::new(store.clone(), service.clone(), UserId(9));

        loader.load(FeedName::Trend, false).await.unwrap();
        let prompts = |items: &[FeedItem]| {
            items
                .iter()
                .filter(|i| i.key() == ItemKey::FeedbackPrompt(PostId(3)))
                .count()
        };
        assert_eq!(prompts(&store.items(FeedName::Trend)), 1);

        // immediately refreshing must not re-inject
        loader.refresh(FeedName::Trend).await.unwrap();
        assert_eq!(prompts(&store.items(FeedName::Trend)), 0);

        // after the cooldown it may
        tokio::time::advance(FEEDBACK_PROMPT_COOLDOWN).await;
        loader.refresh(FeedName::Trend).await.unwrap();
        assert_eq!(prompts(&store.items(FeedName::Trend)), 1);
    }
}
