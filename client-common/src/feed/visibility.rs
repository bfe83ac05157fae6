use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use metrics::{metrics::post_viewed::PostViewed, ClientMetricTx};
use tokio::task::JoinHandle;
use types::{
    ids::{PostId, UserId},
    post::PostDetails,
};

use crate::{consts::VIEW_DWELL_THRESHOLD, service::ContentService};

/// Watches which posts are on screen and reports each one as viewed exactly
/// once per session, after it has stayed visible for the dwell threshold.
/// Reposts are tracked under their canonical interaction id, so a repost and
/// its original count once between them.
pub struct ViewTracker<S> {
    service: S,
    viewer: UserId,
    metrics: ClientMetricTx,
    visible: Arc<RwLock<HashSet<PostId>>>,
    viewed: Arc<RwLock<HashSet<PostId>>>,
    pending: Arc<Mutex<HashMap<PostId, JoinHandle<()>>>>,
}

impl<S> ViewTracker<S>
where
    S: ContentService + Clone + Send + Sync + 'static,
{
    pub fn new(service: S, viewer: UserId, metrics: ClientMetricTx) -> Self {
        Self {
            service,
            viewer,
            metrics,
            visible: Arc::default(),
            viewed: Arc::default(),
            pending: Arc::default(),
        }
    }

    /// Reports the full set of currently visible posts. Newly visible posts
    /// get a dwell timer; posts gone before their timer fires are forgotten
    /// without side effect.
    pub fn on_visibility_changed<'a>(&self, posts: impl IntoIterator<Item = &'a PostDetails>) {
        let now: HashSet<PostId> = posts.into_iter().map(|p| p.interaction_id()).collect();

        let mut pending = self.pending.lock().unwrap();
        let previous = {
            let mut visible = self.visible.write().unwrap();
            std::mem::replace(&mut *visible, now.clone())
        };

        pending.retain(|id, task| {
            if now.contains(id) {
                true
            } else {
                task.abort();
                false
            }
        });

        for id in now {
            if previous.contains(&id) || pending.contains_key(&id) {
                continue;
            }
            if self.viewed.read().unwrap().contains(&id) {
                continue;
            }
            pending.insert(id, self.spawn_dwell(id));
        }
    }

    pub fn has_viewed(&self, id: PostId) -> bool {
        self.viewed.read().unwrap().contains(&id)
    }

    /// Cancels every pending dwell timer and forgets the visible set. The
    /// viewed set is per-session and survives.
    pub fn reset(&self) {
        for (_, task) in self.pending.lock().unwrap().drain() {
            task.abort();
        }
        self.visible.write().unwrap().clear();
    }

    fn spawn_dwell(&self, id: PostId) -> JoinHandle<()> {
        let service = self.service.clone();
        let viewer = self.viewer;
        let metrics = self.metrics.clone();
        let visible = Arc::clone(&self.visible);
        let viewed = Arc::clone(&self.viewed);
        let pending = Arc::clone(&self.pending);

        tokio::spawn(async move {
            tokio::time::sleep(VIEW_DWELL_THRESHOLD).await;
            pending.lock().unwrap().remove(&id);
            if !visible.read().unwrap().contains(&id) {
                return;
            }
            if !viewed.write().unwrap().insert(id) {
                return;
            }

            if let Err(e) = service.mark_viewed(id, viewer).await {
                log::debug!("mark_viewed for post {id} failed: {e}");
            }
            let ev = PostViewed {
                post_id: id,
                user_id: viewer,
            };
            if let Err(e) = metrics.push(ev).await {
                log::debug!("failed to push post_viewed event: {e}");
            }
        })
    }
}

impl<S> Drop for ViewTracker<S> {
    fn drop(&mut self) {
        for (_, task) in self.pending.lock().unwrap().drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use types::post::Repost;

    use super::*;
    use crate::mock::{ContentCall, MockContentService, test_post};

    fn tracker(service: &MockContentService) -> ViewTracker<MockContentService> {
        ViewTracker::new(service.clone(), UserId(9), ClientMetricTx::mock())
    }

    fn mark_viewed_calls(service: &MockContentService) -> Vec<PostId> {
        service
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                ContentCall::MarkViewed(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn dwell_complete_marks_viewed_once() {
        let service = MockContentService::new();
        let tracker = tracker(&service);
        let post = test_post(1);

        tracker.on_visibility_changed([&post]);
        tokio::time::sleep(VIEW_DWELL_THRESHOLD + Duration::from_millis(100)).await;

        // stays visible across further updates; must not re-fire
        tracker.on_visibility_changed([&post]);
        tracker.on_visibility_changed(std::iter::empty());
        tracker.on_visibility_changed([&post]);
        tokio::time::sleep(VIEW_DWELL_THRESHOLD * 2).await;

        assert_eq!(mark_viewed_calls(&service), vec![PostId(1)]);
        assert!(tracker.has_viewed(PostId(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn leaving_the_viewport_cancels_the_timer() {
        let service = MockContentService::new();
        let tracker = tracker(&service);
        let post = test_post(1);

        tracker.on_visibility_changed([&post]);
        tokio::time::sleep(VIEW_DWELL_THRESHOLD / 2).await;
        tracker.on_visibility_changed(std::iter::empty());
        tokio::time::sleep(VIEW_DWELL_THRESHOLD * 2).await;

        assert!(mark_viewed_calls(&service).is_empty());
        assert!(!tracker.has_viewed(PostId(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn repost_and_original_count_once() {
        let service = MockContentService::new();
        let tracker = tracker(&service);

        let mut repost = test_post(10);
        repost.repost = Some(Repost {
            quote: false,
            original: Box::new(test_post(3)),
        });
        tracker.on_visibility_changed([&repost]);
        tokio::time::sleep(VIEW_DWELL_THRESHOLD * 2).await;

        // later the original itself scrolls into view
        let original = test_post(3);
        tracker.on_visibility_changed([&original]);
        tokio::time::sleep(VIEW_DWELL_THRESHOLD * 2).await;

        assert_eq!(mark_viewed_calls(&service), vec![PostId(3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_swallowed_but_still_count_as_viewed() {
        let service = MockContentService::new();
        service.fail_requests(true);
        let tracker = tracker(&service);
        let post = test_post(1);

        tracker.on_visibility_changed([&post]);
        tokio::time::sleep(VIEW_DWELL_THRESHOLD * 2).await;

        assert!(tracker.has_viewed(PostId(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_pending_timers() {
        let service = MockContentService::new();
        let tracker = tracker(&service);
        let post = test_post(1);

        tracker.on_visibility_changed([&post]);
        tracker.reset();
        tokio::time::sleep(VIEW_DWELL_THRESHOLD * 2).await;

        assert!(mark_viewed_calls(&service).is_empty());
    }
}
