use metrics::{metrics::post_liked::PostLiked, ClientMetricTx};
use types::{
    feed::ItemKey,
    ids::{PostId, UserId},
    post::PostDetails,
};

use crate::{
    error::{Error, Result},
    feed::store::{FeedStore, MutationRecord},
    service::{ContentService, FeedbackKind, PinOutcome},
};

/// Single-item actions with "apply locally now, confirm remotely, roll back
/// on failure" semantics. Every action resolves its target through the
/// canonical interaction id, so a plain repost and its original move
/// together wherever either appears.
///
/// There is no per-item mutex: overlapping actions each capture and restore
/// their own snapshot.
pub struct FeedActions<S> {
    store: FeedStore,
    service: S,
    viewer: UserId,
    metrics: ClientMetricTx,
}

impl<S: ContentService> FeedActions<S> {
    pub fn new(store: FeedStore, service: S, viewer: UserId, metrics: ClientMetricTx) -> Self {
        Self {
            store,
            service,
            viewer,
            metrics,
        }
    }

    fn capture_post(&self, target: PostId) -> MutationRecord {
        self.store
            .capture_where(|item| item.as_post().is_some_and(|p| p.mentions(target)))
    }

    fn apply_post(&self, target: PostId, f: impl Fn(&mut PostDetails)) {
        self.store.update_all(|item| {
            if let Some(post) = item.as_post_mut() {
                post.apply_to(target, &mut |p| f(p));
            }
        });
    }

    pub async fn toggle_like(&self, item: &PostDetails) -> Result<()> {
        let target = item.interaction_id();
        let snapshot = self.capture_post(target);
        let liked = !item.interaction_target().is_liked;
        self.apply_post(target, |p| {
            p.is_liked = liked;
            p.like_count = if liked {
                p.like_count + 1
            } else {
                p.like_count.saturating_sub(1)
            };
        });

        if let Err(e) = self.service.toggle_like(self.viewer, target).await {
            self.store.restore(snapshot);
            return Err(Error::remote(e));
        }

        if liked {
            let original = item.interaction_target();
            let ev = PostLiked {
                post_id: target,
                publisher_id: original.author.id,
                user_id: self.viewer,
                like_count: original.like_count + 1,
                is_repost: item.is_plain_repost(),
            };
            if let Err(e) = self.metrics.push(ev).await {
                log::debug!("failed to push post_liked event: {e}");
            }
        }

        Ok(())
    }

    pub async fn toggle_save(&self, item: &PostDetails) -> Result<bool> {
        let target = item.interaction_id();
        let snapshot = self.capture_post(target);
        let saved = !item.interaction_target().is_saved;
        self.apply_post(target, |p| p.is_saved = saved);

        match self.service.toggle_bookmark(self.viewer, target).await {
            Ok(outcome) => Ok(outcome.bookmarked),
            Err(e) => {
                self.store.restore(snapshot);
                Err(Error::remote(e))
            }
        }
    }

    pub async fn toggle_repost(&self, item: &PostDetails) -> Result<()> {
        let target = item.interaction_id();
        let snapshot = self.capture_post(target);
        let reposted = !item.interaction_target().is_reposted;
        self.apply_post(target, |p| {
            p.is_reposted = reposted;
            p.repost_count = if reposted {
                p.repost_count + 1
            } else {
                p.repost_count.saturating_sub(1)
            };
        });

        if let Err(e) = self.service.toggle_repost(self.viewer, target).await {
            self.store.restore(snapshot);
            return Err(Error::remote(e));
        }
        Ok(())
    }

    pub async fn toggle_pin(&self, item: &PostDetails) -> Result<PinOutcome> {
        let target = item.interaction_id();
        let snapshot = self.capture_post(target);
        let pinned = !item.interaction_target().is_pinned;
        self.apply_post(target, |p| p.is_pinned = pinned);

        match self.service.toggle_pin(target).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.store.restore(snapshot);
                Err(Error::remote(e))
            }
        }
    }

    /// Deletes the rendered item itself; a repost deletes the repost, not
    /// its original.
    pub async fn delete(&self, post: PostId) -> Result<()> {
        let snapshot = self
            .store
            .capture_where(|item| item.as_post().is_some_and(|p| p.id == post));
        self.store
            .remove_where(|item| item.as_post().is_some_and(|p| p.id == post));

        if let Err(e) = self.service.delete_post(post).await {
            self.store.restore(snapshot);
            return Err(Error::remote(e));
        }
        Ok(())
    }

    /// Report and not-interested hide the item immediately; show-more only
    /// talks to the backend.
    pub async fn send_feedback(&self, item: &PostDetails, kind: FeedbackKind) -> Result<()> {
        let target = item.interaction_id();
        let key = ItemKey::Post(item.id);
        let snapshot = match kind {
            FeedbackKind::Report | FeedbackKind::NotInterested => {
                let snap = self.store.capture_where(|it| it.key() == key);
                self.store.remove_where(|it| it.key() == key);
                Some(snap)
            }
            FeedbackKind::ShowMore => None,
        };

        if let Err(e) = self.service.send_feedback(target, kind).await {
            if let Some(snap) = snapshot {
                self.store.restore(snap);
            }
            return Err(Error::remote(e));
        }
        Ok(())
    }

    /// Answer coming from the injected feedback card. The card goes away
    /// either way; an undelivered answer is logged only.
    pub async fn answer_feedback_prompt(&self, target: PostId, interested: bool) {
        self.dismiss_feedback_prompt(target);
        let kind = if interested {
            FeedbackKind::ShowMore
        } else {
            FeedbackKind::NotInterested
        };
        if let Err(e) = self.service.send_feedback(target, kind).await {
            log::warn!("feedback for post {target} was not delivered: {e}");
        }
    }

    pub fn dismiss_feedback_prompt(&self, target: PostId) {
        self.store
            .remove_where(|item| item.key() == ItemKey::FeedbackPrompt(target));
    }
}
