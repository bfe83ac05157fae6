use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::{ids::PostId, user::UserSummary};

/// A repost embeds the full original so lists can render it (and mutations
/// can reach it) without a second fetch.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Repost {
    /// Quote reposts carry their own commentary and interact as themselves;
    /// plain reposts are a pointer and interact as the original.
    pub quote: bool,
    pub original: Box<PostDetails>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PostDetails {
    pub id: PostId,
    pub author: UserSummary,
    pub body: String,
    pub like_count: u64,
    pub is_liked: bool,
    pub is_saved: bool,
    pub repost_count: u64,
    pub is_reposted: bool,
    pub is_pinned: bool,
    /// Whether the backend asked the client to solicit feedback next to
    /// this post.
    pub request_feedback: bool,
    /// Seconds (as a duration) since the unix epoch.
    pub created_at: Duration,
    pub repost: Option<Repost>,
}

impl PartialOrd for PostDetails {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PostDetails {
    fn cmp(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl Hash for PostDetails {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PostDetails {
    pub fn is_plain_repost(&self) -> bool {
        self.repost.as_ref().is_some_and(|r| !r.quote)
    }

    /// The id a mutation should actually target: the original's id for a
    /// plain repost, the post's own id otherwise.
    pub fn interaction_id(&self) -> PostId {
        self.interaction_target().id
    }

    /// The post whose flags and counts back this item's rendered state.
    pub fn interaction_target(&self) -> &PostDetails {
        match &self.repost {
            Some(r) if !r.quote => &r.original,
            _ => self,
        }
    }

    /// Whether `target` is addressable from this item, either directly or
    /// through an embedded repost original.
    pub fn mentions(&self, target: PostId) -> bool {
        self.id == target || self.repost.as_ref().is_some_and(|r| r.original.id == target)
    }

    /// Applies `f` to every copy of `target` reachable from this item.
    /// Returns whether anything was touched.
    pub fn apply_to(&mut self, target: PostId, f: &mut impl FnMut(&mut PostDetails)) -> bool {
        let mut touched = false;
        if self.id == target {
            f(self);
            touched = true;
        }
        if let Some(repost) = &mut self.repost {
            if repost.original.id == target {
                f(&mut repost.original);
                touched = true;
            }
        }
        touched
    }
}
