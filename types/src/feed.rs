use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    ids::{PostId, UserId},
    post::PostDetails,
    user::UserSummary,
};

/// Key identifying one independently cached, ordered list of content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedName {
    Trend,
    Following,
    Movie,
    Book,
    Music,
    Saved,
    SearchResults,
}

impl FeedName {
    pub const ALL: [FeedName; 7] = [
        FeedName::Trend,
        FeedName::Following,
        FeedName::Movie,
        FeedName::Book,
        FeedName::Music,
        FeedName::Saved,
        FeedName::SearchResults,
    ];
}

impl fmt::Display for FeedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeedName::Trend => "trend",
            FeedName::Following => "following",
            FeedName::Movie => "movie",
            FeedName::Book => "book",
            FeedName::Music => "music",
            FeedName::Saved => "saved",
            FeedName::SearchResults => "search_results",
        };
        f.write_str(name)
    }
}

/// Identity of an item within a feed. Unique per list.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ItemKey {
    Post(PostId),
    User(UserId),
    SuggestedUsers,
    FeedbackPrompt(PostId),
}

/// One unit rendered in a feed. Posts and user cards come from the backend;
/// the remaining variants are injected client-side.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedItem {
    Post(PostDetails),
    User(UserSummary),
    SuggestedUsers,
    FeedbackPrompt { target: PostId },
}

impl FeedItem {
    pub fn key(&self) -> ItemKey {
        match self {
            FeedItem::Post(p) => ItemKey::Post(p.id),
            FeedItem::User(u) => ItemKey::User(u.id),
            FeedItem::SuggestedUsers => ItemKey::SuggestedUsers,
            FeedItem::FeedbackPrompt { target } => ItemKey::FeedbackPrompt(*target),
        }
    }

    pub fn as_post(&self) -> Option<&PostDetails> {
        match self {
            FeedItem::Post(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_post_mut(&mut self) -> Option<&mut PostDetails> {
        match self {
            FeedItem::Post(p) => Some(p),
            _ => None,
        }
    }
}
