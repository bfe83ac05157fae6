use std::{error::Error, future::Future, hash::Hash};

use serde::{Deserialize, Serialize};
use types::{
    feed::{FeedItem, FeedName},
    ids::{ConversationId, MessageId, PostId, UserId},
    message::Message,
    user::UserSummary,
};
use uuid::Uuid;

/// Globally unique key for the given type.
pub trait Keyed {
    type Key: Eq + Hash + 'static;

    fn key(&self) -> Self::Key;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Report,
    NotInterested,
    ShowMore,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Report => "report",
            FeedbackKind::NotInterested => "not_interested",
            FeedbackKind::ShowMore => "show_more",
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct BookmarkOutcome {
    pub bookmarked: bool,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct RepostOutcome {
    pub reposted: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PinOutcome {
    pub pinned: bool,
    /// Human-readable confirmation from the backend, shown as a toast.
    pub message: String,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PageDirection {
    Older,
    Newer,
}

#[derive(Clone, Debug, Default)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub has_more: bool,
}

/// Everything the feed side of the app needs from the backend.
pub trait ContentService {
    type Error: Error + Send + Sync + 'static;

    fn fetch_feed(
        &self,
        feed: FeedName,
        viewer: UserId,
        query: Option<&str>,
    ) -> impl Future<Output = Result<Vec<FeedItem>, Self::Error>> + Send;

    fn search_users(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<UserSummary>, Self::Error>> + Send;

    fn toggle_like(
        &self,
        viewer: UserId,
        post: PostId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn toggle_bookmark(
        &self,
        viewer: UserId,
        post: PostId,
    ) -> impl Future<Output = Result<BookmarkOutcome, Self::Error>> + Send;

    fn toggle_repost(
        &self,
        viewer: UserId,
        post: PostId,
    ) -> impl Future<Output = Result<RepostOutcome, Self::Error>> + Send;

    fn toggle_pin(
        &self,
        post: PostId,
    ) -> impl Future<Output = Result<PinOutcome, Self::Error>> + Send;

    fn delete_post(&self, post: PostId) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn send_feedback(
        &self,
        post: PostId,
        kind: FeedbackKind,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Fire-and-forget; callers log failures and move on.
    fn mark_viewed(
        &self,
        post: PostId,
        viewer: UserId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Everything the messaging side of the app needs from the backend.
pub trait MessageService {
    type Error: Error + Send + Sync + 'static;

    fn fetch_page(
        &self,
        conversation: ConversationId,
        direction: PageDirection,
        cursor: Option<MessageId>,
        limit: usize,
    ) -> impl Future<Output = Result<MessagePage, Self::Error>> + Send;

    /// `client_id` is echoed back on the confirmed message so the sender can
    /// reconcile it with the optimistic copy.
    fn send_message(
        &self,
        conversation: ConversationId,
        body: &str,
        reply_to: Option<MessageId>,
        client_id: Uuid,
    ) -> impl Future<Output = Result<Message, Self::Error>> + Send;

    fn edit_message(
        &self,
        id: MessageId,
        body: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn unsend_message(&self, id: MessageId)
        -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn add_reaction(
        &self,
        id: MessageId,
        emoji: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn remove_reaction(
        &self,
        id: MessageId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn mark_read(
        &self,
        conversation: ConversationId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn get_typing(&self, peer: UserId) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
