//! Programmable in-memory backends. The default wiring in development
//! builds, and the doubles every engine test runs against.

use std::{
    collections::{HashMap, VecDeque},
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};

use thiserror::Error;
use types::{
    feed::{FeedItem, FeedName},
    ids::{ConversationId, MessageId, PostId, UserId},
    message::Message,
    post::PostDetails,
    user::UserSummary,
};
use uuid::Uuid;

use crate::{
    service::{
        BookmarkOutcome, ContentService, FeedbackKind, MessagePage, MessageService, PageDirection,
        PinOutcome, RepostOutcome,
    },
    time::current_epoch,
};

#[derive(Debug, Error)]
#[error("mock backend failure")]
pub struct MockError;

#[derive(Clone, PartialEq, Debug)]
pub enum ContentCall {
    FetchFeed(FeedName, Option<String>),
    SearchUsers(String),
    ToggleLike(PostId),
    ToggleBookmark(PostId),
    ToggleRepost(PostId),
    TogglePin(PostId),
    DeletePost(PostId),
    SendFeedback(PostId, FeedbackKind),
    MarkViewed(PostId),
}

#[derive(Default)]
struct ContentInner {
    feeds: HashMap<FeedName, Vec<FeedItem>>,
    users: Vec<UserSummary>,
    fail: bool,
    delay: Option<Duration>,
    calls: Vec<ContentCall>,
}

#[derive(Clone, Default)]
pub struct MockContentService {
    inner: Arc<Mutex<ContentInner>>,
}

impl MockContentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_feed(&self, feed: FeedName, items: Vec<FeedItem>) {
        self.inner.lock().unwrap().feeds.insert(feed, items);
    }

    pub fn set_users(&self, users: Vec<UserSummary>) {
        self.inner.lock().unwrap().users = users;
    }

    /// Makes every subsequent request fail until reset.
    pub fn fail_requests(&self, fail: bool) {
        self.inner.lock().unwrap().fail = fail;
    }

    /// Delays every subsequent response, for in-flight interleaving tests.
    pub fn delay_responses(&self, delay: Option<Duration>) {
        self.inner.lock().unwrap().delay = delay;
    }

    pub fn calls(&self) -> Vec<ContentCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    async fn begin(&self, call: ContentCall) -> Result<(), MockError> {
        let (fail, delay) = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(call);
            (inner.fail, inner.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            Err(MockError)
        } else {
            Ok(())
        }
    }
}

impl ContentService for MockContentService {
    type Error = MockError;

    async fn fetch_feed(
        &self,
        feed: FeedName,
        _viewer: UserId,
        query: Option<&str>,
    ) -> Result<Vec<FeedItem>, MockError> {
        self.begin(ContentCall::FetchFeed(feed, query.map(str::to_owned)))
            .await?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .feeds
            .get(&feed)
            .cloned()
            .unwrap_or_default())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>, MockError> {
        self.begin(ContentCall::SearchUsers(query.to_owned())).await?;
        Ok(self.inner.lock().unwrap().users.clone())
    }

    async fn toggle_like(&self, _viewer: UserId, post: PostId) -> Result<(), MockError> {
        self.begin(ContentCall::ToggleLike(post)).await
    }

    async fn toggle_bookmark(
        &self,
        _viewer: UserId,
        post: PostId,
    ) -> Result<BookmarkOutcome, MockError> {
        self.begin(ContentCall::ToggleBookmark(post)).await?;
        Ok(BookmarkOutcome { bookmarked: true })
    }

    async fn toggle_repost(
        &self,
        _viewer: UserId,
        post: PostId,
    ) -> Result<RepostOutcome, MockError> {
        self.begin(ContentCall::ToggleRepost(post)).await?;
        Ok(RepostOutcome { reposted: true })
    }

    async fn toggle_pin(&self, post: PostId) -> Result<PinOutcome, MockError> {
        self.begin(ContentCall::TogglePin(post)).await?;
        Ok(PinOutcome {
            pinned: true,
            message: "pinned".to_owned(),
        })
    }

    async fn delete_post(&self, post: PostId) -> Result<(), MockError> {
        self.begin(ContentCall::DeletePost(post)).await
    }

    async fn send_feedback(&self, post: PostId, kind: FeedbackKind) -> Result<(), MockError> {
        self.begin(ContentCall::SendFeedback(post, kind)).await
    }

    async fn mark_viewed(&self, post: PostId, _viewer: UserId) -> Result<(), MockError> {
        self.begin(ContentCall::MarkViewed(post)).await
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum MessageCall {
    FetchPage(PageDirection, Option<MessageId>),
    Send(String),
    Edit(MessageId, String),
    Unsend(MessageId),
    AddReaction(MessageId, String),
    RemoveReaction(MessageId),
    MarkRead,
    GetTyping(UserId),
}

struct MessageInner {
    older: VecDeque<MessagePage>,
    newer: VecDeque<MessagePage>,
    typing: HashMap<UserId, bool>,
    sender: UserId,
    next_server_id: u64,
    fail: bool,
    delay: Option<Duration>,
    calls: Vec<MessageCall>,
}

impl Default for MessageInner {
    fn default() -> Self {
        Self {
            older: VecDeque::new(),
            newer: VecDeque::new(),
            typing: HashMap::new(),
            sender: UserId(0),
            next_server_id: 1000,
            fail: false,
            delay: None,
            calls: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockMessageService {
    inner: Arc<Mutex<MessageInner>>,
}

impl MockMessageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the next page served for `direction`. Pages are consumed in
    /// order; an unscripted fetch gets an empty page.
    pub fn push_page(&self, direction: PageDirection, page: MessagePage) {
        let mut inner = self.inner.lock().unwrap();
        match direction {
            PageDirection::Older => inner.older.push_back(page),
            PageDirection::Newer => inner.newer.push_back(page),
        }
    }

    pub fn set_typing(&self, peer: UserId, typing: bool) {
        self.inner.lock().unwrap().typing.insert(peer, typing);
    }

    /// Sender id stamped onto confirmed messages.
    pub fn set_sender(&self, sender: UserId) {
        self.inner.lock().unwrap().sender = sender;
    }

    pub fn fail_requests(&self, fail: bool) {
        self.inner.lock().unwrap().fail = fail;
    }

    pub fn delay_responses(&self, delay: Option<Duration>) {
        self.inner.lock().unwrap().delay = delay;
    }

    pub fn calls(&self) -> Vec<MessageCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    async fn begin(&self, call: MessageCall) -> Result<(), MockError> {
        let (fail, delay) = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(call);
            (inner.fail, inner.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            Err(MockError)
        } else {
            Ok(())
        }
    }
}

impl MessageService for MockMessageService {
    type Error = MockError;

    async fn fetch_page(
        &self,
        _conversation: ConversationId,
        direction: PageDirection,
        cursor: Option<MessageId>,
        _limit: usize,
    ) -> Result<MessagePage, MockError> {
        self.begin(MessageCall::FetchPage(direction, cursor)).await?;
        let mut inner = self.inner.lock().unwrap();
        let queue = match direction {
            PageDirection::Older => &mut inner.older,
            PageDirection::Newer => &mut inner.newer,
        };
        Ok(queue.pop_front().unwrap_or_default())
    }

    async fn send_message(
        &self,
        _conversation: ConversationId,
        body: &str,
        reply_to: Option<MessageId>,
        client_id: Uuid,
    ) -> Result<Message, MockError> {
        self.begin(MessageCall::Send(body.to_owned())).await?;
        let mut inner = self.inner.lock().unwrap();
        inner.next_server_id += 1;
        Ok(Message {
            client_id,
            id: Some(MessageId(inner.next_server_id)),
            sender_id: inner.sender,
            receiver_id: UserId(0),
            body: body.to_owned(),
            created_at: current_epoch(),
            is_read: false,
            reply_to: reply_to.map(|id| types::message::ReplyRef {
                id,
                username: String::new(),
                excerpt: String::new(),
            }),
            reactions: Vec::new(),
        })
    }

    async fn edit_message(&self, id: MessageId, body: &str) -> Result<(), MockError> {
        self.begin(MessageCall::Edit(id, body.to_owned())).await
    }

    async fn unsend_message(&self, id: MessageId) -> Result<(), MockError> {
        self.begin(MessageCall::Unsend(id)).await
    }

    async fn add_reaction(&self, id: MessageId, emoji: &str) -> Result<(), MockError> {
        self.begin(MessageCall::AddReaction(id, emoji.to_owned()))
            .await
    }

    async fn remove_reaction(&self, id: MessageId) -> Result<(), MockError> {
        self.begin(MessageCall::RemoveReaction(id)).await
    }

    async fn mark_read(&self, _conversation: ConversationId) -> Result<(), MockError> {
        self.begin(MessageCall::MarkRead).await
    }

    async fn get_typing(&self, peer: UserId) -> Result<bool, MockError> {
        self.begin(MessageCall::GetTyping(peer)).await?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .typing
            .get(&peer)
            .copied()
            .unwrap_or(false))
    }
}

/// Both halves of the backend behind one handle, for wiring a full
/// [`Session`](crate::Session) without a network.
#[derive(Clone, Default)]
pub struct MockBackend {
    pub content: MockContentService,
    pub messages: MockMessageService,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentService for MockBackend {
    type Error = MockError;

    fn fetch_feed(
        &self,
        feed: FeedName,
        viewer: UserId,
        query: Option<&str>,
    ) -> impl Future<Output = Result<Vec<FeedItem>, MockError>> + Send {
        self.content.fetch_feed(feed, viewer, query)
    }

    fn search_users(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<UserSummary>, MockError>> + Send {
        self.content.search_users(query)
    }

    fn toggle_like(
        &self,
        viewer: UserId,
        post: PostId,
    ) -> impl Future<Output = Result<(), MockError>> + Send {
        self.content.toggle_like(viewer, post)
    }

    fn toggle_bookmark(
        &self,
        viewer: UserId,
        post: PostId,
    ) -> impl Future<Output = Result<BookmarkOutcome, MockError>> + Send {
        self.content.toggle_bookmark(viewer, post)
    }

    fn toggle_repost(
        &self,
        viewer: UserId,
        post: PostId,
    ) -> impl Future<Output = Result<RepostOutcome, MockError>> + Send {
        self.content.toggle_repost(viewer, post)
    }

    fn toggle_pin(
        &self,
        post: PostId,
    ) -> impl Future<Output = Result<PinOutcome, MockError>> + Send {
        self.content.toggle_pin(post)
    }

    fn delete_post(&self, post: PostId) -> impl Future<Output = Result<(), MockError>> + Send {
        self.content.delete_post(post)
    }

    fn send_feedback(
        &self,
        post: PostId,
        kind: FeedbackKind,
    ) -> impl Future<Output = Result<(), MockError>> + Send {
        self.content.send_feedback(post, kind)
    }

    fn mark_viewed(
        &self,
        post: PostId,
        viewer: UserId,
    ) -> impl Future<Output = Result<(), MockError>> + Send {
        self.content.mark_viewed(post, viewer)
    }
}

impl MessageService for MockBackend {
    type Error = MockError;

    fn fetch_page(
        &self,
        conversation: ConversationId,
        direction: PageDirection,
        cursor: Option<MessageId>,
        limit: usize,
    ) -> impl Future<Output = Result<MessagePage, MockError>> + Send {
        self.messages.fetch_page(conversation, direction, cursor, limit)
    }

    fn send_message(
        &self,
        conversation: ConversationId,
        body: &str,
        reply_to: Option<MessageId>,
        client_id: Uuid,
    ) -> impl Future<Output = Result<Message, MockError>> + Send {
        self.messages
            .send_message(conversation, body, reply_to, client_id)
    }

    fn edit_message(
        &self,
        id: MessageId,
        body: &str,
    ) -> impl Future<Output = Result<(), MockError>> + Send {
        self.messages.edit_message(id, body)
    }

    fn unsend_message(&self, id: MessageId) -> impl Future<Output = Result<(), MockError>> + Send {
        self.messages.unsend_message(id)
    }

    fn add_reaction(
        &self,
        id: MessageId,
        emoji: &str,
    ) -> impl Future<Output = Result<(), MockError>> + Send {
        self.messages.add_reaction(id, emoji)
    }

    fn remove_reaction(&self, id: MessageId) -> impl Future<Output = Result<(), MockError>> + Send {
        self.messages.remove_reaction(id)
    }

    fn mark_read(
        &self,
        conversation: ConversationId,
    ) -> impl Future<Output = Result<(), MockError>> + Send {
        self.messages.mark_read(conversation)
    }

    fn get_typing(&self, peer: UserId) -> impl Future<Output = Result<bool, MockError>> + Send {
        self.messages.get_typing(peer)
    }
}

/// Minimal post fixture.
pub fn test_post(id: u64) -> PostDetails {
    PostDetails {
        id: PostId(id),
        author: test_user(1),
        body: format!("post {id}"),
        like_count: 0,
        is_liked: false,
        is_saved: false,
        repost_count: 0,
        is_reposted: false,
        is_pinned: false,
        request_feedback: false,
        created_at: web_time::Duration::from_secs(id),
        repost: None,
    }
}

pub fn test_user(id: u64) -> UserSummary {
    UserSummary {
        id: UserId(id),
        username: format!("user{id}"),
        display_name: None,
        avatar_url: None,
    }
}

/// Confirmed-message fixture with server id `id`.
pub fn test_message(id: u64) -> Message {
    Message {
        client_id: Uuid::new_v4(),
        id: Some(MessageId(id)),
        sender_id: UserId(2),
        receiver_id: UserId(9),
        body: format!("message {id}"),
        created_at: web_time::Duration::from_secs(id),
        is_read: false,
        reply_to: None,
        reactions: Vec::new(),
    }
}
