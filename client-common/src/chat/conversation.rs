use std::sync::{Arc, RwLock};

use thiserror::Error;
use types::{
    ids::{ConversationId, MessageId, UserId},
    message::{Message, Reaction, ReplyRef},
};
use uuid::Uuid;

use crate::{
    consts::CHAT_PAGE_SIZE,
    error::{Error as CoreError, Result},
    service::{Keyed, MessagePage, MessageService, PageDirection},
    time::current_epoch,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    LoadingInitial,
    Ready,
}

/// Snapshot of one conversation. Messages are strictly newest-first.
#[derive(Clone, Debug, Default)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub phase: LoadPhase,
    pub has_older: bool,
    pub has_newer: bool,
    pub loading_older: bool,
    pub loading_newer: bool,
}

#[derive(Debug, Error)]
#[error("message was not sent")]
pub struct SendError {
    /// The composed text, handed back so the input field can be refilled.
    pub body: String,
    #[source]
    pub source: CoreError,
}

/// One open conversation: a bidirectionally paginated, newest-first message
/// list with optimistic send/edit/unsend. Older and newer fetches run
/// independently; a duplicate trigger for a direction already in flight is a
/// no-op.
pub struct Conversation<S> {
    id: ConversationId,
    peer: UserId,
    viewer: UserId,
    service: S,
    page_size: usize,
    state: Arc<RwLock<ConversationState>>,
}

impl<S: Clone> Clone for Conversation<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            peer: self.peer,
            viewer: self.viewer,
            service: self.service.clone(),
            page_size: self.page_size,
            state: Arc::clone(&self.state),
        }
    }
}

fn contains(messages: &[Message], msg: &Message) -> bool {
    messages
        .iter()
        .any(|m| m.key() == msg.key() || (m.id.is_some() && m.id == msg.id))
}

impl<S: MessageService> Conversation<S> {
    pub fn new(id: ConversationId, peer: UserId, viewer: UserId, service: S) -> Self {
        Self::with_page_size(id, peer, viewer, service, CHAT_PAGE_SIZE)
    }

    pub fn with_page_size(
        id: ConversationId,
        peer: UserId,
        viewer: UserId,
        service: S,
        page_size: usize,
    ) -> Self {
        Self {
            id,
            peer,
            viewer,
            service,
            page_size,
            state: Arc::default(),
        }
    }

    pub fn peer(&self) -> UserId {
        self.peer
    }

    pub fn state(&self) -> ConversationState {
        self.state.read().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.read().unwrap().messages.clone()
    }

    fn end_reached(&self, page: &MessagePage) -> bool {
        page.messages.len() >= self.page_size && page.has_more
    }

    /// Fetches the newest page. On a `Ready` conversation this refreshes
    /// silently, keeping messages that are still awaiting confirmation.
    pub async fn load_initial(&self) -> Result<()> {
        self.first_page(None).await
    }

    /// Opens the conversation at a historical anchor (a search hit, a reply
    /// jump); everything since the anchor can then be paged in with
    /// `load_newer`.
    pub async fn load_initial_at(&self, anchor: MessageId) -> Result<()> {
        self.first_page(Some(anchor)).await
    }

    async fn first_page(&self, anchor: Option<MessageId>) -> Result<()> {
        {
            let mut st = self.state.write().unwrap();
            if st.phase == LoadPhase::LoadingInitial {
                return Ok(());
            }
            if st.phase == LoadPhase::Idle {
                st.phase = LoadPhase::LoadingInitial;
            }
        }

        let res = self
            .service
            .fetch_page(self.id, PageDirection::Older, anchor, self.page_size)
            .await;

        let mut st = self.state.write().unwrap();
        match res {
            Ok(page) => {
                let confirmed: Vec<Uuid> = page.messages.iter().map(|m| m.key()).collect();
                let mut messages: Vec<Message> = st
                    .messages
                    .iter()
                    .filter(|m| m.is_pending() && !confirmed.contains(&m.key()))
                    .cloned()
                    .collect();
                st.has_older = self.end_reached(&page);
                st.has_newer = anchor.is_some();
                messages.extend(page.messages);
                st.messages = messages;
                st.phase = LoadPhase::Ready;
                Ok(())
            }
            Err(e) => {
                if st.phase == LoadPhase::LoadingInitial {
                    st.phase = LoadPhase::Idle;
                }
                Err(CoreError::remote(e))
            }
        }
    }

    /// Appends the next page of history. No-op while a load-older is already
    /// in flight or when the history is exhausted.
    pub async fn load_older(&self) -> Result<()> {
        let cursor = {
            let mut st = self.state.write().unwrap();
            if st.phase != LoadPhase::Ready || !st.has_older || st.loading_older {
                return Ok(());
            }
            st.loading_older = true;
            st.messages.iter().rev().find_map(|m| m.id)
        };

        let res = self
            .service
            .fetch_page(self.id, PageDirection::Older, cursor, self.page_size)
            .await;

        let mut st = self.state.write().unwrap();
        st.loading_older = false;
        let page = match res {
            Ok(page) => page,
            Err(e) => return Err(CoreError::remote(e)),
        };
        st.has_older = self.end_reached(&page);
        for msg in page.messages {
            if !contains(&st.messages, &msg) {
                st.messages.push(msg);
            }
        }
        Ok(())
    }

    /// Prepends messages that arrived since the newest loaded one.
    pub async fn load_newer(&self) -> Result<()> {
        let cursor = {
            let mut st = self.state.write().unwrap();
            if st.phase != LoadPhase::Ready || !st.has_newer || st.loading_newer {
                return Ok(());
            }
            st.loading_newer = true;
            st.messages.iter().find_map(|m| m.id)
        };

        let res = self
            .service
            .fetch_page(self.id, PageDirection::Newer, cursor, self.page_size)
            .await;

        let mut st = self.state.write().unwrap();
        st.loading_newer = false;
        let page = match res {
            Ok(page) => page,
            Err(e) => return Err(CoreError::remote(e)),
        };
        st.has_newer = self.end_reached(&page);
        let fresh: Vec<Message> = page
            .messages
            .into_iter()
            .filter(|m| !contains(&st.messages, m))
            .collect();
        st.messages.splice(0..0, fresh);
        Ok(())
    }

    /// Renders the message immediately under a temporary client id; the
    /// confirmed message replaces it in place. On failure the message is
    /// withdrawn and the text comes back in the error.
    pub async fn send(
        &self,
        body: &str,
        reply_to: Option<ReplyRef>,
    ) -> std::result::Result<Message, SendError> {
        let client_id = Uuid::new_v4();
        let local = Message {
            client_id,
            id: None,
            sender_id: self.viewer,
            receiver_id: self.peer,
            body: body.to_owned(),
            created_at: current_epoch(),
            is_read: false,
            reply_to: reply_to.clone(),
            reactions: Vec::new(),
        };
        self.state.write().unwrap().messages.insert(0, local);

        let reply_to_id = reply_to.map(|r| r.id);
        match self
            .service
            .send_message(self.id, body, reply_to_id, client_id)
            .await
        {
            Ok(mut confirmed) => {
                confirmed.client_id = client_id;
                let mut st = self.state.write().unwrap();
                match st.messages.iter().position(|m| m.client_id == client_id) {
                    Some(pos) => st.messages[pos] = confirmed.clone(),
                    None => st.messages.insert(0, confirmed.clone()),
                }
                Ok(confirmed)
            }
            Err(e) => {
                let mut st = self.state.write().unwrap();
                st.messages.retain(|m| m.client_id != client_id);
                Err(SendError {
                    body: body.to_owned(),
                    source: CoreError::remote(e),
                })
            }
        }
    }

    pub async fn edit(&self, id: MessageId, body: &str) -> Result<()> {
        let snapshot = {
            let mut st = self.state.write().unwrap();
            let Some(pos) = st.messages.iter().position(|m| m.id == Some(id)) else {
                return Ok(());
            };
            let prev = st.messages[pos].clone();
            st.messages[pos].body = body.to_owned();
            (pos, prev)
        };

        if let Err(e) = self.service.edit_message(id, body).await {
            self.restore(snapshot);
            return Err(CoreError::remote(e));
        }
        Ok(())
    }

    pub async fn unsend(&self, id: MessageId) -> Result<()> {
        let snapshot = {
            let mut st = self.state.write().unwrap();
            let Some(pos) = st.messages.iter().position(|m| m.id == Some(id)) else {
                return Ok(());
            };
            let prev = st.messages.remove(pos);
            (pos, prev)
        };

        if let Err(e) = self.service.unsend_message(id).await {
            self.restore(snapshot);
            return Err(CoreError::remote(e));
        }
        Ok(())
    }

    /// One reaction per user per message; reacting again replaces it.
    pub async fn add_reaction(&self, id: MessageId, emoji: &str) -> Result<()> {
        let viewer = self.viewer;
        let snapshot = {
            let mut st = self.state.write().unwrap();
            let Some(pos) = st.messages.iter().position(|m| m.id == Some(id)) else {
                return Ok(());
            };
            let prev = st.messages[pos].clone();
            let msg = &mut st.messages[pos];
            msg.reactions.retain(|r| r.user_id != viewer);
            msg.reactions.push(Reaction {
                user_id: viewer,
                emoji: emoji.to_owned(),
            });
            (pos, prev)
        };

        if let Err(e) = self.service.add_reaction(id, emoji).await {
            self.restore(snapshot);
            return Err(CoreError::remote(e));
        }
        Ok(())
    }

    pub async fn remove_reaction(&self, id: MessageId) -> Result<()> {
        let viewer = self.viewer;
        let snapshot = {
            let mut st = self.state.write().unwrap();
            let Some(pos) = st.messages.iter().position(|m| m.id == Some(id)) else {
                return Ok(());
            };
            let prev = st.messages[pos].clone();
            st.messages[pos].reactions.retain(|r| r.user_id != viewer);
            (pos, prev)
        };

        if let Err(e) = self.service.remove_reaction(id).await {
            self.restore(snapshot);
            return Err(CoreError::remote(e));
        }
        Ok(())
    }

    /// Marks the peer's messages read locally; delivery failures are logged
    /// only.
    pub async fn mark_read(&self) {
        {
            let mut st = self.state.write().unwrap();
            for msg in &mut st.messages {
                if msg.sender_id == self.peer {
                    msg.is_read = true;
                }
            }
        }
        if let Err(e) = self.service.mark_read(self.id).await {
            log::debug!("mark_read for conversation {} failed: {e}", self.id);
        }
    }

    fn restore(&self, (pos, prev): (usize, Message)) {
        let mut st = self.state.write().unwrap();
        match st.messages.iter().position(|m| m.client_id == prev.client_id) {
            Some(cur) => st.messages[cur] = prev,
            None => {
                let at = pos.min(st.messages.len());
                st.messages.insert(at, prev);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::mock::{MessageCall, MockMessageService, test_message};

    const PAGE: usize = 5;

    fn conv(service: &MockMessageService) -> Conversation<MockMessageService> {
        service.set_sender(UserId(9));
        Conversation::with_page_size(ConversationId(1), UserId(2), UserId(9), service.clone(), PAGE)
    }

    fn server_ids(conv: &Conversation<MockMessageService>) -> Vec<u64> {
        conv.messages()
            .iter()
            .filter_map(|m| m.id.map(|id| id.0))
            .collect()
    }

    #[tokio::test]
    async fn initial_load_is_newest_first() {
        let service = MockMessageService::new();
        service.push_page(
            PageDirection::Older,
            MessagePage {
                messages: (1..=5).rev().map(test_message).collect(),
                has_more: true,
            },
        );
        let conv = conv(&service);

        conv.load_initial().await.unwrap();

        assert_eq!(server_ids(&conv), vec![5, 4, 3, 2, 1]);
        assert_eq!(conv.state().phase, LoadPhase::Ready);
        assert!(conv.state().has_older);
    }

    #[tokio::test]
    async fn load_older_appends_and_exhausts() {
        let service = MockMessageService::new();
        service.push_page(
            PageDirection::Older,
            MessagePage {
                messages: (1..=5).rev().map(test_message).collect(),
                has_more: true,
            },
        );
        service.push_page(
            PageDirection::Older,
            MessagePage {
                messages: vec![test_message(0)],
                has_more: false,
            },
        );
        let conv = conv(&service);
        conv.load_initial().await.unwrap();

        conv.load_older().await.unwrap();

        assert_eq!(server_ids(&conv), vec![5, 4, 3, 2, 1, 0]);
        assert!(!conv.state().has_older);

        // further triggers are no-ops
        conv.load_older().await.unwrap();
        assert_eq!(server_ids(&conv), vec![5, 4, 3, 2, 1, 0]);
        let fetches = service
            .calls()
            .into_iter()
            .filter(|c| matches!(c, MessageCall::FetchPage(..)))
            .count();
        assert_eq!(fetches, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn load_older_in_flight_is_not_duplicated() {
        let service = MockMessageService::new();
        service.push_page(
            PageDirection::Older,
            MessagePage {
                messages: (1..=5).rev().map(test_message).collect(),
                has_more: true,
            },
        );
        let conv = conv(&service);
        conv.load_initial().await.unwrap();

        service.push_page(
            PageDirection::Older,
            MessagePage {
                messages: vec![test_message(0)],
                has_more: false,
            },
        );
        service.delay_responses(Some(Duration::from_secs(1)));

        let racing = conv.clone();
        let first = tokio::spawn(async move { racing.load_older().await });
        tokio::task::yield_now().await;

        // second trigger while the first is sleeping in the mock
        conv.load_older().await.unwrap();
        first.await.unwrap().unwrap();

        assert_eq!(server_ids(&conv), vec![5, 4, 3, 2, 1, 0]);
        let fetches = service
            .calls()
            .into_iter()
            .filter(|c| matches!(c, MessageCall::FetchPage(..)))
            .count();
        assert_eq!(fetches, 2); // initial + one older
    }

    #[tokio::test]
    async fn anchored_open_can_page_newer_messages_in() {
        let service = MockMessageService::new();
        // history around message 10
        service.push_page(
            PageDirection::Older,
            MessagePage {
                messages: (6..=10).rev().map(test_message).collect(),
                has_more: true,
            },
        );
        service.push_page(
            PageDirection::Newer,
            MessagePage {
                messages: vec![test_message(12), test_message(11)],
                has_more: false,
            },
        );
        let conv = conv(&service);

        conv.load_initial_at(MessageId(10)).await.unwrap();
        assert!(conv.state().has_newer);

        conv.load_newer().await.unwrap();

        assert_eq!(server_ids(&conv), vec![12, 11, 10, 9, 8, 7, 6]);
        assert!(!conv.state().has_newer);

        // direction exhausted, further triggers are no-ops
        conv.load_newer().await.unwrap();
        assert_eq!(server_ids(&conv), vec![12, 11, 10, 9, 8, 7, 6]);
    }

    #[tokio::test]
    async fn pages_are_deduplicated_by_key() {
        let service = MockMessageService::new();
        service.push_page(
            PageDirection::Older,
            MessagePage {
                messages: (1..=5).rev().map(test_message).collect(),
                has_more: true,
            },
        );
        // overlapping page: 2 and 1 again, plus 0
        service.push_page(
            PageDirection::Older,
            MessagePage {
                messages: vec![test_message(2), test_message(1), test_message(0)],
                has_more: false,
            },
        );
        let conv = conv(&service);
        conv.load_initial().await.unwrap();
        conv.load_older().await.unwrap();

        assert_eq!(server_ids(&conv), vec![5, 4, 3, 2, 1, 0]);
    }

    #[tokio::test]
    async fn send_reconciles_the_optimistic_message() {
        let service = MockMessageService::new();
        service.push_page(PageDirection::Older, MessagePage::default());
        let conv = conv(&service);
        conv.load_initial().await.unwrap();

        let confirmed = conv.send("hello", None).await.unwrap();

        let messages = conv.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, confirmed.id);
        assert_eq!(messages[0].client_id, confirmed.client_id);
        assert!(!messages[0].is_pending());
    }

    #[tokio::test]
    async fn failed_send_withdraws_the_message_and_returns_the_text() {
        let service = MockMessageService::new();
        service.push_page(PageDirection::Older, MessagePage::default());
        let conv = conv(&service);
        conv.load_initial().await.unwrap();

        service.fail_requests(true);
        let err = conv.send("hello", None).await.unwrap_err();

        assert_eq!(err.body, "hello");
        assert!(conv.messages().is_empty());
    }

    #[tokio::test]
    async fn refresh_keeps_unconfirmed_messages_in_front() {
        let service = MockMessageService::new();
        service.push_page(
            PageDirection::Older,
            MessagePage {
                messages: vec![test_message(1)],
                has_more: false,
            },
        );
        let conv = conv(&service);
        conv.load_initial().await.unwrap();

        // a send that never comes back: simulate by failing it, then
        // re-inserting a pending message by hand
        let mut pending = test_message(0);
        pending.id = None;
        conv.state.write().unwrap().messages.insert(0, pending.clone());

        service.push_page(
            PageDirection::Older,
            MessagePage {
                messages: vec![test_message(2), test_message(1)],
                has_more: false,
            },
        );
        conv.load_initial().await.unwrap();

        let messages = conv.messages();
        assert_eq!(messages[0].client_id, pending.client_id);
        assert_eq!(server_ids(&conv), vec![2, 1]);
    }

    #[tokio::test]
    async fn edit_rolls_back_on_failure() {
        let service = MockMessageService::new();
        service.push_page(
            PageDirection::Older,
            MessagePage {
                messages: vec![test_message(1)],
                has_more: false,
            },
        );
        let conv = conv(&service);
        conv.load_initial().await.unwrap();
        let before = conv.messages();

        service.fail_requests(true);
        assert!(conv.edit(MessageId(1), "edited").await.is_err());

        assert_eq!(conv.messages(), before);
    }

    #[tokio::test]
    async fn unsend_removes_and_restores_on_failure() {
        let service = MockMessageService::new();
        service.push_page(
            PageDirection::Older,
            MessagePage {
                messages: vec![test_message(2), test_message(1)],
                has_more: false,
            },
        );
        let conv = conv(&service);
        conv.load_initial().await.unwrap();

        conv.unsend(MessageId(2)).await.unwrap();
        assert_eq!(server_ids(&conv), vec![1]);

        service.fail_requests(true);
        assert!(conv.unsend(MessageId(1)).await.is_err());
        assert_eq!(server_ids(&conv), vec![1]);
    }

    #[tokio::test]
    async fn reactions_apply_per_user_and_roll_back() {
        let service = MockMessageService::new();
        service.push_page(
            PageDirection::Older,
            MessagePage {
                messages: vec![test_message(1)],
                has_more: false,
            },
        );
        let conv = conv(&service);
        conv.load_initial().await.unwrap();

        conv.add_reaction(MessageId(1), "❤️").await.unwrap();
        conv.add_reaction(MessageId(1), "👍").await.unwrap();
        let reactions = &conv.messages()[0].reactions;
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].emoji, "👍");

        service.fail_requests(true);
        assert!(conv.remove_reaction(MessageId(1)).await.is_err());
        assert_eq!(conv.messages()[0].reactions.len(), 1);
    }

    #[tokio::test]
    async fn mark_read_flags_peer_messages() {
        let service = MockMessageService::new();
        let mut from_peer = test_message(1);
        from_peer.sender_id = UserId(2);
        let mut own = test_message(2);
        own.sender_id = UserId(9);
        service.push_page(
            PageDirection::Older,
            MessagePage {
                messages: vec![own, from_peer],
                has_more: false,
            },
        );
        let conv = conv(&service);
        conv.load_initial().await.unwrap();

        conv.mark_read().await;

        let messages = conv.messages();
        assert!(messages[1].is_read);
        assert!(service.calls().contains(&MessageCall::MarkRead));
    }
}
