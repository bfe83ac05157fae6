use serde::{Deserialize, Serialize};
use uuid::Uuid;
use web_time::Duration;

use crate::ids::{MessageId, UserId};

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ReplyRef {
    pub id: MessageId,
    pub username: String,
    pub excerpt: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: UserId,
    pub emoji: String,
}

/// A conversation message. `client_id` is the stable key: it is minted on
/// the sending device and echoed back by the backend, so an optimistically
/// rendered message and its confirmed form are the same entry.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Message {
    pub client_id: Uuid,
    pub id: Option<MessageId>,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub body: String,
    /// Seconds (as a duration) since the unix epoch.
    pub created_at: Duration,
    pub is_read: bool,
    pub reply_to: Option<ReplyRef>,
    pub reactions: Vec<Reaction>,
}

impl Message {
    /// Sent locally but not yet confirmed by the backend.
    pub fn is_pending(&self) -> bool {
        self.id.is_none()
    }
}
