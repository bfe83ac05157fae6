pub mod conversation;
pub mod typing;

use types::message::Message;
use uuid::Uuid;

use crate::service::Keyed;

impl Keyed for Message {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.client_id
    }
}
