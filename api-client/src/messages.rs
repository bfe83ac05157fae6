use client_common::service::{MessagePage, MessageService, PageDirection};
use serde::Serialize;
use types::{
    ids::{ConversationId, MessageId, UserId},
    message::Message,
};
use uuid::Uuid;

use crate::{
    dto::{MessageDto, MessagePageDto, TypingDto},
    ApiClient, Error,
};

#[derive(Serialize)]
struct SendBody<'a> {
    conversation_id: ConversationId,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_id: Option<MessageId>,
    client_id: Uuid,
}

#[derive(Serialize)]
struct EditBody<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct ReactionBody<'a> {
    emoji: &'a str,
}

impl MessageService for ApiClient {
    type Error = Error;

    async fn fetch_page(
        &self,
        conversation: ConversationId,
        direction: PageDirection,
        cursor: Option<MessageId>,
        limit: usize,
    ) -> Result<MessagePage, Error> {
        let direction = match direction {
            PageDirection::Older => "older",
            PageDirection::Newer => "newer",
        };
        let mut params = vec![
            ("direction", direction.to_owned()),
            ("limit", limit.to_string()),
        ];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }

        let page: MessagePageDto = self
            .get_json(&format!("messages/{conversation}"), &params)
            .await?;
        Ok(MessagePage {
            messages: page.messages.into_iter().map(Into::into).collect(),
            has_more: page.has_more,
        })
    }

    async fn send_message(
        &self,
        conversation: ConversationId,
        body: &str,
        reply_to: Option<MessageId>,
        client_id: Uuid,
    ) -> Result<Message, Error> {
        let message: MessageDto = self
            .post_json(
                "messages",
                &SendBody {
                    conversation_id: conversation,
                    content: body,
                    reply_to_id: reply_to,
                    client_id,
                },
            )
            .await?;
        Ok(message.into())
    }

    async fn edit_message(&self, id: MessageId, body: &str) -> Result<(), Error> {
        self.patch_empty(&format!("messages/{id}"), &EditBody { content: body })
            .await
    }

    async fn unsend_message(&self, id: MessageId) -> Result<(), Error> {
        self.delete_empty(&format!("messages/{id}")).await
    }

    async fn add_reaction(&self, id: MessageId, emoji: &str) -> Result<(), Error> {
        self.post_empty(&format!("messages/{id}/reactions"), &ReactionBody { emoji })
            .await
    }

    async fn remove_reaction(&self, id: MessageId) -> Result<(), Error> {
        self.delete_empty(&format!("messages/{id}/reactions")).await
    }

    async fn mark_read(&self, conversation: ConversationId) -> Result<(), Error> {
        self.post_empty(&format!("messages/{conversation}/read"), &())
            .await
    }

    async fn get_typing(&self, peer: UserId) -> Result<bool, Error> {
        let typing: TypingDto = self
            .get_json(&format!("messages/typing/{peer}"), &[])
            .await?;
        Ok(typing.is_typing)
    }
}
