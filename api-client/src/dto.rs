//! Wire shapes. The backend is loose with scalar types (counts arrive as
//! strings on some endpoints, read flags as 0/1 on others), so conversions
//! are tolerant here and the domain types stay strict.

use serde::{Deserialize, Deserializer};
use types::{
    ids::{MessageId, PostId, UserId},
    message::{Message, Reaction, ReplyRef},
    post::{PostDetails, Repost},
    user::UserSummary,
};
use uuid::Uuid;
use web_time::Duration;

fn count<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        String(String),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Number(n) => n,
        Raw::String(s) => s.parse().unwrap_or(0),
    })
}

fn flag<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Number(u64),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Bool(b) => b,
        Raw::Number(n) => n != 0,
    })
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserDto {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl From<UserDto> for UserSummary {
    fn from(dto: UserDto) -> Self {
        UserSummary {
            id: UserId(dto.id),
            username: dto.username,
            display_name: dto.name,
            avatar_url: dto.avatar_url,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PostDto {
    pub id: u64,
    pub user: UserDto,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "count")]
    pub like_count: u64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_saved: bool,
    #[serde(default, deserialize_with = "count")]
    pub repost_count: u64,
    #[serde(default)]
    pub is_reposted: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub request_feedback: bool,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub original_post: Option<Box<PostDto>>,
}

impl From<PostDto> for PostDetails {
    fn from(dto: PostDto) -> Self {
        let PostDto {
            id,
            user,
            content,
            like_count,
            is_liked,
            is_saved,
            repost_count,
            is_reposted,
            is_pinned,
            request_feedback,
            created_at,
            original_post,
        } = dto;

        let repost = original_post.map(|orig| {
            let original: PostDetails = (*orig).into();
            // a repost with no commentary of its own is a plain pointer
            let quote = !content.is_empty() && content != original.body;
            Repost {
                quote,
                original: Box::new(original),
            }
        });

        PostDetails {
            id: PostId(id),
            author: user.into(),
            body: content,
            like_count,
            is_liked,
            is_saved,
            repost_count,
            is_reposted,
            is_pinned,
            request_feedback,
            created_at: Duration::from_secs(created_at),
            repost,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReactionDto {
    pub user_id: u64,
    pub emoji: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReplyDto {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessageDto {
    pub id: u64,
    /// Echo of the sender's client id; absent on messages sent before the
    /// field existed.
    #[serde(default)]
    pub client_id: Option<Uuid>,
    pub sender_id: u64,
    pub receiver_id: u64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default, deserialize_with = "flag")]
    pub is_read: bool,
    #[serde(default)]
    pub reactions: Vec<ReactionDto>,
    #[serde(default)]
    pub reply_to: Option<ReplyDto>,
}

impl From<MessageDto> for Message {
    fn from(dto: MessageDto) -> Self {
        Message {
            client_id: dto.client_id.unwrap_or_else(Uuid::new_v4),
            id: Some(MessageId(dto.id)),
            sender_id: UserId(dto.sender_id),
            receiver_id: UserId(dto.receiver_id),
            body: dto.content,
            created_at: Duration::from_secs(dto.created_at),
            is_read: dto.is_read,
            reply_to: dto.reply_to.map(|r| ReplyRef {
                id: MessageId(r.id),
                username: r.username,
                excerpt: r.content,
            }),
            reactions: dto
                .reactions
                .into_iter()
                .map(|r| Reaction {
                    user_id: UserId(r.user_id),
                    emoji: r.emoji,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessagePageDto {
    #[serde(default)]
    pub messages: Vec<MessageDto>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TypingDto {
    #[serde(default)]
    pub is_typing: bool,
}
