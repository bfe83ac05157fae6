use client_common::service::{
    BookmarkOutcome, ContentService, FeedbackKind, PinOutcome, RepostOutcome,
};
use serde::Serialize;
use types::{
    feed::{FeedItem, FeedName},
    ids::{PostId, UserId},
    user::UserSummary,
};

use crate::{
    dto::{PostDto, UserDto},
    ApiClient, Error,
};

fn feed_filter(feed: FeedName) -> Option<&'static str> {
    match feed {
        FeedName::Movie => Some("movie"),
        FeedName::Book => Some("book"),
        FeedName::Music => Some("music"),
        FeedName::Saved => Some("saved"),
        FeedName::Trend | FeedName::Following | FeedName::SearchResults => None,
    }
}

#[derive(Serialize)]
struct InteractionBody {
    user_id: UserId,
    post_id: PostId,
}

#[derive(Serialize)]
struct FeedbackBody {
    post_id: PostId,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ViewerBody {
    user_id: UserId,
}

impl ContentService for ApiClient {
    type Error = Error;

    async fn fetch_feed(
        &self,
        feed: FeedName,
        viewer: UserId,
        query: Option<&str>,
    ) -> Result<Vec<FeedItem>, Error> {
        let mut params = vec![("user_id", viewer.to_string())];
        if let Some(filter) = feed_filter(feed) {
            params.push(("filter", filter.to_owned()));
        }
        if let Some(q) = query {
            params.push(("search", q.to_owned()));
        }
        let path = if feed == FeedName::Following {
            "posts/feed/following"
        } else {
            "posts/feed"
        };

        let posts: Vec<PostDto> = self.get_json(path, &params).await?;
        Ok(posts
            .into_iter()
            .map(|p| FeedItem::Post(p.into()))
            .collect())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>, Error> {
        let users: Vec<UserDto> = self
            .get_json("users/search", &[("q", query.to_owned())])
            .await?;
        Ok(users.into_iter().map(Into::into).collect())
    }

    async fn toggle_like(&self, viewer: UserId, post: PostId) -> Result<(), Error> {
        self.post_empty(
            "interactions/like",
            &InteractionBody {
                user_id: viewer,
                post_id: post,
            },
        )
        .await
    }

    async fn toggle_bookmark(
        &self,
        viewer: UserId,
        post: PostId,
    ) -> Result<BookmarkOutcome, Error> {
        self.post_json(
            "interactions/bookmark",
            &InteractionBody {
                user_id: viewer,
                post_id: post,
            },
        )
        .await
    }

    async fn toggle_repost(&self, viewer: UserId, post: PostId) -> Result<RepostOutcome, Error> {
        self.post_json(
            &format!("posts/{post}/repost"),
            &ViewerBody { user_id: viewer },
        )
        .await
    }

    async fn toggle_pin(&self, post: PostId) -> Result<PinOutcome, Error> {
        self.post_json(&format!("posts/{post}/pin"), &()).await
    }

    async fn delete_post(&self, post: PostId) -> Result<(), Error> {
        self.delete_empty(&format!("posts/{post}")).await
    }

    async fn send_feedback(&self, post: PostId, kind: FeedbackKind) -> Result<(), Error> {
        self.post_empty(
            "interactions/feedback",
            &FeedbackBody {
                post_id: post,
                kind: kind.as_str(),
            },
        )
        .await
    }

    async fn mark_viewed(&self, post: PostId, viewer: UserId) -> Result<(), Error> {
        self.post_empty(&format!("posts/{post}/view"), &ViewerBody { user_id: viewer })
            .await
    }
}
