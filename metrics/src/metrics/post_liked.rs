use serde::{Deserialize, Serialize};
use types::ids::{PostId, UserId};
use utoipa::ToSchema;

use super::sealed_metric::SealedMetric;

#[derive(Serialize, Deserialize, Clone, Debug, ToSchema)]
pub struct PostLiked {
    #[schema(value_type = u64)]
    pub post_id: PostId,
    #[schema(value_type = u64)]
    pub publisher_id: UserId,
    #[schema(value_type = u64)]
    pub user_id: UserId,
    pub like_count: u64,
    pub is_repost: bool,
}

impl SealedMetric for PostLiked {
    fn tag(&self) -> String {
        "post_liked".to_string()
    }

    fn user_id(&self) -> Option<UserId> {
        Some(self.user_id)
    }
}
