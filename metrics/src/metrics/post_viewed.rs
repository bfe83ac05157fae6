use serde::{Deserialize, Serialize};
use types::ids::{PostId, UserId};
use utoipa::ToSchema;

use super::sealed_metric::SealedMetric;

/// Fired once per session per post, after the dwell threshold elapses.
#[derive(Serialize, Deserialize, Clone, Debug, ToSchema)]
pub struct PostViewed {
    #[schema(value_type = u64)]
    pub post_id: PostId,
    #[schema(value_type = u64)]
    pub user_id: UserId,
}

impl SealedMetric for PostViewed {
    fn tag(&self) -> String {
        "post_viewed".to_string()
    }

    fn user_id(&self) -> Option<UserId> {
        Some(self.user_id)
    }
}
