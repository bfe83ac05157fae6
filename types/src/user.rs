use serde::{Deserialize, Serialize};

use crate::ids::UserId;

const FALLBACK_AVATAR_URL: &str = "https://cdn.mosaic.app/avatars/gen/";
const FALLBACK_AVATAR_COUNT: u64 = 64;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

pub fn avatar_from_id(id: UserId) -> String {
    let index = (id.0 % FALLBACK_AVATAR_COUNT) + 1;
    format!("{FALLBACK_AVATAR_URL}{index}.png")
}

impl UserSummary {
    pub fn display_name_or_username(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }

    pub fn avatar_or_fallback(&self) -> String {
        let avatar = self.avatar_url.clone().unwrap_or_default();
        if !avatar.is_empty() {
            return avatar;
        }

        avatar_from_id(self.id)
    }
}
