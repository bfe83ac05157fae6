pub mod actions;
pub mod loader;
pub mod store;
pub mod visibility;

use types::feed::{FeedItem, ItemKey};

use crate::service::Keyed;

impl Keyed for FeedItem {
    type Key = ItemKey;

    fn key(&self) -> ItemKey {
        FeedItem::key(self)
    }
}
