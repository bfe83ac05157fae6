use std::time::Duration;

/// How long a changed search query sits before it actually hits the backend.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Continuous on-screen time before a post counts as viewed.
pub const VIEW_DWELL_THRESHOLD: Duration = Duration::from_secs(1);

pub const TYPING_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// A peer stops counting as typing this long after the last refresh.
pub const TYPING_TTL: Duration = Duration::from_secs(3);

/// At most this many peers are polled for presence at once.
pub const MAX_WATCHED_PEERS: usize = 8;

pub const CHAT_PAGE_SIZE: usize = 50;

/// Ceiling on feed fetches so a stalled request cannot pin the loading
/// indicator forever.
pub const FEED_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Minimum gap between two injected feedback prompts in one session.
pub const FEEDBACK_PROMPT_COOLDOWN: Duration = Duration::from_secs(12 * 60 * 60);

/// The suggested-users block is only injected into feeds with at least this
/// many items, at this position.
pub const SUGGESTED_USERS_MIN_ITEMS: usize = 5;
pub const SUGGESTED_USERS_INDEX: usize = 5;
