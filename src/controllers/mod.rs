pub mod feed;
pub mod item;
pub mod my_memes;
pub mod upload;

use std::sync::atomic::{AtomicU64, Ordering};

pub use feed::{FeedController, FeedFilter, FeedRequest, FeedStatus, SortMode};
pub use item::{PostAction, PostContext, PostItemController, ReactionOutcome, LOGIN_TO_REACT};
pub use my_memes::MyMemesController;
pub use upload::{SubmitOutcome, UploadForm};

/// Monotonic request tickets. Only the most recently issued ticket may
/// publish its result; anything older resolved too late.
#[derive(Debug, Default)]
pub struct RequestSeq {
    latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl RequestSeq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}
