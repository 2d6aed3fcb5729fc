use crate::api::ApiClient;
use crate::models::{Meme, ReactionCounts, ReactionKind};
use crate::prompt::Prompt;
use crate::session::SessionStore;

pub const LOGIN_TO_REACT: &str = "Please login to react to memes!";

/// Where a post is being shown. Owner actions only exist in `Own`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostContext {
    Feed,
    Own,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    React,
    Edit,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// Viewer is not logged in; nothing was sent.
    LoginRequired,
    Recorded,
    Failed(String),
}

/// Reaction state for a single post.
pub struct PostItemController {
    meme: Meme,
    context: PostContext,
    counts: ReactionCounts,
    my_reaction: Option<ReactionKind>,
    busy: bool,
}

impl PostItemController {
    pub fn new(meme: Meme, context: PostContext) -> Self {
        Self {
            meme,
            context,
            counts: ReactionCounts::default(),
            my_reaction: None,
            busy: false,
        }
    }

    pub fn meme(&self) -> &Meme {
        &self.meme
    }

    pub fn counts(&self) -> ReactionCounts {
        self.counts
    }

    pub fn my_reaction(&self) -> Option<ReactionKind> {
        self.my_reaction
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn actions(&self) -> &'static [PostAction] {
        match self.context {
            PostContext::Feed => &[PostAction::React],
            PostContext::Own => &[PostAction::React, PostAction::Edit, PostAction::Delete],
        }
    }

    /// Fetch counts and, for a logged-in viewer, their own reaction. Errors
    /// are logged and leave the previous values.
    pub async fn load(&mut self, client: &ApiClient, session: &SessionStore) {
        let summary = match client.reactions(self.meme.id).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("Error fetching reactions for meme {}: {}", self.meme.id, e);
                return;
            }
        };
        self.counts = summary.counts;
        if let Some(user) = session.current_user() {
            if let Some(kind) = summary.viewer_reaction(user.id) {
                self.my_reaction = Some(kind);
            }
        }
    }

    /// Send a reaction, then re-read counts from the server. Counts are never
    /// bumped locally.
    pub async fn submit_reaction(
        &mut self,
        kind: ReactionKind,
        client: &ApiClient,
        session: &SessionStore,
        prompt: &dyn Prompt,
    ) -> ReactionOutcome {
        if !session.is_authenticated() {
            prompt.alert(LOGIN_TO_REACT);
            return ReactionOutcome::LoginRequired;
        }

        self.busy = true;
        let outcome = match client.react(self.meme.id, kind).await {
            Ok(()) => {
                self.my_reaction = Some(kind);
                self.load(client, session).await;
                ReactionOutcome::Recorded
            }
            Err(e) => {
                tracing::error!("Error adding reaction: {}", e);
                ReactionOutcome::Failed(e.user_message("Failed to add reaction"))
            }
        };
        self.busy = false;
        outcome
    }
}
