use std::fmt;
use std::str::FromStr;

use crate::api::{ApiClient, MemeQuery};
use crate::controllers::{RequestSeq, Ticket};
use crate::error::ClientResult;
use crate::models::{Category, Meme};
use crate::prompt::Prompt;
use crate::session::SessionStore;

pub const DEFAULT_NEARBY_RADIUS_KM: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    #[default]
    Newest,
    Trending,
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortMode::Newest => f.write_str("newest"),
            SortMode::Trending => f.write_str("trending"),
        }
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" | "latest" => Ok(SortMode::Newest),
            "trending" => Ok(SortMode::Trending),
            other => Err(format!("unknown sort mode '{}'", other)),
        }
    }
}

/// What the feed is currently asking the server for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilter {
    pub sort: SortMode,
    /// Text being typed; not sent until submitted.
    pub search_input: String,
    pub applied_search: String,
    pub category: Option<Category>,
    pub nearby: bool,
}

/// A resolved fetch, detached from the controller so it can run while the
/// controller issues newer ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRequest {
    List(MemeQuery),
    Trending,
    Nearby { radius_km: u32 },
}

impl FeedRequest {
    pub async fn run(&self, client: &ApiClient) -> ClientResult<Vec<Meme>> {
        match self {
            FeedRequest::List(query) => client.list_memes(query).await,
            FeedRequest::Trending => client.trending_memes().await,
            FeedRequest::Nearby { radius_km } => client.nearby_memes(*radius_km).await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

pub struct FeedController {
    client: ApiClient,
    filter: FeedFilter,
    memes: Vec<Meme>,
    status: FeedStatus,
    seq: RequestSeq,
    nearby_radius_km: u32,
}

impl FeedController {
    pub fn new(client: ApiClient) -> Self {
        Self::with_radius(client, DEFAULT_NEARBY_RADIUS_KM)
    }

    pub fn with_radius(client: ApiClient, nearby_radius_km: u32) -> Self {
        Self {
            client,
            filter: FeedFilter::default(),
            memes: Vec::new(),
            status: FeedStatus::Idle,
            seq: RequestSeq::new(),
            nearby_radius_km,
        }
    }

    pub fn filter(&self) -> &FeedFilter {
        &self.filter
    }

    pub fn memes(&self) -> &[Meme] {
        &self.memes
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == FeedStatus::Loading
    }

    /// "No results" is only meaningful after a fetch that succeeded.
    pub fn shows_empty_state(&self) -> bool {
        self.status == FeedStatus::Loaded && self.memes.is_empty()
    }

    pub fn current_request(&self) -> FeedRequest {
        if self.filter.nearby {
            FeedRequest::Nearby {
                radius_km: self.nearby_radius_km,
            }
        } else if self.filter.sort == SortMode::Trending {
            FeedRequest::Trending
        } else {
            let search = self.filter.applied_search.trim();
            FeedRequest::List(MemeQuery {
                search: (!search.is_empty()).then(|| search.to_string()),
                category: self.filter.category,
            })
        }
    }

    pub fn begin_fetch(&mut self) -> (Ticket, FeedRequest) {
        self.status = FeedStatus::Loading;
        (self.seq.issue(), self.current_request())
    }

    /// Publish a fetch result. Returns `false` when a newer fetch has been
    /// issued since, in which case the result is dropped.
    pub fn complete(&mut self, ticket: Ticket, result: ClientResult<Vec<Meme>>) -> bool {
        if !self.seq.is_latest(ticket) {
            tracing::debug!("Dropping superseded feed response");
            return false;
        }
        match result {
            Ok(memes) => {
                self.memes = memes;
                self.status = FeedStatus::Loaded;
            }
            Err(e) => {
                // Keep whatever was on screen.
                tracing::error!("Error fetching memes: {}", e);
                let fallback = if self.filter.nearby {
                    "Failed to fetch nearby memes"
                } else {
                    "Failed to fetch memes"
                };
                self.status = FeedStatus::Failed(e.user_message(fallback));
            }
        }
        true
    }

    pub async fn refresh(&mut self) -> bool {
        let (ticket, request) = self.begin_fetch();
        let result = request.run(&self.client).await;
        self.complete(ticket, result)
    }

    pub async fn set_sort(&mut self, sort: SortMode) -> bool {
        self.filter.sort = sort;
        self.filter.nearby = false;
        self.refresh().await
    }

    pub async fn set_category(&mut self, category: Option<Category>) -> bool {
        self.filter.category = category;
        self.filter.nearby = false;
        self.refresh().await
    }

    pub fn set_search_input(&mut self, text: impl Into<String>) {
        self.filter.search_input = text.into();
    }

    pub async fn submit_search(&mut self) -> bool {
        self.filter.applied_search = self.filter.search_input.trim().to_string();
        self.filter.nearby = false;
        self.refresh().await
    }

    /// Submit text and category together, as a search form does.
    pub async fn search(&mut self, text: impl Into<String>, category: Option<Category>) -> bool {
        self.filter.search_input = text.into();
        self.filter.category = category;
        self.submit_search().await
    }

    pub async fn clear_filters(&mut self) -> bool {
        self.filter.search_input.clear();
        self.filter.applied_search.clear();
        self.filter.category = None;
        self.filter.nearby = false;
        self.refresh().await
    }

    /// Switch to posts from nearby uploaders. Requires a login; a refused or
    /// failed attempt leaves the feed in its previous mode.
    pub async fn show_nearby(&mut self, session: &SessionStore, prompt: &dyn Prompt) -> bool {
        if !session.is_authenticated() {
            prompt.alert("Please login to see nearby memes");
            return false;
        }

        self.filter.nearby = true;
        let applied = self.refresh().await;
        if let FeedStatus::Failed(message) = &self.status {
            if applied {
                prompt.alert(message);
                self.filter.nearby = false;
            }
            return false;
        }
        applied
    }
}
