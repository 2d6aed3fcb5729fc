use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// The authenticated identity and credential held for the current login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    #[serde(rename = "AI")]
    Ai,
    Grok,
    #[serde(rename = "xAI")]
    XAi,
    Futuristic,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Ai,
        Category::Grok,
        Category::XAi,
        Category::Futuristic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Ai => "AI",
            Category::Grok => "Grok",
            Category::XAi => "xAI",
            Category::Futuristic => "Futuristic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{}' (expected AI, Grok, xAI or Futuristic)", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Laugh,
    Robot,
    Think,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 3] = [ReactionKind::Laugh, ReactionKind::Robot, ReactionKind::Think];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Laugh => "laugh",
            ReactionKind::Robot => "robot",
            ReactionKind::Think => "think",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReactionKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown reaction '{}' (expected laugh, robot or think)", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meme {
    pub id: i64,
    pub title: String,
    pub caption: String,
    pub category: Category,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub uploader_username: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub reaction_count: i64,
}

impl Meme {
    /// Resolve the image location. Uploaded files come back as server-relative
    /// paths and are served from the asset origin.
    pub fn image_src(&self, asset_base: &str) -> Option<String> {
        let url = self.image_url.as_deref()?;
        if url.starts_with("http://") || url.starts_with("https://") {
            Some(url.to_string())
        } else {
            let base = asset_base.trim_end_matches('/');
            if url.starts_with('/') {
                Some(format!("{}{}", base, url))
            } else {
                Some(format!("{}/{}", base, url))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCounts {
    #[serde(default, deserialize_with = "lenient_count")]
    pub laugh: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub robot: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub think: i64,
}

impl ReactionCounts {
    pub fn get(&self, kind: ReactionKind) -> i64 {
        match kind {
            ReactionKind::Laugh => self.laugh,
            ReactionKind::Robot => self.robot,
            ReactionKind::Think => self.think,
        }
    }

    pub fn total(&self) -> i64 {
        self.laugh + self.robot + self.think
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReaction {
    pub user_id: i64,
    pub reaction_type: ReactionKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSummary {
    #[serde(default)]
    pub counts: ReactionCounts,
    #[serde(default)]
    pub reactions: Vec<UserReaction>,
    /// Present when the server resolves the caller's own reaction itself.
    #[serde(default)]
    pub my_reaction: Option<ReactionKind>,
}

impl ReactionSummary {
    /// The viewer's current reaction. Falls back to scanning the per-user
    /// list only for servers that do not send `my_reaction`.
    pub fn viewer_reaction(&self, user_id: i64) -> Option<ReactionKind> {
        if self.my_reaction.is_some() {
            return self.my_reaction;
        }
        self.reactions
            .iter()
            .find(|r| r.user_id == user_id)
            .map(|r| r.reaction_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

impl From<AuthResponse> for Session {
    fn from(resp: AuthResponse) -> Self {
        Session {
            user: resp.user,
            token: resp.token,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemeList {
    #[serde(default)]
    pub memes: Vec<Meme>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

// --- Request bodies ---

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LocationUpdate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemeUpdate {
    pub title: String,
    pub caption: String,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReactionRequest {
    pub reaction_type: ReactionKind,
}

fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Int(i64),
        Float(f64),
        Text(String),
        Null(Option<()>),
    }

    Ok(match Count::deserialize(deserializer)? {
        Count::Int(n) => n,
        Count::Float(f) => f as i64,
        Count::Text(s) => s.trim().parse().unwrap_or(0),
        Count::Null(_) => 0,
    })
}
