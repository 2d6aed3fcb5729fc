use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

use crate::api::client::DEFAULT_BASE_URL;
use crate::controllers::feed::DEFAULT_NEARBY_RADIUS_KM;
use crate::controllers::SortMode;
use crate::models::{Category, ReactionKind};

#[derive(Parser, Debug)]
#[command(name = "memehub", about = "Share and discover AI memes from the terminal")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, e.g. http://localhost:5000/api
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Path to data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and log in
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to --password
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Log in and optionally report your location for nearby memes
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, requires = "longitude", allow_hyphen_values = true)]
        latitude: Option<f64>,
        #[arg(long, requires = "latitude", allow_hyphen_values = true)]
        longitude: Option<f64>,
    },
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Whoami,
    /// Home feed
    Feed {
        #[arg(long, default_value_t = SortMode::Newest)]
        sort: SortMode,
    },
    /// Search by text and category, or show nearby memes
    Search {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long, conflicts_with_all = ["query", "category"])]
        nearby: bool,
    },
    /// List your own uploads
    Mine,
    /// Upload a meme from a file or a URL
    Upload {
        #[arg(long)]
        title: String,
        #[arg(long)]
        caption: String,
        #[arg(long, default_value_t = Category::Ai)]
        category: Category,
        #[arg(long, conflicts_with = "url")]
        file: Option<PathBuf>,
        #[arg(long)]
        url: Option<String>,
    },
    /// Edit one of your memes
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        caption: Option<String>,
        #[arg(long)]
        category: Option<Category>,
    },
    /// Delete one of your memes
    Delete { id: i64 },
    /// React to a meme (laugh, robot, think)
    React { id: i64, kind: ReactionKind },
    /// Show reaction counts for a meme
    Reactions { id: i64 },
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub feed: FeedConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Origin serving uploaded images; derived from `base_url` when unset.
    pub asset_base_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub nearby_radius_km: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            asset_base_url: None,
            timeout_secs: 30,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            nearby_radius_km: DEFAULT_NEARBY_RADIUS_KM,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref url) = cli.api_url {
            config.api.base_url = url.clone();
        }

        if config.storage.path.is_none() {
            config.storage.path = Some(data_dir.join("session.json"));
        }
        if config.api.asset_base_url.is_none() {
            config.api.asset_base_url = Some(origin_of(&config.api.base_url));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".memehub")
        })
    }

    pub fn session_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("session.json"))
    }

    pub fn asset_base_url(&self) -> String {
        self.api
            .asset_base_url
            .clone()
            .unwrap_or_else(|| origin_of(&self.api.base_url))
    }
}

/// Scheme, host and port of a URL; uploaded images are served from there.
fn origin_of(base_url: &str) -> String {
    match url::Url::parse(base_url) {
        Ok(url) => url.origin().ascii_serialization(),
        Err(_) => base_url.trim_end_matches('/').to_string(),
    }
}
