use crate::forms::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Unauthorized")]
    Unauthorized { message: Option<String> },

    #[error("Request failed with status {status}")]
    Api {
        status: u16,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Message suitable for showing to the user. Server-supplied text wins,
    /// validation errors carry their own text, everything else gets `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Validation(e) => e.to_string(),
            ClientError::Unauthorized { message: Some(msg) }
            | ClientError::Api {
                message: Some(msg), ..
            } => msg.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
