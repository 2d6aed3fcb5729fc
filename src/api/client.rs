use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use url::Url;

use crate::api::events::{AuthEvent, AuthEvents};
use crate::error::{ClientError, ClientResult};
use crate::models::ErrorBody;
use crate::storage::SessionStorage;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Shared HTTP adapter. Attaches the persisted bearer token to every call and
/// turns any 401 into a cleared session plus an [`AuthEvent::Unauthorized`].
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn SessionStorage>,
    events: AuthEvents,
}

impl ApiClient {
    pub fn new(base_url: &str, storage: Arc<dyn SessionStorage>) -> ClientResult<Self> {
        Self::with_timeout(base_url, storage, Duration::from_secs(30))
    }

    pub fn with_timeout(
        base_url: &str,
        storage: Arc<dyn SessionStorage>,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: normalize_base(base_url)?,
            storage,
            events: AuthEvents::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Absolute URL for an API path such as `/memes/7/reactions`.
    pub fn url(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        Ok(self.http.request(method, self.url(path)?))
    }

    /// Send a request and decode a JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = self.send(builder).await?;
        response.json::<T>().await.map_err(|e| {
            tracing::error!("Malformed response body: {}", e);
            ClientError::Network(e)
        })
    }

    /// Send a request whose body we do not care about.
    pub async fn send_empty(&self, builder: RequestBuilder) -> ClientResult<()> {
        self.send(builder).await.map(|_| ())
    }

    pub async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        // Read the token at send time so a logout or 401 elsewhere is honored.
        let builder = match self.storage.token() {
            Ok(Some(token)) => builder.bearer_auth(token),
            Ok(None) => builder,
            Err(e) => {
                tracing::warn!("Could not read persisted token, sending anonymously: {}", e);
                builder
            }
        };

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Network error: {}", e);
            ClientError::Network(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;
        if status == StatusCode::UNAUTHORIZED {
            self.expire_session();
            return Err(ClientError::Unauthorized { message });
        }

        tracing::debug!("Request failed with {}: {:?}", status, message);
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    fn expire_session(&self) {
        tracing::info!("Server rejected credentials, clearing session");
        if let Err(e) = self.storage.clear_session() {
            tracing::error!("Failed to clear persisted session: {}", e);
        }
        self.events.emit(AuthEvent::Unauthorized);
    }
}

async fn error_message(response: Response) -> Option<String> {
    response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .filter(|msg| !msg.trim().is_empty())
}

/// `Url::join` drops the last segment unless the base ends with a slash.
fn normalize_base(base_url: &str) -> ClientResult<Url> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Ok(Url::parse(&with_slash)?)
}
