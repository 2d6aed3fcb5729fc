use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Method;

use crate::api::client::ApiClient;
use crate::error::ClientResult;
use crate::models::{
    AuthResponse, Category, LocationUpdate, LoginRequest, Meme, MemeList, MemeUpdate,
    ReactionKind, ReactionRequest, ReactionSummary, RegisterRequest,
};

/// Server-side filters for `GET /memes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemeQuery {
    pub search: Option<String>,
    pub category: Option<Category>,
}

impl MemeQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        if let Some(category) = self.category {
            params.push(("category", category.as_str().to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImagePayload {
    File {
        file_name: String,
        mime: String,
        bytes: Bytes,
    },
    Url(String),
}

/// A validated post ready for `POST /memes`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeme {
    pub title: String,
    pub caption: String,
    pub category: Category,
    pub image: ImagePayload,
}

impl NewMeme {
    fn into_form(self) -> ClientResult<Form> {
        let form = Form::new()
            .text("title", self.title)
            .text("caption", self.caption)
            .text("category", self.category.as_str());

        let form = match self.image {
            ImagePayload::File {
                file_name,
                mime,
                bytes,
            } => {
                let part = Part::bytes(bytes.to_vec())
                    .file_name(file_name)
                    .mime_str(&mime)?;
                form.part("image", part)
            }
            ImagePayload::Url(url) => form.text("image_url", url),
        };
        Ok(form)
    }
}

impl ApiClient {
    pub async fn register(&self, username: &str, email: &str, password: &str) -> ClientResult<AuthResponse> {
        let body = RegisterRequest {
            username,
            email,
            password,
        };
        let req = self.request(Method::POST, "/auth/register")?.json(&body);
        self.send_json(req).await
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<AuthResponse> {
        let req = self
            .request(Method::POST, "/auth/login")?
            .json(&LoginRequest { email, password });
        self.send_json(req).await
    }

    pub async fn update_location(&self, latitude: f64, longitude: f64) -> ClientResult<()> {
        let req = self
            .request(Method::PUT, "/auth/location")?
            .json(&LocationUpdate {
                latitude,
                longitude,
            });
        self.send_empty(req).await
    }

    pub async fn list_memes(&self, query: &MemeQuery) -> ClientResult<Vec<Meme>> {
        let req = self.request(Method::GET, "/memes")?.query(&query.params());
        Ok(self.send_json::<MemeList>(req).await?.memes)
    }

    pub async fn trending_memes(&self) -> ClientResult<Vec<Meme>> {
        let req = self.request(Method::GET, "/memes/trending")?;
        Ok(self.send_json::<MemeList>(req).await?.memes)
    }

    pub async fn nearby_memes(&self, radius_km: u32) -> ClientResult<Vec<Meme>> {
        let req = self
            .request(Method::GET, "/memes/nearby")?
            .query(&[("radius", radius_km)]);
        Ok(self.send_json::<MemeList>(req).await?.memes)
    }

    pub async fn my_memes(&self) -> ClientResult<Vec<Meme>> {
        let req = self.request(Method::GET, "/memes/my-memes")?;
        Ok(self.send_json::<MemeList>(req).await?.memes)
    }

    pub async fn create_meme(&self, meme: NewMeme) -> ClientResult<()> {
        let req = self.request(Method::POST, "/memes")?.multipart(meme.into_form()?);
        self.send_empty(req).await
    }

    pub async fn update_meme(&self, id: i64, update: &MemeUpdate) -> ClientResult<()> {
        let req = self
            .request(Method::PUT, &format!("/memes/{}", id))?
            .json(update);
        self.send_empty(req).await
    }

    pub async fn delete_meme(&self, id: i64) -> ClientResult<()> {
        let req = self.request(Method::DELETE, &format!("/memes/{}", id))?;
        self.send_empty(req).await
    }

    pub async fn reactions(&self, id: i64) -> ClientResult<ReactionSummary> {
        let req = self.request(Method::GET, &format!("/memes/{}/reactions", id))?;
        self.send_json(req).await
    }

    pub async fn react(&self, id: i64, kind: ReactionKind) -> ClientResult<()> {
        let req = self
            .request(Method::POST, &format!("/memes/{}/reactions", id))?
            .json(&ReactionRequest {
                reaction_type: kind,
            });
        self.send_empty(req).await
    }
}
