//! In-process stand-in for the meme API. Implements the REST contract the
//! client consumes and records every request it receives.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use memehub::api::ApiClient;
use memehub::session::SessionStore;
use memehub::storage::{MemoryStorage, SessionStorage};

pub const PASSWORD: &str = "hunter22";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path and query, e.g. `/api/memes?search=x`.
    pub uri: String,
    pub authorization: Option<String>,
    pub body_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MockUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct MockMeme {
    pub id: i64,
    pub title: String,
    pub caption: String,
    pub category: String,
    pub image_url: String,
    pub uploader_id: i64,
    pub uploaded_file: Option<String>,
}

#[derive(Default)]
pub struct MockData {
    pub users: Vec<MockUser>,
    pub tokens: HashMap<String, i64>,
    pub memes: Vec<MockMeme>,
    pub reactions: HashMap<(i64, i64), String>,
    pub log: Vec<Recorded>,
    pub next_meme_id: i64,
    pub fail_location: bool,
    pub fail_nearby: bool,
    pub fail_uploads: bool,
    pub send_my_reaction: bool,
}

#[derive(Clone, Default)]
pub struct MockState(pub Arc<Mutex<MockData>>);

impl MockState {
    pub fn with<R>(&self, f: impl FnOnce(&mut MockData) -> R) -> R {
        let mut data = self.0.lock().unwrap();
        f(&mut data)
    }
}

pub struct MockServer {
    pub base_url: String,
    pub state: MockState,
}

impl MockServer {
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = MockState::default();
        state.with(|d| d.next_meme_id = 100);

        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn add_user(&self, id: i64, username: &str) -> MockUser {
        let user = MockUser {
            id,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: PASSWORD.to_string(),
        };
        self.state.with(|d| d.users.push(user.clone()));
        user
    }

    pub fn add_meme(&self, id: i64, title: &str, category: &str, uploader_id: i64) {
        self.state.with(|d| {
            d.memes.push(MockMeme {
                id,
                title: title.to_string(),
                caption: format!("caption for {}", title),
                category: category.to_string(),
                image_url: format!("/uploads/{}.png", id),
                uploader_id,
                uploaded_file: None,
            })
        });
    }

    pub fn add_reaction(&self, meme_id: i64, user_id: i64, kind: &str) {
        self.state
            .with(|d| d.reactions.insert((meme_id, user_id), kind.to_string()));
    }

    /// Forget every issued token, as if the server restarted with a new key.
    pub fn revoke_tokens(&self) {
        self.state.with(|d| d.tokens.clear());
    }

    pub fn log(&self) -> Vec<Recorded> {
        self.state.with(|d| d.log.clone())
    }

    pub fn clear_log(&self) {
        self.state.with(|d| d.log.clear());
    }

    /// `METHOD uri` for every request, in order.
    pub fn calls(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.uri))
            .collect()
    }

    pub fn meme_ids(&self) -> Vec<i64> {
        self.state.with(|d| d.memes.iter().map(|m| m.id).collect())
    }
}

/// Client and session over in-memory storage, restored and logged out.
pub fn client_for(server: &MockServer) -> (ApiClient, SessionStore, Arc<dyn SessionStorage>) {
    let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
    let client = ApiClient::new(&server.base_url, storage.clone()).unwrap();
    let session = SessionStore::new(client.clone());
    session.restore();
    (client, session, storage)
}

// --- Router ---

fn router(state: MockState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/location", put(update_location))
        .route("/api/memes", get(list_memes).post(create_meme))
        .route("/api/memes/trending", get(trending))
        .route("/api/memes/nearby", get(nearby))
        .route("/api/memes/my-memes", get(my_memes))
        .route("/api/memes/{id}", put(update_meme).delete(delete_meme))
        .route(
            "/api/memes/{id}/reactions",
            get(get_reactions).post(add_reaction),
        )
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

async fn record(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let uri = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    let method = request.method().to_string();
    state.with(|d| {
        d.log.push(Recorded {
            method,
            uri,
            authorization,
            body_fields: Vec::new(),
        })
    });
    next.run(request).await
}

type ApiError = (StatusCode, Json<Value>);

fn error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

fn authenticate(state: &MockState, headers: &HeaderMap) -> Result<i64, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "No token provided"))?;
    state
        .with(|d| d.tokens.get(token).copied())
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Invalid token"))
}

fn issue_token(data: &mut MockData, user: &MockUser) -> Value {
    let token = format!("token-{}-{}", user.id, data.tokens.len() + 1);
    data.tokens.insert(token.clone(), user.id);
    json!({
        "token": token,
        "user": { "id": user.id, "username": user.username, "email": user.email }
    })
}

fn meme_json(data: &MockData, meme: &MockMeme) -> Value {
    let username = data
        .users
        .iter()
        .find(|u| u.id == meme.uploader_id)
        .map(|u| u.username.clone());
    let count = data.reactions.keys().filter(|(m, _)| *m == meme.id).count();
    json!({
        "id": meme.id,
        "title": meme.title,
        "caption": meme.caption,
        "category": meme.category,
        "image_url": meme.image_url,
        "uploader_username": username,
        "created_at": "2024-03-05T10:00:00.000Z",
        // Postgres COUNT(*) comes back as text.
        "reaction_count": count.to_string(),
    })
}

fn meme_list<'a>(data: &MockData, memes: impl Iterator<Item = &'a MockMeme>) -> Json<Value> {
    let memes: Vec<Value> = memes.map(|m| meme_json(data, m)).collect();
    Json(json!({ "memes": memes }))
}

// --- Auth handlers ---

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
}

async fn register(
    State(state): State<MockState>,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
    state.with(|d| {
        if d.users.iter().any(|u| u.email == body.email) {
            return Err(error(StatusCode::BAD_REQUEST, "User already exists"));
        }
        let user = MockUser {
            id: d.users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            username: body.username,
            email: body.email,
            password: body.password,
        };
        d.users.push(user.clone());
        Ok((StatusCode::CREATED, Json(issue_token(d, &user))))
    })
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(
    State(state): State<MockState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<Value>, ApiError> {
    state.with(|d| {
        let user = d
            .users
            .iter()
            .find(|u| u.email == body.email && u.password == body.password)
            .cloned()
            .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;
        Ok(Json(issue_token(d, &user)))
    })
}

async fn update_location(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    authenticate(&state, &headers)?;
    if state.with(|d| d.fail_location) {
        return Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Geo index offline"));
    }
    Ok(Json(json!({ "message": "Location updated" })))
}

// --- Meme handlers ---

#[derive(Deserialize)]
struct ListParams {
    search: Option<String>,
    category: Option<String>,
}

async fn list_memes(State(state): State<MockState>, Query(params): Query<ListParams>) -> Json<Value> {
    state.with(|d| {
        let matches = d.memes.iter().rev().filter(|m| {
            let search_ok = params.search.as_deref().map_or(true, |s| {
                let s = s.to_lowercase();
                m.title.to_lowercase().contains(&s) || m.caption.to_lowercase().contains(&s)
            });
            let category_ok = params.category.as_deref().map_or(true, |c| m.category == c);
            search_ok && category_ok
        });
        meme_list(d, matches)
    })
}

async fn trending(State(state): State<MockState>) -> Json<Value> {
    state.with(|d| {
        let mut memes: Vec<&MockMeme> = d.memes.iter().collect();
        memes.sort_by_key(|m| {
            std::cmp::Reverse(d.reactions.keys().filter(|(id, _)| *id == m.id).count())
        });
        meme_list(d, memes.into_iter())
    })
}

async fn nearby(State(state): State<MockState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    state.with(|d| {
        if d.fail_nearby {
            return Err(error(StatusCode::BAD_REQUEST, "Please update your location first"));
        }
        Ok(meme_list(d, d.memes.iter().filter(|m| m.uploader_id != user_id)))
    })
}

async fn my_memes(State(state): State<MockState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    Ok(state.with(|d| meme_list(d, d.memes.iter().rev().filter(|m| m.uploader_id == user_id))))
}

async fn create_meme(
    State(state): State<MockState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;

    let mut fields: HashMap<String, String> = HashMap::new();
    let mut uploaded_file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| error(StatusCode::BAD_REQUEST, "Malformed multipart body"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().unwrap_or("").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| error(StatusCode::BAD_REQUEST, "Bad file"))?;
            uploaded_file = Some(format!("{}:{}:{}", file_name, content_type, bytes.len()));
        } else {
            let text = field
                .text()
                .await
                .map_err(|_| error(StatusCode::BAD_REQUEST, "Bad field"))?;
            fields.insert(name, text);
        }
    }

    state.with(|d| {
        let mut names: Vec<String> = fields.keys().cloned().collect();
        if uploaded_file.is_some() {
            names.push("image".to_string());
        }
        names.sort();
        if let Some(last) = d.log.last_mut() {
            last.body_fields = names;
        }

        if d.fail_uploads {
            return Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Storage quota exceeded"));
        }

        let id = d.next_meme_id;
        d.next_meme_id += 1;
        let image_url = match (&uploaded_file, fields.get("image_url")) {
            (Some(_), _) => format!("/uploads/{}.png", id),
            (None, Some(url)) => url.clone(),
            (None, None) => return Err(error(StatusCode::BAD_REQUEST, "Image is required")),
        };
        let meme = MockMeme {
            id,
            title: fields.get("title").cloned().unwrap_or_default(),
            caption: fields.get("caption").cloned().unwrap_or_default(),
            category: fields.get("category").cloned().unwrap_or_default(),
            image_url,
            uploader_id: user_id,
            uploaded_file,
        };
        let body = meme_json(d, &meme);
        d.memes.push(meme);
        Ok((StatusCode::CREATED, Json(json!({ "meme": body }))))
    })
}

#[derive(Deserialize)]
struct UpdateBody {
    title: String,
    caption: String,
    category: String,
}

fn owned_meme(d: &mut MockData, id: i64, user_id: i64) -> Result<usize, ApiError> {
    let index = d
        .memes
        .iter()
        .position(|m| m.id == id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Meme not found"))?;
    if d.memes[index].uploader_id != user_id {
        return Err(error(StatusCode::FORBIDDEN, "Not authorized to modify this meme"));
    }
    Ok(index)
}

async fn update_meme(
    State(state): State<MockState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<UpdateBody>,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    state.with(|d| {
        let index = owned_meme(d, id, user_id)?;
        let meme = &mut d.memes[index];
        meme.title = body.title;
        meme.caption = body.caption;
        meme.category = body.category;
        Ok(Json(json!({ "message": "Meme updated" })))
    })
}

async fn delete_meme(
    State(state): State<MockState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    state.with(|d| {
        let index = owned_meme(d, id, user_id)?;
        d.memes.remove(index);
        d.reactions.retain(|(m, _), _| *m != id);
        Ok(Json(json!({ "message": "Meme deleted" })))
    })
}

// --- Reaction handlers ---

async fn get_reactions(
    State(state): State<MockState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Json<Value> {
    let viewer = authenticate(&state, &headers).ok();
    state.with(|d| {
        let mut counts = json!({ "laugh": 0, "robot": 0, "think": 0 });
        let mut reactions = Vec::new();
        let mut entries: Vec<(&(i64, i64), &String)> =
            d.reactions.iter().filter(|((m, _), _)| *m == id).collect();
        entries.sort();
        for ((_, user_id), kind) in entries {
            counts[kind.as_str()] = json!(counts[kind.as_str()].as_i64().unwrap_or(0) + 1);
            reactions.push(json!({ "user_id": user_id, "reaction_type": kind }));
        }
        let mut body = json!({ "counts": counts, "reactions": reactions });
        if d.send_my_reaction {
            body["my_reaction"] = viewer
                .and_then(|v| d.reactions.get(&(id, v)))
                .map(|k| json!(k))
                .unwrap_or(Value::Null);
        }
        Json(body)
    })
}

#[derive(Deserialize)]
struct ReactionBody {
    reaction_type: String,
}

async fn add_reaction(
    State(state): State<MockState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<ReactionBody>,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    if !["laugh", "robot", "think"].contains(&body.reaction_type.as_str()) {
        return Err(error(StatusCode::BAD_REQUEST, "Invalid reaction type"));
    }
    state.with(|d| {
        if !d.memes.iter().any(|m| m.id == id) {
            return Err(error(StatusCode::NOT_FOUND, "Meme not found"));
        }
        d.reactions.insert((id, user_id), body.reaction_type);
        Ok(Json(json!({ "message": "Reaction added" })))
    })
}
