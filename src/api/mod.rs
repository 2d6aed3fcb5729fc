pub mod client;
pub mod endpoints;
pub mod events;

pub use client::ApiClient;
pub use endpoints::{ImagePayload, MemeQuery, NewMeme};
pub use events::AuthEvent;
