// Library exports for memehub
// The binary and the integration tests both build on these modules

pub mod api;
pub mod config;
pub mod controllers;
pub mod error;
pub mod forms;
pub mod models;
pub mod nav;
pub mod prompt;
pub mod render;
pub mod session;
pub mod storage;
