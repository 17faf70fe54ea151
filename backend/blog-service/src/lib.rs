//! Blog backend service
//!
//! REST API over users, posts and comments backed by PostgreSQL, with
//! JWT bearer authentication, authorship-gated mutations, a joined and
//! paginated post listing pipeline, image uploads and an optional
//! Redis response cache.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod security;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
