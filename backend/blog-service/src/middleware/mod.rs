pub mod auth;
pub mod cache;

pub use auth::AuthUser;
pub use cache::ResponseCache;
