pub mod comments;
pub mod posts;
pub mod uploads;
pub mod users;
