pub mod images;
pub mod listing;
pub mod ownership;
