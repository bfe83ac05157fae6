pub mod feed;
pub mod ids;
pub mod message;
pub mod post;
pub mod user;
