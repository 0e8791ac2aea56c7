pub mod auth;
pub mod comment;
pub mod like;
pub mod notification;
pub mod post;
pub mod user;

pub use auth::*;
