pub mod comment;
pub mod like;
pub mod notification;
pub mod post;
pub mod push;
pub mod user;
