pub mod hub;
pub mod notification;

pub use hub::NotificationHub;
