pub mod comment;
pub mod like;
pub mod notification;
pub mod post;
pub mod user;

pub use comment::{Entity as Comment, Model as CommentModel};
pub use like::{Entity as Like, Model as LikeModel};
pub use notification::{Entity as Notification, Model as NotificationModel};
pub use post::{Entity as Post, Model as PostModel};
pub use user::{Entity as User, Model as UserModel};
