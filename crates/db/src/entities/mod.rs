//! Database entities.

#![allow(missing_docs)]

pub mod blog;
pub mod comment;
pub mod follow_edge;
pub mod like;
pub mod notification;
pub mod user;

pub use blog::Entity as Blog;
pub use comment::Entity as Comment;
pub use follow_edge::Entity as FollowEdge;
pub use like::Entity as Like;
pub use notification::Entity as Notification;
pub use user::Entity as User;
