//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod blog;
pub mod comment;
pub mod dispatcher;
pub mod following;
pub mod like;
pub mod mailer;
pub mod notification;
pub mod privacy;
pub mod profile;

pub use account::{AccountService, SignupInput, UpdateProfileInput};
pub use blog::{BlogService, BlogView, CreateBlogInput};
pub use comment::{CommentService, CommentView, CreateCommentInput};
pub use dispatcher::{
    ConnectionId, ConnectionSender, DispatchMessage, Dispatcher, DispatcherService,
    NoOpDispatcher, RoomRegistry,
};
pub use following::{FollowRequestView, FollowingService};
pub use like::{LikeService, LikeToggle};
pub use mailer::{LogMailer, Mailer, MailerService, OutgoingMail, SmtpMailer};
pub use notification::{NotificationEvent, NotificationService};
pub use privacy::{RelationStatus, can_view_posts};
pub use profile::{ProfileService, ProfileView};
