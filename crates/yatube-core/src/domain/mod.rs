//! Domain entities - the core business objects.

mod comment;
mod follow;
mod group;
mod post;
mod principal;
mod user;

pub use comment::{Comment, NewComment};
pub use follow::{Follow, NewFollow};
pub use group::{Group, NewGroup};
pub use post::{NewPost, Post, PostChanges};
pub use principal::Principal;
pub use user::{NewUser, User, UserRef};

/// Resources owned by a single user.
pub trait Authored {
    fn author_id(&self) -> i64;
}
