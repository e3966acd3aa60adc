//! Resource services - one per exposed entity.
//!
//! Each operation receives the caller explicitly as `Option<&Principal>`
//! and performs, in order: authentication check, lookup, authorization,
//! validation, write.

mod comment;
mod follow;
mod group;
mod post;

use std::sync::Arc;

pub use comment::{CommentInput, CommentService};
pub use follow::{FollowInput, FollowService, search_terms};
pub use group::{GroupInput, GroupService};
pub use post::{PostInput, PostService};

use crate::ports::{
    CommentRepository, FollowRepository, GroupRepository, ImageStore, PostRepository,
    UserRepository,
};

/// Repository handles backing the services.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
}

/// All resource services wired to one set of repositories.
#[derive(Clone)]
pub struct Services {
    pub groups: GroupService,
    pub posts: PostService,
    pub comments: CommentService,
    pub follows: FollowService,
}

impl Services {
    pub fn new(repos: &Repositories, images: Arc<dyn ImageStore>) -> Self {
        Self {
            groups: GroupService::new(repos.groups.clone()),
            posts: PostService::new(repos.posts.clone(), repos.groups.clone(), images),
            comments: CommentService::new(repos.posts.clone(), repos.comments.clone()),
            follows: FollowService::new(repos.users.clone(), repos.follows.clone()),
        }
    }
}
