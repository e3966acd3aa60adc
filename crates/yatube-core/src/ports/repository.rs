use async_trait::async_trait;

use crate::domain::{
    Comment, Follow, Group, NewComment, NewFollow, NewGroup, NewPost, NewUser, Post, PostChanges,
    User,
};
use crate::error::RepoError;
use crate::pagination::{Page, PageRequest};

/// Generic repository trait shared by every addressable entity.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Delete an entity by its ID, applying the store's referential actions.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with account-specific lookups.
#[async_trait]
pub trait UserRepository: BaseRepository<User, i64> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Insert a user. A taken username yields `RepoError::Constraint`.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;
}

/// Group repository.
#[async_trait]
pub trait GroupRepository: BaseRepository<Group, i64> {
    async fn list(&self) -> Result<Vec<Group>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;

    /// Insert a group. A taken slug yields `RepoError::Constraint`.
    async fn create(&self, group: NewGroup) -> Result<Group, RepoError>;
}

/// Post repository. Listings are ordered newest first.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i64> {
    async fn page(&self, page: PageRequest) -> Result<Page<Post>, RepoError>;

    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    /// Apply `changes`; `pub_date` and the author are never touched.
    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError>;
}

/// Comment repository. Listings are ordered newest first.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, i64> {
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, RepoError>;

    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError>;

    async fn update_text(&self, id: i64, text: String) -> Result<Comment, RepoError>;
}

/// Follow repository.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Follows of `user_id` whose target username contains every term
    /// (case-insensitive).
    async fn list_for_user(
        &self,
        user_id: i64,
        search_terms: &[String],
    ) -> Result<Vec<Follow>, RepoError>;

    async fn exists(&self, user_id: i64, following_id: i64) -> Result<bool, RepoError>;

    /// Insert a follow. An existing pair yields `RepoError::Constraint`.
    async fn create(&self, follow: NewFollow) -> Result<Follow, RepoError>;
}
