//! PostgreSQL repository implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};

use yatube_core::Repositories;
use yatube_core::domain::{
    Comment, Follow, Group, NewComment, NewFollow, NewGroup, NewPost, NewUser, Post, PostChanges,
    User, UserRef,
};
use yatube_core::error::RepoError;
use yatube_core::pagination::{Page, PageRequest};
use yatube_core::ports::{
    BaseRepository, CommentRepository, FollowRepository, GroupRepository, PostRepository,
    UserRepository,
};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::follow::{self, Entity as FollowEntity};
use super::entity::group::{self, Entity as GroupEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, ensure_deleted, repo_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL group repository.
pub type PostgresGroupRepository = PostgresBaseRepository<GroupEntity>;

/// Wire every repository to one connection pool.
pub fn postgres_repositories(db: DbConn) -> Repositories {
    Repositories {
        users: Arc::new(PostgresUserRepository::new(db.clone())),
        groups: Arc::new(PostgresGroupRepository::new(db.clone())),
        posts: Arc::new(PostgresPostRepository::new(db.clone())),
        comments: Arc::new(PostgresCommentRepository::new(db.clone())),
        follows: Arc::new(PostgresFollowRepository::new(db)),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(%username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let model = user::ActiveModel {
            username: Set(new_user.username),
            password_hash: Set(new_user.password_hash),
            date_joined: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(repo_error)?;

        Ok(model.into())
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn list(&self) -> Result<Vec<Group>, RepoError> {
        let result = GroupEntity::find()
            .order_by_asc(group::Column::Id)
            .all(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let result = GroupEntity::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, new_group: NewGroup) -> Result<Group, RepoError> {
        let model = group::ActiveModel {
            title: Set(new_group.title),
            slug: Set(new_group.slug),
            description: Set(new_group.description),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(repo_error)?;

        Ok(model.into())
    }
}

fn post_with_author((post, author): (post::Model, Option<user::Model>)) -> Result<Post, RepoError> {
    let author = author
        .ok_or_else(|| RepoError::Query(format!("post {} has no author row", post.id)))?;
    Ok(post.into_domain(UserRef::from(&author)))
}

/// PostgreSQL post repository. Rows are loaded together with their author.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BaseRepository<Post, i64> for PostgresPostRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let row = PostEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(&self.db)
            .await
            .map_err(repo_error)?;

        row.map(post_with_author).transpose()
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let result = PostEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(repo_error)?;
        ensure_deleted(result)
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn page(&self, page: PageRequest) -> Result<Page<Post>, RepoError> {
        let count = PostEntity::find()
            .count(&self.db)
            .await
            .map_err(repo_error)?;

        let rows = PostEntity::find()
            .find_also_related(UserEntity)
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.db)
            .await
            .map_err(repo_error)?;

        let items = rows
            .into_iter()
            .map(post_with_author)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page { count, items })
    }

    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let model = post::ActiveModel {
            text: Set(new_post.text),
            pub_date: Set(Utc::now().into()),
            author_id: Set(new_post.author_id),
            image: Set(new_post.image),
            group_id: Set(new_post.group_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(repo_error)?;

        self.find_by_id(model.id).await?.ok_or(RepoError::NotFound)
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError> {
        let model = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repo_error)?
            .ok_or(RepoError::NotFound)?;

        let mut active: post::ActiveModel = model.into();
        if let Some(text) = changes.text {
            active.text = Set(text);
        }
        if let Some(image) = changes.image {
            active.image = Set(image);
        }
        if let Some(group_id) = changes.group_id {
            active.group_id = Set(group_id);
        }
        if active.is_changed() {
            active.update(&self.db).await.map_err(repo_error)?;
        }

        self.find_by_id(id).await?.ok_or(RepoError::NotFound)
    }
}

fn comment_with_author(
    (comment, author): (comment::Model, Option<user::Model>),
) -> Result<Comment, RepoError> {
    let author = author
        .ok_or_else(|| RepoError::Query(format!("comment {} has no author row", comment.id)))?;
    Ok(comment.into_domain(UserRef::from(&author)))
}

/// PostgreSQL comment repository.
pub struct PostgresCommentRepository {
    db: DbConn,
}

impl PostgresCommentRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BaseRepository<Comment, i64> for PostgresCommentRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, RepoError> {
        let row = CommentEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(&self.db)
            .await
            .map_err(repo_error)?;

        row.map(comment_with_author).transpose()
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let result = CommentEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(repo_error)?;
        ensure_deleted(result)
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .find_also_related(UserEntity)
            .order_by_desc(comment::Column::Created)
            .order_by_desc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(repo_error)?;

        rows.into_iter().map(comment_with_author).collect()
    }

    async fn create(&self, new_comment: NewComment) -> Result<Comment, RepoError> {
        let model = comment::ActiveModel {
            author_id: Set(new_comment.author_id),
            post_id: Set(new_comment.post_id),
            text: Set(new_comment.text),
            created: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(repo_error)?;

        self.find_by_id(model.id).await?.ok_or(RepoError::NotFound)
    }

    async fn update_text(&self, id: i64, text: String) -> Result<Comment, RepoError> {
        let model = CommentEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repo_error)?
            .ok_or(RepoError::NotFound)?;

        let mut active: comment::ActiveModel = model.into();
        active.text = Set(text);
        active.update(&self.db).await.map_err(repo_error)?;

        self.find_by_id(id).await?.ok_or(RepoError::NotFound)
    }
}

/// PostgreSQL follow repository.
pub struct PostgresFollowRepository {
    db: DbConn,
}

impl PostgresFollowRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Attach both user rows to each follow.
    async fn with_users(&self, follows: Vec<follow::Model>) -> Result<Vec<Follow>, RepoError> {
        let ids: Vec<i64> = follows
            .iter()
            .flat_map(|f| [f.user_id, f.following_id])
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users: HashMap<i64, UserRef> = UserEntity::find()
            .filter(user::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(repo_error)?
            .iter()
            .map(|u| (u.id, UserRef::from(u)))
            .collect();

        let lookup = |id: i64| {
            users
                .get(&id)
                .cloned()
                .ok_or_else(|| RepoError::Query(format!("follow references missing user {id}")))
        };

        follows
            .into_iter()
            .map(|f| -> Result<Follow, RepoError> {
                Ok(Follow {
                    id: f.id,
                    user: lookup(f.user_id)?,
                    following: lookup(f.following_id)?,
                })
            })
            .collect()
    }
}

/// Escape `LIKE` wildcards so a search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn list_for_user(
        &self,
        user_id: i64,
        search_terms: &[String],
    ) -> Result<Vec<Follow>, RepoError> {
        let mut query = FollowEntity::find()
            .filter(follow::Column::UserId.eq(user_id))
            .join(JoinType::InnerJoin, follow::Relation::Following.def())
            .order_by_asc(follow::Column::Id);

        for term in search_terms {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            query = query.filter(
                Expr::expr(Func::lower(Expr::col((UserEntity, user::Column::Username))))
                    .like(LikeExpr::new(pattern).escape('\\')),
            );
        }

        let follows = query.all(&self.db).await.map_err(repo_error)?;
        self.with_users(follows).await
    }

    async fn exists(&self, user_id: i64, following_id: i64) -> Result<bool, RepoError> {
        let count = FollowEntity::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::FollowingId.eq(following_id))
            .count(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(count > 0)
    }

    async fn create(&self, new_follow: NewFollow) -> Result<Follow, RepoError> {
        let model = follow::ActiveModel {
            user_id: Set(new_follow.user_id),
            following_id: Set(new_follow.following_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(repo_error)?;

        self.with_users(vec![model])
            .await?
            .pop()
            .ok_or(RepoError::NotFound)
    }
}
