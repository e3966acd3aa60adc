//! In-process store - used when no database is configured and in tests.
//!
//! Mirrors the relational schema: identifiers come from per-table
//! sequences, and deletes apply the same referential actions as the
//! PostgreSQL foreign keys (cascade for authors, posts and follow
//! endpoints, set-null for groups).
//! Note: Data is lost on process restart.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

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

struct PostRow {
    id: i64,
    text: String,
    pub_date: DateTime<Utc>,
    author_id: i64,
    image: Option<String>,
    group_id: Option<i64>,
}

struct CommentRow {
    id: i64,
    author_id: i64,
    post_id: i64,
    text: String,
    created: DateTime<Utc>,
}

struct FollowRow {
    id: i64,
    user_id: i64,
    following_id: i64,
}

#[derive(Default)]
struct Sequences {
    users: i64,
    groups: i64,
    posts: i64,
    comments: i64,
    follows: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Default)]
struct Tables {
    seq: Sequences,
    users: BTreeMap<i64, User>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, PostRow>,
    comments: BTreeMap<i64, CommentRow>,
    follows: BTreeMap<i64, FollowRow>,
}

impl Tables {
    fn user_ref(&self, id: i64) -> Result<UserRef, RepoError> {
        self.users
            .get(&id)
            .map(User::to_ref)
            .ok_or_else(|| RepoError::Query(format!("dangling reference to user {id}")))
    }

    fn post(&self, row: &PostRow) -> Result<Post, RepoError> {
        Ok(Post {
            id: row.id,
            text: row.text.clone(),
            pub_date: row.pub_date,
            author: self.user_ref(row.author_id)?,
            image: row.image.clone(),
            group_id: row.group_id,
        })
    }

    fn comment(&self, row: &CommentRow) -> Result<Comment, RepoError> {
        Ok(Comment {
            id: row.id,
            author: self.user_ref(row.author_id)?,
            post_id: row.post_id,
            text: row.text.clone(),
            created: row.created,
        })
    }

    fn follow(&self, row: &FollowRow) -> Result<Follow, RepoError> {
        Ok(Follow {
            id: row.id,
            user: self.user_ref(row.user_id)?,
            following: self.user_ref(row.following_id)?,
        })
    }

    fn require_user(&self, id: i64) -> Result<(), RepoError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(RepoError::Constraint(format!("user {id} does not exist")))
        }
    }

    /// Remove a post together with its comments.
    fn remove_post(&mut self, id: i64) -> bool {
        self.comments.retain(|_, c| c.post_id != id);
        self.posts.remove(&id).is_some()
    }
}

/// Thread-safe in-memory implementation of every repository port.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose the store through the repository ports.
    pub fn into_repositories(self: Arc<Self>) -> Repositories {
        Repositories {
            users: self.clone(),
            groups: self.clone(),
            posts: self.clone(),
            comments: self.clone(),
            follows: self,
        }
    }
}

#[async_trait]
impl BaseRepository<User, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let authored: Vec<i64> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|_, c| c.author_id != id);
        tables
            .follows
            .retain(|_, f| f.user_id != id && f.following_id != id);

        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == new_user.username) {
            return Err(RepoError::Constraint("users_username_key".into()));
        }

        let user = User {
            id: next(&mut tables.seq.users),
            username: new_user.username,
            password_hash: new_user.password_hash,
            date_joined: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl BaseRepository<Group, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, RepoError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.groups.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn list(&self) -> Result<Vec<Group>, RepoError> {
        Ok(self.tables.read().await.groups.values().cloned().collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn create(&self, new_group: NewGroup) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.groups.values().any(|g| g.slug == new_group.slug) {
            return Err(RepoError::Constraint("groups_slug_key".into()));
        }

        let group = Group {
            id: next(&mut tables.seq.groups),
            title: new_group.title,
            slug: new_group.slug,
            description: new_group.description,
        };
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }
}

#[async_trait]
impl BaseRepository<Post, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        tables.posts.get(&id).map(|row| tables.post(row)).transpose()
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.remove_post(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn page(&self, page: PageRequest) -> Result<Page<Post>, RepoError> {
        let tables = self.tables.read().await;

        let mut rows: Vec<&PostRow> = tables.posts.values().collect();
        rows.sort_by(|a, b| (b.pub_date, b.id).cmp(&(a.pub_date, a.id)));

        let items = rows
            .into_iter()
            .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit).unwrap_or(usize::MAX))
            .map(|row| tables.post(row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            count: tables.posts.len() as u64,
            items,
        })
    }

    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.require_user(new_post.author_id)?;
        if let Some(group_id) = new_post.group_id {
            if !tables.groups.contains_key(&group_id) {
                return Err(RepoError::Constraint(format!("group {group_id} does not exist")));
            }
        }

        let row = PostRow {
            id: next(&mut tables.seq.posts),
            text: new_post.text,
            pub_date: Utc::now(),
            author_id: new_post.author_id,
            image: new_post.image,
            group_id: new_post.group_id,
        };
        let post = tables.post(&row)?;
        tables.posts.insert(row.id, row);
        Ok(post)
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if let Some(Some(group_id)) = changes.group_id {
            if !tables.groups.contains_key(&group_id) {
                return Err(RepoError::Constraint(format!("group {group_id} does not exist")));
            }
        }

        let row = tables.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        if let Some(text) = changes.text {
            row.text = text;
        }
        if let Some(image) = changes.image {
            row.image = image;
        }
        if let Some(group_id) = changes.group_id {
            row.group_id = group_id;
        }

        let row = tables.posts.get(&id).ok_or(RepoError::NotFound)?;
        tables.post(row)
    }
}

#[async_trait]
impl BaseRepository<Comment, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, RepoError> {
        let tables = self.tables.read().await;
        tables
            .comments
            .get(&id)
            .map(|row| tables.comment(row))
            .transpose()
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;

        let mut rows: Vec<&CommentRow> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        rows.sort_by(|a, b| (b.created, b.id).cmp(&(a.created, a.id)));

        rows.into_iter().map(|row| tables.comment(row)).collect()
    }

    async fn create(&self, new_comment: NewComment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        tables.require_user(new_comment.author_id)?;
        if !tables.posts.contains_key(&new_comment.post_id) {
            return Err(RepoError::Constraint(format!(
                "post {} does not exist",
                new_comment.post_id
            )));
        }

        let row = CommentRow {
            id: next(&mut tables.seq.comments),
            author_id: new_comment.author_id,
            post_id: new_comment.post_id,
            text: new_comment.text,
            created: Utc::now(),
        };
        let comment = tables.comment(&row)?;
        tables.comments.insert(row.id, row);
        Ok(comment)
    }

    async fn update_text(&self, id: i64, text: String) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        let row = tables.comments.get_mut(&id).ok_or(RepoError::NotFound)?;
        row.text = text;

        let row = tables.comments.get(&id).ok_or(RepoError::NotFound)?;
        tables.comment(row)
    }
}

#[async_trait]
impl FollowRepository for InMemoryStore {
    async fn list_for_user(
        &self,
        user_id: i64,
        search_terms: &[String],
    ) -> Result<Vec<Follow>, RepoError> {
        let tables = self.tables.read().await;
        let terms: Vec<String> = search_terms.iter().map(|t| t.to_lowercase()).collect();

        tables
            .follows
            .values()
            .filter(|f| f.user_id == user_id)
            .map(|row| tables.follow(row))
            .filter(|follow| match follow {
                Ok(follow) => {
                    let username = follow.following.username.to_lowercase();
                    terms.iter().all(|term| username.contains(term.as_str()))
                }
                Err(_) => true,
            })
            .collect()
    }

    async fn exists(&self, user_id: i64, following_id: i64) -> Result<bool, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .values()
            .any(|f| f.user_id == user_id && f.following_id == following_id))
    }

    async fn create(&self, new_follow: NewFollow) -> Result<Follow, RepoError> {
        let mut tables = self.tables.write().await;
        tables.require_user(new_follow.user_id)?;
        tables.require_user(new_follow.following_id)?;
        if tables.follows.values().any(|f| {
            f.user_id == new_follow.user_id && f.following_id == new_follow.following_id
        }) {
            return Err(RepoError::Constraint("unique_follow".into()));
        }

        let row = FollowRow {
            id: next(&mut tables.seq.follows),
            user_id: new_follow.user_id,
            following_id: new_follow.following_id,
        };
        let follow = tables.follow(&row)?;
        tables.follows.insert(row.id, row);
        Ok(follow)
    }
}
