use std::sync::Arc;

use crate::domain::{Comment, NewComment, Post, Principal};
use crate::error::{DomainError, RepoError};
use crate::policy::{Access, authorize, require_authenticated};
use crate::ports::{CommentRepository, PostRepository};
use crate::validation::{REQUIRED, Validate, collect, field_error, into_result, not_blank, trimmed};

#[derive(Debug, Clone, Default, Validate)]
pub struct CommentInput {
    #[validate(custom(function = "not_blank"))]
    pub text: Option<String>,
}

/// Comments nested under a post. The parent post always comes from the
/// request path, never from the body.
#[derive(Clone)]
pub struct CommentService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(posts: Arc<dyn PostRepository>, comments: Arc<dyn CommentRepository>) -> Self {
        Self { posts, comments }
    }

    pub async fn list(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        self.resolve_post(post_id).await?;
        Ok(self.comments.list_for_post(post_id).await?)
    }

    pub async fn retrieve(&self, post_id: i64, id: i64) -> Result<Comment, DomainError> {
        self.resolve_post(post_id).await?;
        self.comments
            .find_by_id(id)
            .await?
            .filter(|comment| comment.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("Comment", id))
    }

    pub async fn create(
        &self,
        principal: Option<&Principal>,
        post_id: i64,
        input: CommentInput,
    ) -> Result<Comment, DomainError> {
        let principal = require_authenticated(principal)?;
        let post = self.commentable(Some(principal), post_id).await?;
        let text = validate(input, false)?.ok_or_else(|| DomainError::invalid("text", REQUIRED))?;

        let comment = self
            .comments
            .create(NewComment {
                author_id: principal.user_id,
                post_id: post.id,
                text,
            })
            .await?;

        tracing::info!(comment_id = comment.id, post_id, "Comment created");
        Ok(comment)
    }

    pub async fn update(
        &self,
        principal: Option<&Principal>,
        post_id: i64,
        id: i64,
        input: CommentInput,
        partial: bool,
    ) -> Result<Comment, DomainError> {
        let comment = self.editable(principal, post_id, id).await?;

        match validate(input, partial)? {
            Some(text) => self.comments.update_text(id, text).await.map_err(|e| match e {
                RepoError::NotFound => DomainError::not_found("Comment", id),
                other => other.into(),
            }),
            None => Ok(comment),
        }
    }

    pub async fn destroy(
        &self,
        principal: Option<&Principal>,
        post_id: i64,
        id: i64,
    ) -> Result<(), DomainError> {
        self.editable(principal, post_id, id).await?;

        self.comments.delete(id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::not_found("Comment", id),
            other => other.into(),
        })
    }

    /// The post a comment would be attached to, once the caller is known.
    pub async fn commentable(
        &self,
        principal: Option<&Principal>,
        post_id: i64,
    ) -> Result<Post, DomainError> {
        require_authenticated(principal)?;
        self.resolve_post(post_id).await
    }

    /// The comment `id` under `post_id`, provided `principal` wrote it.
    pub async fn editable(
        &self,
        principal: Option<&Principal>,
        post_id: i64,
        id: i64,
    ) -> Result<Comment, DomainError> {
        let principal = require_authenticated(principal)?;
        let comment = self.retrieve(post_id, id).await?;
        authorize(Some(principal), Access::Write, &comment)?;
        Ok(comment)
    }

    async fn resolve_post(&self, post_id: i64) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))
    }
}

fn validate(input: CommentInput, partial: bool) -> Result<Option<String>, DomainError> {
    let input = CommentInput {
        text: trimmed(input.text),
    };
    let mut errors = collect(&input);
    if !partial && input.text.is_none() {
        errors.add("text", field_error("required", REQUIRED));
    }
    into_result(errors)?;
    Ok(input.text)
}
