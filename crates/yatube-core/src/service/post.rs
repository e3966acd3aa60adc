use std::sync::Arc;

use crate::domain::{NewPost, Post, PostChanges, Principal};
use crate::error::{DomainError, RepoError};
use crate::pagination::{Page, PageRequest};
use crate::policy::{Access, authorize, require_authenticated};
use crate::ports::{GroupRepository, ImageStore, PostRepository};
use crate::validation::{
    DecodedImage, REQUIRED, Validate, collect, decode_image, field_error, into_result, not_blank,
    trimmed,
};

/// Post fields as submitted by a client.
///
/// The outer `Option` of `group` and `image` tells whether the field was
/// sent at all; the inner one distinguishes an explicit `null`.
#[derive(Debug, Clone, Default, Validate)]
pub struct PostInput {
    #[validate(custom(function = "not_blank"))]
    pub text: Option<String>,
    pub group: Option<Option<i64>>,
    pub image: Option<Option<String>>,
}

struct ValidatedPost {
    text: Option<String>,
    group_id: Option<Option<i64>>,
    image: Option<Option<DecodedImage>>,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    images: Arc<dyn ImageStore>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            posts,
            groups,
            images,
        }
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<Post>, DomainError> {
        Ok(self.posts.page(page).await?)
    }

    pub async fn retrieve(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    /// Publish a post authored by the caller.
    pub async fn create(
        &self,
        principal: Option<&Principal>,
        input: PostInput,
    ) -> Result<Post, DomainError> {
        let principal = require_authenticated(principal)?;
        let validated = self.validate(input, false).await?;

        let text = validated
            .text
            .ok_or_else(|| DomainError::invalid("text", REQUIRED))?;
        let image = self.store_image(validated.image).await?.flatten();

        let created = self
            .posts
            .create(NewPost {
                text,
                author_id: principal.user_id,
                image: image.clone(),
                group_id: validated.group_id.flatten(),
            })
            .await;
        let post = match created {
            Ok(post) => post,
            Err(e) => {
                self.discard_image(image.as_deref()).await;
                return Err(e.into());
            }
        };

        tracing::info!(post_id = post.id, author = %principal.username, "Post created");
        Ok(post)
    }

    /// Full (`partial == false`) or partial update by the author.
    pub async fn update(
        &self,
        principal: Option<&Principal>,
        id: i64,
        input: PostInput,
        partial: bool,
    ) -> Result<Post, DomainError> {
        self.editable(principal, id).await?;

        let validated = self.validate(input, partial).await?;
        let image = self.store_image(validated.image).await?;
        let stored = image.clone().flatten();
        let changes = PostChanges {
            text: validated.text,
            image,
            group_id: validated.group_id,
        };

        match self.posts.update(id, changes).await {
            Ok(post) => Ok(post),
            Err(e) => {
                self.discard_image(stored.as_deref()).await;
                Err(match e {
                    RepoError::NotFound => DomainError::not_found("Post", id),
                    other => other.into(),
                })
            }
        }
    }

    pub async fn destroy(&self, principal: Option<&Principal>, id: i64) -> Result<(), DomainError> {
        let principal = require_authenticated(principal)?;
        self.editable(Some(principal), id).await?;

        self.posts.delete(id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::not_found("Post", id),
            other => other.into(),
        })?;

        tracing::info!(post_id = id, author = %principal.username, "Post deleted");
        Ok(())
    }

    /// The post `id`, provided `principal` may change it.
    ///
    /// Checks authentication, then existence, then authorship.
    pub async fn editable(&self, principal: Option<&Principal>, id: i64) -> Result<Post, DomainError> {
        let principal = require_authenticated(principal)?;
        let post = self.retrieve(id).await?;
        authorize(Some(principal), Access::Write, &post)?;
        Ok(post)
    }

    async fn validate(&self, input: PostInput, partial: bool) -> Result<ValidatedPost, DomainError> {
        let input = PostInput {
            text: trimmed(input.text),
            ..input
        };
        let mut errors = collect(&input);

        if !partial && input.text.is_none() {
            errors.add("text", field_error("required", REQUIRED));
        }

        if let Some(Some(group_id)) = input.group {
            if self.groups.find_by_id(group_id).await?.is_none() {
                errors.add(
                    "group",
                    field_error(
                        "does_not_exist",
                        format!("Invalid pk \"{group_id}\" - object does not exist."),
                    ),
                );
            }
        }

        let image = match input.image {
            Some(Some(data)) => match decode_image(&data) {
                Ok(image) => Some(Some(image)),
                Err(message) => {
                    errors.add("image", field_error("invalid_image", message));
                    None
                }
            },
            Some(None) => Some(None),
            None => None,
        };

        into_result(errors)?;
        Ok(ValidatedPost {
            text: input.text,
            group_id: input.group,
            image,
        })
    }

    async fn discard_image(&self, path: Option<&str>) {
        let Some(path) = path else { return };
        if let Err(e) = self.images.delete(path).await {
            tracing::warn!(error = %e, %path, "Failed to remove orphaned image");
        }
    }

    async fn store_image(
        &self,
        image: Option<Option<DecodedImage>>,
    ) -> Result<Option<Option<String>>, DomainError> {
        match image {
            Some(Some(image)) => {
                let path = self
                    .images
                    .save(image)
                    .await
                    .map_err(|e| DomainError::Internal(e.to_string()))?;
                Ok(Some(Some(path)))
            }
            Some(None) => Ok(Some(None)),
            None => Ok(None),
        }
    }
}
