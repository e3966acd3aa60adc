use std::sync::Arc;

use crate::domain::{Group, NewGroup};
use crate::error::{DomainError, RepoError};
use crate::ports::GroupRepository;
use crate::validation::{SLUG_RE, Validate, collect, field_error, into_result, not_blank, trimmed};

/// Group fields as submitted by an operator.
#[derive(Debug, Clone, Default, Validate)]
pub struct GroupInput {
    #[validate(
        required(message = "This field is required."),
        custom(function = "not_blank"),
        length(max = 128, message = "Ensure this field has no more than 128 characters.")
    )]
    pub title: Option<String>,
    #[validate(
        required(message = "This field is required."),
        custom(function = "not_blank"),
        length(max = 50, message = "Ensure this field has no more than 50 characters."),
        regex(
            path = *SLUG_RE,
            message = "Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens."
        )
    )]
    pub slug: Option<String>,
    #[validate(required(message = "This field is required."), custom(function = "not_blank"))]
    pub description: Option<String>,
}

/// Read-only over HTTP; `create` serves out-of-band management.
#[derive(Clone)]
pub struct GroupService {
    groups: Arc<dyn GroupRepository>,
}

impl GroupService {
    pub fn new(groups: Arc<dyn GroupRepository>) -> Self {
        Self { groups }
    }

    pub async fn list(&self) -> Result<Vec<Group>, DomainError> {
        Ok(self.groups.list().await?)
    }

    pub async fn retrieve(&self, id: i64) -> Result<Group, DomainError> {
        self.groups
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Group", id))
    }

    pub async fn create(&self, input: GroupInput) -> Result<Group, DomainError> {
        let group = self.validate(input).await?;

        let created = self.groups.create(group).await.map_err(|e| match e {
            RepoError::Constraint(_) => DomainError::invalid("slug", SLUG_TAKEN),
            other => other.into(),
        })?;

        tracing::info!(group_id = created.id, slug = %created.slug, "Group created");
        Ok(created)
    }

    async fn validate(&self, input: GroupInput) -> Result<NewGroup, DomainError> {
        let input = GroupInput {
            title: trimmed(input.title),
            slug: trimmed(input.slug),
            description: trimmed(input.description),
        };
        let mut errors = collect(&input);

        if let Some(slug) = &input.slug {
            let slug_ok = !errors.field_errors().contains_key("slug");
            if slug_ok && self.groups.find_by_slug(slug).await?.is_some() {
                errors.add("slug", field_error("unique", SLUG_TAKEN));
            }
        }

        into_result(errors)?;
        match (input.title, input.slug, input.description) {
            (Some(title), Some(slug), Some(description)) => Ok(NewGroup {
                title,
                slug,
                description,
            }),
            _ => Err(DomainError::Internal("group validation incomplete".into())),
        }
    }
}

const SLUG_TAKEN: &str = "group with this slug already exists.";
