use std::sync::Arc;

use crate::domain::{Follow, NewFollow, Principal};
use crate::error::{DomainError, RepoError};
use crate::policy::require_authenticated;
use crate::ports::{FollowRepository, UserRepository};
use crate::validation::{NON_FIELD, Validate, collect, into_result, not_blank, trimmed};

const DUPLICATE: &str = "The fields user, following must make a unique set.";
const SELF_FOLLOW: &str = "You cannot follow yourself.";

#[derive(Debug, Clone, Default, Validate)]
pub struct FollowInput {
    /// Username of the author to follow.
    #[validate(required(message = "This field is required."), custom(function = "not_blank"))]
    pub following: Option<String>,
}

/// Subscriptions of the calling user. Every operation requires a principal.
#[derive(Clone)]
pub struct FollowService {
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl FollowService {
    pub fn new(users: Arc<dyn UserRepository>, follows: Arc<dyn FollowRepository>) -> Self {
        Self { users, follows }
    }

    pub async fn list(
        &self,
        principal: Option<&Principal>,
        search: Option<&str>,
    ) -> Result<Vec<Follow>, DomainError> {
        let principal = require_authenticated(principal)?;
        let terms = search.map(search_terms).unwrap_or_default();
        Ok(self.follows.list_for_user(principal.user_id, &terms).await?)
    }

    pub async fn create(
        &self,
        principal: Option<&Principal>,
        input: FollowInput,
    ) -> Result<Follow, DomainError> {
        let principal = require_authenticated(principal)?;

        let input = FollowInput {
            following: trimmed(input.following),
        };
        into_result(collect(&input))?;
        let Some(username) = input.following else {
            return Err(DomainError::Internal("follow validation incomplete".into()));
        };

        let Some(target) = self.users.find_by_username(&username).await? else {
            return Err(DomainError::invalid(
                "following",
                format!("Object with username={username} does not exist."),
            ));
        };
        if target.id == principal.user_id {
            return Err(DomainError::invalid("following", SELF_FOLLOW));
        }
        if self.follows.exists(principal.user_id, target.id).await? {
            return Err(DomainError::invalid(NON_FIELD, DUPLICATE));
        }

        let follow = self
            .follows
            .create(NewFollow {
                user_id: principal.user_id,
                following_id: target.id,
            })
            .await
            .map_err(|e| match e {
                RepoError::Constraint(_) => DomainError::invalid(NON_FIELD, DUPLICATE),
                other => other.into(),
            })?;

        tracing::info!(user = %principal.username, following = %target.username, "Follow created");
        Ok(follow)
    }
}

/// Split a search query into terms on whitespace and commas.
pub fn search_terms(search: &str) -> Vec<String> {
    search
        .replace('\0', "")
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}
