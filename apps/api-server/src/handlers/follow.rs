use actix_web::{HttpResponse, web};
use serde::Deserialize;

use yatube_core::domain::Follow;
use yatube_core::service::FollowInput;
use yatube_shared::dto::{FollowRequest, FollowResponse};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

fn render(follow: Follow) -> FollowResponse {
    FollowResponse {
        user: follow.user.username,
        following: follow.following.username,
    }
}

/// GET /api/v1/follow/?search=
pub async fn list(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let follows = state
        .services
        .follows
        .list(identity.principal(), query.search.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(follows.into_iter().map(render).collect::<Vec<_>>()))
}

/// POST /api/v1/follow/
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<FollowRequest>,
) -> AppResult<HttpResponse> {
    let follow = state
        .services
        .follows
        .create(
            Some(&identity.0),
            FollowInput {
                following: body.into_inner().following,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(render(follow)))
}
