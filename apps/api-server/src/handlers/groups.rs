use actix_web::{HttpResponse, web};

use yatube_core::domain::Group;
use yatube_shared::dto::GroupResponse;

use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn render(group: Group) -> GroupResponse {
    GroupResponse {
        id: group.id,
        title: group.title,
        slug: group.slug,
        description: group.description,
    }
}

/// GET /api/v1/groups/
pub async fn list(
    state: web::Data<AppState>,
    _identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let groups = state.services.groups.list().await?;
    Ok(HttpResponse::Ok().json(groups.into_iter().map(render).collect::<Vec<_>>()))
}

/// GET /api/v1/groups/{id}/
pub async fn retrieve(
    state: web::Data<AppState>,
    _identity: OptionalIdentity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let group = state.services.groups.retrieve(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(render(group)))
}
