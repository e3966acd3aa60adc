use actix_web::{HttpResponse, web};

use yatube_core::domain::Comment;
use yatube_core::service::CommentInput;
use yatube_shared::dto::{CommentRequest, CommentResponse};

use super::{Body, accept};
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn render(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        author: comment.author.username,
        post: comment.post_id,
        text: comment.text,
        created: comment.created,
    }
}

/// GET /api/v1/posts/{post_id}/comments/
pub async fn list(
    state: web::Data<AppState>,
    _identity: OptionalIdentity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let comments = state.services.comments.list(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(comments.into_iter().map(render).collect::<Vec<_>>()))
}

/// POST /api/v1/posts/{post_id}/comments/
pub async fn create(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<i64>,
    body: Body<CommentRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let body = accept(
        body,
        state.services.comments.commentable(identity.principal(), post_id),
    )
    .await?;

    let comment = state
        .services
        .comments
        .create(identity.principal(), post_id, CommentInput { text: body.text })
        .await?;

    Ok(HttpResponse::Created().json(render(comment)))
}

/// GET /api/v1/posts/{post_id}/comments/{id}/
pub async fn retrieve(
    state: web::Data<AppState>,
    _identity: OptionalIdentity,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (post_id, id) = path.into_inner();
    let comment = state.services.comments.retrieve(post_id, id).await?;
    Ok(HttpResponse::Ok().json(render(comment)))
}

async fn save(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    (post_id, id): (i64, i64),
    body: Body<CommentRequest>,
    partial: bool,
) -> AppResult<HttpResponse> {
    let body = accept(
        body,
        state.services.comments.editable(identity.principal(), post_id, id),
    )
    .await?;
    let comment = state
        .services
        .comments
        .update(
            identity.principal(),
            post_id,
            id,
            CommentInput { text: body.text },
            partial,
        )
        .await?;

    Ok(HttpResponse::Ok().json(render(comment)))
}

/// PUT /api/v1/posts/{post_id}/comments/{id}/
pub async fn update(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<(i64, i64)>,
    body: Body<CommentRequest>,
) -> AppResult<HttpResponse> {
    save(state, identity, path.into_inner(), body, false).await
}

/// PATCH /api/v1/posts/{post_id}/comments/{id}/
pub async fn partial_update(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<(i64, i64)>,
    body: Body<CommentRequest>,
) -> AppResult<HttpResponse> {
    save(state, identity, path.into_inner(), body, true).await
}

/// DELETE /api/v1/posts/{post_id}/comments/{id}/
pub async fn destroy(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (post_id, id) = path.into_inner();
    state
        .services
        .comments
        .destroy(identity.principal(), post_id, id)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
