//! Post handlers. Reads are public; writes go through the authorship policy
//! in [`yatube_core::service::PostService`].

use actix_web::{HttpRequest, HttpResponse, web};

use yatube_core::domain::Post;
use yatube_core::pagination::PageRequest;
use yatube_core::ports::ImageStore;
use yatube_core::service::PostInput;
use yatube_shared::dto::{PostRequest, PostResponse};

use super::{Body, PageQuery, accept, paginated};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn render(post: Post, images: &dyn ImageStore) -> PostResponse {
    PostResponse {
        id: post.id,
        author: post.author.username,
        text: post.text,
        pub_date: post.pub_date,
        image: post.image.map(|path| images.url(&path)),
        group: post.group_id,
    }
}

fn input(body: PostRequest) -> PostInput {
    PostInput {
        text: body.text,
        group: body.group,
        image: body.image,
    }
}

/// GET /api/v1/posts/?limit=&offset=
pub async fn list(
    req: HttpRequest,
    state: web::Data<AppState>,
    _identity: OptionalIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let request = PageRequest::from_query(
        query.limit.as_deref(),
        query.offset.as_deref(),
        state.pagination,
    );

    let page = state.services.posts.list(request).await?;
    let page = page.map(|post| render(post, state.images.as_ref()));

    Ok(HttpResponse::Ok().json(paginated(&req, request, page)))
}

/// POST /api/v1/posts/
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .services
        .posts
        .create(Some(&identity.0), input(body.into_inner()))
        .await?;

    Ok(HttpResponse::Created().json(render(post, state.images.as_ref())))
}

/// GET /api/v1/posts/{id}/
pub async fn retrieve(
    state: web::Data<AppState>,
    _identity: OptionalIdentity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post = state.services.posts.retrieve(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(render(post, state.images.as_ref())))
}

async fn save(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    id: i64,
    body: Body<PostRequest>,
    partial: bool,
) -> AppResult<HttpResponse> {
    let body = accept(body, state.services.posts.editable(identity.principal(), id)).await?;
    let post = state
        .services
        .posts
        .update(identity.principal(), id, input(body), partial)
        .await?;

    Ok(HttpResponse::Ok().json(render(post, state.images.as_ref())))
}

/// PUT /api/v1/posts/{id}/
pub async fn update(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<i64>,
    body: Body<PostRequest>,
) -> AppResult<HttpResponse> {
    save(state, identity, path.into_inner(), body, false).await
}

/// PATCH /api/v1/posts/{id}/
pub async fn partial_update(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<i64>,
    body: Body<PostRequest>,
) -> AppResult<HttpResponse> {
    save(state, identity, path.into_inner(), body, true).await
}

/// DELETE /api/v1/posts/{id}/
pub async fn destroy(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    state
        .services
        .posts
        .destroy(identity.principal(), path.into_inner())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
