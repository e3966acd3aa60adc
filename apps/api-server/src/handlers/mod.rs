//! HTTP handlers and route configuration.

mod accounts;
mod comments;
mod follow;
mod groups;
mod health;
mod posts;

use std::future::Future;

use actix_web::{HttpRequest, web};
use serde::Deserialize;
use url::Url;

use yatube_core::DomainError;
use yatube_core::pagination::{Page, PageRequest};
use yatube_shared::Paginated;

use crate::middleware::error::{AppError, AppResult, json_error_handler};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(
            // Non-numeric ids cannot match any row.
            web::PathConfig::default()
                .error_handler(|_, req| AppError::NotFound(format!("No match for {}", req.path())).into()),
        )
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api/v1")
                // Accounts and tokens
                .service(web::resource("/users/").route(web::post().to(accounts::register)))
                .service(
                    web::resource("/users/me/")
                        .route(web::get().to(accounts::me))
                        .route(web::delete().to(accounts::delete_me)),
                )
                .service(web::resource("/jwt/create/").route(web::post().to(accounts::obtain_token)))
                .service(web::resource("/jwt/refresh/").route(web::post().to(accounts::refresh_token)))
                .service(web::resource("/jwt/verify/").route(web::post().to(accounts::verify_token)))
                // Groups (read-only)
                .service(web::resource("/groups/").route(web::get().to(groups::list)))
                .service(web::resource("/groups/{id}/").route(web::get().to(groups::retrieve)))
                // Posts
                .service(
                    web::resource("/posts/")
                        .route(web::get().to(posts::list))
                        .route(web::post().to(posts::create)),
                )
                .service(
                    web::resource("/posts/{id}/")
                        .route(web::get().to(posts::retrieve))
                        .route(web::put().to(posts::update))
                        .route(web::patch().to(posts::partial_update))
                        .route(web::delete().to(posts::destroy)),
                )
                // Comments
                .service(
                    web::resource("/posts/{post_id}/comments/")
                        .route(web::get().to(comments::list))
                        .route(web::post().to(comments::create)),
                )
                .service(
                    web::resource("/posts/{post_id}/comments/{id}/")
                        .route(web::get().to(comments::retrieve))
                        .route(web::put().to(comments::update))
                        .route(web::patch().to(comments::partial_update))
                        .route(web::delete().to(comments::destroy)),
                )
                // Follows
                .service(
                    web::resource("/follow/")
                        .route(web::get().to(follow::list))
                        .route(web::post().to(follow::create)),
                ),
        );
}

/// Raw `limit`/`offset` query values; parsed leniently by [`PageRequest`].
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// JSON body of a write request. A malformed body is reported only after
/// the caller has passed the authentication and permission checks.
pub(crate) type Body<T> = Result<web::Json<T>, actix_web::Error>;

/// Unwrap `body`, or run `authorized` first and then reject the payload.
pub(crate) async fn accept<T, O>(
    body: Body<T>,
    authorized: impl Future<Output = Result<O, DomainError>>,
) -> AppResult<T> {
    match body {
        Ok(body) => Ok(body.into_inner()),
        Err(err) => {
            authorized.await?;
            Err(AppError::Rejected(err))
        }
    }
}

/// Absolute link to another window of the current listing. Query parameters
/// other than `limit` and `offset` are carried over.
fn page_link(req: &HttpRequest, limit: u64, offset: u64) -> String {
    let info = req.connection_info();
    let base = format!("{}://{}{}", info.scheme(), info.host(), req.path());
    let Ok(mut url) = Url::parse(&base) else {
        return base;
    };

    let kept: Vec<(String, String)> = url::form_urlencoded::parse(req.query_string().as_bytes())
        .filter(|(key, _)| key != "limit" && key != "offset")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .extend_pairs(kept)
        .append_pair("limit", &limit.to_string());
    if offset > 0 {
        url.query_pairs_mut().append_pair("offset", &offset.to_string());
    }
    url.to_string()
}

/// Wrap a page into the `{count, next, previous, results}` envelope.
pub(crate) fn paginated<T>(req: &HttpRequest, request: PageRequest, page: Page<T>) -> Paginated<T> {
    Paginated {
        count: page.count,
        next: request
            .next_offset(page.count)
            .map(|offset| page_link(req, request.limit, offset)),
        previous: request
            .previous_offset()
            .map(|offset| page_link(req, request.limit, offset)),
        results: page.items,
    }
}
