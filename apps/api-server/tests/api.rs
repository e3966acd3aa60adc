//! HTTP scenarios against the in-memory store.

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};

use api_server::config::AppConfig;
use api_server::handlers;
use api_server::observability::RequestIdMiddleware;
use api_server::state::AppState;
use yatube_core::domain::{NewUser, Principal};
use yatube_core::ports::TokenKind;
use yatube_core::service::{CommentInput, PostInput};

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(handlers::configure_routes),
        )
        .await
    };
}

fn state() -> AppState {
    AppState::in_memory(&AppConfig::default())
}

/// Create a user directly in the store and return it with a bearer header.
async fn user(state: &AppState, username: &str) -> (Principal, String) {
    let user = state
        .users
        .create(NewUser {
            username: username.into(),
            password_hash: "unusable".into(),
        })
        .await
        .unwrap();
    let token = state
        .tokens
        .generate_token(user.id, &user.username, TokenKind::Access)
        .unwrap();
    (
        Principal {
            user_id: user.id,
            username: user.username,
        },
        format!("Bearer {token}"),
    )
}

async fn post(state: &AppState, author: &Principal, text: &str) -> i64 {
    state
        .services
        .posts
        .create(
            Some(author),
            PostInput {
                text: Some(text.into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
}

#[actix_web::test]
async fn test_health() {
    let state = state();
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_anonymous_list_is_paginated_newest_first() {
    let state = state();
    let (leo, _) = user(&state, "leo").await;
    for text in ["first", "second", "third"] {
        post(&state, &leo, text).await;
    }
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/v1/posts/").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["next"], Value::Null);
    assert_eq!(body["previous"], Value::Null);
    let texts: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["third", "second", "first"]);
    assert_eq!(body["results"][0]["author"], "leo");
    assert_eq!(body["results"][0]["group"], Value::Null);
    assert_eq!(body["results"][0]["image"], Value::Null);
}

#[actix_web::test]
async fn test_pagination_links() {
    let state = state();
    let (leo, _) = user(&state, "leo").await;
    for i in 0..5 {
        post(&state, &leo, &format!("post {i}")).await;
    }
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/?limit=2")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 5);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert!(body["next"].as_str().unwrap().ends_with("/api/v1/posts/?limit=2&offset=2"));
    assert_eq!(body["previous"], Value::Null);

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/?limit=2&offset=2")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["next"].as_str().unwrap().ends_with("?limit=2&offset=4"));
    assert!(body["previous"].as_str().unwrap().ends_with("/api/v1/posts/?limit=2"));

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/?limit=2&offset=4")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["next"], Value::Null);
    assert!(body["previous"].as_str().unwrap().ends_with("?limit=2&offset=2"));

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/?limit=abc&offset=-3")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 5);
}

#[actix_web::test]
async fn test_create_post_ignores_client_author() {
    let state = state();
    let (_, auth) = user(&state, "leo").await;
    user(&state, "anna").await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts/")
        .insert_header(("Authorization", auth))
        .set_json(json!({"text": "hello", "author": "anna"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["author"], "leo");
    assert_eq!(body["text"], "hello");
}

#[actix_web::test]
async fn test_anonymous_create_is_unauthorized() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts/")
        .set_json(json!({"text": "hello"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get().uri("/api/v1/posts/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 0);
}

#[actix_web::test]
async fn test_blank_text_is_a_validation_error() {
    let state = state();
    let (_, auth) = user(&state, "leo").await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts/")
        .insert_header(("Authorization", auth))
        .set_json(json!({"text": "   "}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["text"][0], "This field may not be blank.");
}

#[actix_web::test]
async fn test_non_author_cannot_patch() {
    let state = state();
    let (leo, _) = user(&state, "leo").await;
    let (_, anna_auth) = user(&state, "anna").await;
    let id = post(&state, &leo, "original").await;
    let app = app!(state);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/posts/{id}/"))
        .insert_header(("Authorization", anna_auth.clone()))
        .set_json(json!({"text": "hijacked"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/posts/{id}/"))
        .insert_header(("Authorization", anna_auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts/{id}/"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["text"], "original");
}

#[actix_web::test]
async fn test_author_updates_and_deletes_post() {
    let state = state();
    let (leo, auth) = user(&state, "leo").await;
    let id = post(&state, &leo, "draft").await;
    state
        .services
        .comments
        .create(Some(&leo), id, CommentInput { text: Some("note".into()) })
        .await
        .unwrap();
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts/{id}/"))
        .to_request();
    let before: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/posts/{id}/"))
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({"text": "final", "pub_date": "2000-01-01T00:00:00Z"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let after: Value = test::read_body_json(resp).await;
    assert_eq!(after["text"], "final");
    assert_eq!(after["pub_date"], before["pub_date"]);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/posts/{id}/"))
        .insert_header(("Authorization", auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts/{id}/comments/"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_comment_on_missing_post_is_not_found() {
    let state = state();
    let (_, auth) = user(&state, "leo").await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts/999/comments/")
        .insert_header(("Authorization", auth))
        .set_json(json!({"text": "hello"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_comment_lifecycle() {
    let state = state();
    let (leo, leo_auth) = user(&state, "leo").await;
    let (_, anna_auth) = user(&state, "anna").await;
    let post_id = post(&state, &leo, "post").await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/posts/{post_id}/comments/"))
        .insert_header(("Authorization", anna_auth.clone()))
        .set_json(json!({"text": "nice", "post": 12345}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["author"], "anna");
    assert_eq!(created["post"], post_id);
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/posts/{post_id}/comments/{id}/"))
        .insert_header(("Authorization", leo_auth))
        .set_json(json!({"text": "mine now"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/posts/{post_id}/comments/{id}/"))
        .insert_header(("Authorization", anna_auth.clone()))
        .set_json(json!({"text": "edited"}))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["text"], "edited");
    assert_eq!(updated["created"], created["created"]);
    assert_eq!(updated["post"], post_id);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts/{post_id}/comments/"))
        .to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/posts/{post_id}/comments/{id}/"))
        .insert_header(("Authorization", anna_auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn test_follow_rules() {
    let state = state();
    let (_, auth) = user(&state, "leo").await;
    user(&state, "anna").await;
    user(&state, "annabel").await;
    let app = app!(state);

    let follow = |target: &str| {
        test::TestRequest::post()
            .uri("/api/v1/follow/")
            .insert_header(("Authorization", auth.clone()))
            .set_json(json!({"following": target}))
            .to_request()
    };

    let resp = test::call_service(&app, follow("leo")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["following"][0], "You cannot follow yourself.");

    let resp = test::call_service(&app, follow("anna")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"user": "leo", "following": "anna"}));

    let resp = test::call_service(&app, follow("anna")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["non_field_errors"].is_array());

    let resp = test::call_service(&app, follow("annabel")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/api/v1/follow/?search=BEL")
        .insert_header(("Authorization", auth.clone()))
        .to_request();
    let found: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(found, json!([{"user": "leo", "following": "annabel"}]));

    let req = test::TestRequest::get().uri("/api/v1/follow/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_bad_tokens_are_rejected() {
    let state = state();
    let (leo, _) = user(&state, "leo").await;
    let refresh = state
        .tokens
        .generate_token(leo.user_id, &leo.username, TokenKind::Refresh)
        .unwrap();
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/")
        .insert_header(("Authorization", "Bearer garbage"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts/")
        .insert_header(("Authorization", format!("Bearer {refresh}")))
        .set_json(json!({"text": "hello"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_account_flow() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/users/")
        .set_json(json!({"username": "tolstoy", "password": "short"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/users/")
        .set_json(json!({"username": "tolstoy", "password": "war-and-peace"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: Value = test::read_body_json(resp).await;
    assert_eq!(user["username"], "tolstoy");

    let req = test::TestRequest::post()
        .uri("/api/v1/jwt/create/")
        .set_json(json!({"username": "tolstoy", "password": "wrong-password"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/jwt/create/")
        .set_json(json!({"username": "tolstoy", "password": "war-and-peace"}))
        .to_request();
    let pair: Value = test::call_and_read_body_json(&app, req).await;
    let access = pair["access"].as_str().unwrap().to_string();
    let refresh = pair["refresh"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/jwt/refresh/")
        .set_json(json!({"refresh": refresh}))
        .to_request();
    let refreshed: Value = test::call_and_read_body_json(&app, req).await;
    assert!(refreshed["access"].is_string());

    let req = test::TestRequest::post()
        .uri("/api/v1/jwt/verify/")
        .set_json(json!({"token": access}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/users/me/")
        .insert_header(("Authorization", format!("Bearer {access}")))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["id"], user["id"]);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts/")
        .insert_header(("Authorization", format!("Bearer {access}")))
        .set_json(json!({"text": "War and Peace"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::delete()
        .uri("/api/v1/users/me/")
        .insert_header(("Authorization", format!("Bearer {access}")))
        .set_json(json!({"current_password": "war-and-peace"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri("/api/v1/posts/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 0);
}

#[actix_web::test]
async fn test_groups_are_read_only() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/groups/")
        .set_json(json!({"title": "t", "slug": "t", "description": "d"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    let req = test::TestRequest::get().uri("/api/v1/groups/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!([]));

    let req = test::TestRequest::get().uri("/api/v1/groups/1/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_malformed_json_and_ids() {
    let state = state();
    let (_, auth) = user(&state, "leo").await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts/")
        .insert_header(("Authorization", auth))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 400);

    let req = test::TestRequest::get().uri("/api/v1/posts/abc/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_request_id_is_echoed() {
    let state = state();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
            .wrap(RequestIdMiddleware),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header(("X-Request-ID", "abc-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "abc-123");

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.headers().contains_key("x-request-id"));
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_rate_limit_returns_429() {
    use std::sync::Arc;
    use std::time::Duration;

    use api_server::middleware::rate_limit::RateLimitMiddleware;
    use yatube_infra::{InMemoryRateLimiter, RateLimitConfig};

    let state = state();
    let limiter = Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: 1,
        window: Duration::from_secs(60),
    }));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
            .wrap(RateLimitMiddleware::new(limiter)),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key("retry-after"));
}

#[actix_web::test]
async fn test_out_of_range_offset_is_clamped() {
    let state = state();
    let (leo, _) = user(&state, "leo").await;
    post(&state, &leo, "only").await;
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/?offset=18446744073709551615")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["next"], Value::Null);
    assert!(
        body["previous"]
            .as_str()
            .unwrap()
            .ends_with("?limit=10&offset=9223372036854775797")
    );
}

#[actix_web::test]
async fn test_page_links_keep_other_query_parameters() {
    let state = state();
    let (leo, _) = user(&state, "leo").await;
    for text in ["a", "b", "c"] {
        post(&state, &leo, text).await;
    }
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/?limit=1&format=json&offset=1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert!(
        body["next"]
            .as_str()
            .unwrap()
            .ends_with("/api/v1/posts/?format=json&limit=1&offset=2")
    );
    assert!(
        body["previous"]
            .as_str()
            .unwrap()
            .ends_with("/api/v1/posts/?format=json&limit=1")
    );
}

#[actix_web::test]
async fn test_anonymous_create_without_body_is_unauthorized() {
    let state = state();
    let app = app!(state);

    for uri in ["/api/v1/posts/", "/api/v1/follow/"] {
        let req = test::TestRequest::post().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[actix_web::test]
async fn test_permission_is_checked_before_the_body() {
    let state = state();
    let (leo, leo_auth) = user(&state, "leo").await;
    let (_, anna_auth) = user(&state, "anna").await;
    let id = post(&state, &leo, "original").await;
    let comment_id = state
        .services
        .comments
        .create(Some(&leo), id, CommentInput { text: Some("note".into()) })
        .await
        .unwrap()
        .id;
    let app = app!(state);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/posts/{id}/"))
        .insert_header(("Authorization", anna_auth.clone()))
        .set_json(json!({"text": 5}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/posts/{id}/comments/{comment_id}/"))
        .insert_header(("Authorization", anna_auth))
        .set_json(json!({"text": 5}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/posts/{id}/"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts/999/comments/")
        .insert_header(("Authorization", leo_auth.clone()))
        .set_json(json!({"text": 5}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/posts/{id}/"))
        .insert_header(("Authorization", leo_auth))
        .set_json(json!({"text": 5}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 400);
}

#[actix_web::test]
async fn test_error_bodies_carry_the_request_id() {
    let state = state();
    let (leo, _) = user(&state, "leo").await;
    let (_, anna_auth) = user(&state, "anna").await;
    let id = post(&state, &leo, "original").await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
            .wrap(RequestIdMiddleware),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/999/")
        .insert_header(("X-Request-ID", "trace-404"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["request_id"], "trace-404");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/posts/{id}/"))
        .insert_header(("Authorization", anna_auth))
        .insert_header(("X-Request-ID", "trace-403"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], 403);
    assert_eq!(body["request_id"], "trace-403");
}

#[actix_web::test]
async fn test_registration_field_rules() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/users/")
        .set_json(json!({"username": "bad name!", "password": "short"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(
        body["errors"]["username"][0]
            .as_str()
            .unwrap()
            .starts_with("Enter a valid username.")
    );
    assert_eq!(
        body["errors"]["password"][0],
        "This password is too short. It must contain at least 8 characters."
    );

    let req = test::TestRequest::post()
        .uri("/api/v1/users/")
        .set_json(json!({"username": "  ", "password": "long-enough"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["errors"]["username"], json!(["This field may not be blank."]));
}
