//! Account and token handlers.

use actix_web::{HttpResponse, web};

use yatube_core::domain::NewUser;
use yatube_core::error::RepoError;
use yatube_core::ports::{AuthError, TokenKind};
use yatube_core::validation::{
    USERNAME_RE, Validate, ValidationErrors, collect, field_error, not_blank,
};
use yatube_shared::dto::{
    AccessTokenResponse, DeleteAccountRequest, RegisterUserRequest, TokenObtainRequest,
    TokenPairResponse, TokenRefreshRequest, TokenVerifyRequest, UserResponse,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const USERNAME_TAKEN: &str = "A user with that username already exists.";

#[derive(Validate)]
struct Registration {
    #[validate(
        custom(function = "not_blank"),
        length(max = 150, message = "Ensure this field has no more than 150 characters."),
        regex(
            path = *USERNAME_RE,
            message = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
        )
    )]
    username: String,
    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    password: String,
}

fn username_taken() -> AppError {
    let mut errors = ValidationErrors::new();
    errors.add("username", field_error("unique", USERNAME_TAKEN));
    AppError::Validation(errors)
}

/// POST /api/v1/users/
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let registration = Registration {
        username: req.username.trim().to_string(),
        password: req.password,
    };

    let mut errors = collect(&registration);
    if !errors.field_errors().contains_key("username")
        && state
            .users
            .find_by_username(&registration.username)
            .await?
            .is_some()
    {
        errors.add("username", field_error("unique", USERNAME_TAKEN));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let password_hash = state.passwords.hash(&registration.password)?;

    let user = state
        .users
        .create(NewUser {
            username: registration.username,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            RepoError::Constraint(_) => username_taken(),
            other => other.into(),
        })?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok(HttpResponse::Created().json(UserResponse {
        id: user.id,
        username: user.username,
    }))
}

/// GET /api/v1/users/me/
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id,
        username: user.username,
    }))
}

/// DELETE /api/v1/users/me/
///
/// Removes the account together with its posts, comments and follows.
pub async fn delete_me(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<DeleteAccountRequest>,
) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    if !state.passwords.verify(&body.current_password, &user.password_hash)? {
        let mut errors = ValidationErrors::new();
        errors.add("current_password", field_error("invalid", "Invalid password."));
        return Err(AppError::Validation(errors));
    }

    state.users.delete(user.id).await?;
    tracing::info!(user_id = user.id, "User deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/v1/jwt/create/
pub async fn obtain_token(
    state: web::Data<AppState>,
    body: web::Json<TokenObtainRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !state.passwords.verify(&req.password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(HttpResponse::Ok().json(TokenPairResponse {
        refresh: state
            .tokens
            .generate_token(user.id, &user.username, TokenKind::Refresh)?,
        access: state
            .tokens
            .generate_token(user.id, &user.username, TokenKind::Access)?,
    }))
}

/// POST /api/v1/jwt/refresh/
pub async fn refresh_token(
    state: web::Data<AppState>,
    body: web::Json<TokenRefreshRequest>,
) -> AppResult<HttpResponse> {
    let claims = state.tokens.validate_token(&body.refresh, TokenKind::Refresh)?;
    let access = state
        .tokens
        .generate_token(claims.user_id, &claims.username, TokenKind::Access)?;

    Ok(HttpResponse::Ok().json(AccessTokenResponse { access }))
}

/// POST /api/v1/jwt/verify/ - accepts either kind of token.
pub async fn verify_token(
    state: web::Data<AppState>,
    body: web::Json<TokenVerifyRequest>,
) -> AppResult<HttpResponse> {
    state
        .tokens
        .validate_token(&body.token, TokenKind::Access)
        .or_else(|_| state.tokens.validate_token(&body.token, TokenKind::Refresh))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({})))
}
