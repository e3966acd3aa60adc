//! Authentication extractors.
//!
//! Handlers never read the caller from ambient context: they take an
//! [`Identity`] or [`OptionalIdentity`] argument and pass the principal on
//! to the services explicitly.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};

use yatube_core::domain::Principal;
use yatube_core::ports::{AuthError, TokenKind};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated caller; rejects the request with 401 when absent.
///
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity(pub Principal);

impl std::ops::Deref for Identity {
    type Target = Principal;

    fn deref(&self) -> &Principal {
        &self.0
    }
}

/// Caller that may be anonymous. A missing `Authorization` header yields
/// `None`; a header carrying a bad token is still rejected.
#[derive(Debug, Clone)]
pub struct OptionalIdentity(pub Option<Principal>);

impl OptionalIdentity {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

fn authenticate(req: &HttpRequest) -> Result<Option<Principal>, AuthError> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;

    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthError::InvalidToken("Server configuration error".to_string()));
    };

    let claims = state.tokens.validate_token(token, TokenKind::Access)?;
    Ok(Some(Principal::from(claims)))
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match authenticate(req) {
            Ok(Some(principal)) => Ok(Identity(principal)),
            Ok(None) => Err(AuthError::MissingAuth.into()),
            Err(e) => Err(e.into()),
        };
        ready(result)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            authenticate(req)
                .map(OptionalIdentity)
                .map_err(AppError::from),
        )
    }
}
