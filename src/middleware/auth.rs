//! Authentication middleware
//!
//! Extractors for JWT token verification and user extraction.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{verify_token, AuthKeys, JwtError};
use crate::models::UserRole;
use crate::rental::Actor;

/// Authenticated user extracted from JWT token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// The caller as seen by the rental service
    pub fn actor(&self) -> Actor {
        Actor::User {
            id: self.user_id,
            is_admin: self.is_admin(),
        }
    }
}

/// Error response for authentication failures
#[derive(Debug, Serialize)]
struct AuthError {
    #[serde(skip)]
    status: StatusCode,
    error: AuthErrorDetails,
}

#[derive(Debug, Serialize)]
struct AuthErrorDetails {
    code: String,
    message: String,
}

impl AuthError {
    fn new(code: &str, message: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: AuthErrorDetails {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }

    fn forbidden(message: &str) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            ..Self::new("FORBIDDEN", message)
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Extractor for authenticated users
///
/// Verifies the bearer token from the Authorization header.
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, user {}", user.user_id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AuthError::new(
                        "MISSING_TOKEN",
                        "Authorization header with Bearer token required",
                    )
                    .into_response()
                })?;

        let keys = Arc::<AuthKeys>::from_ref(state);
        user_from_token(bearer.token(), &keys)
    }
}

fn user_from_token(token: &str, keys: &AuthKeys) -> Result<AuthenticatedUser, Response> {
    let claims = verify_token(token, keys.jwt_secret()).map_err(|e| {
        let (code, message) = match e {
            JwtError::TokenExpired => ("TOKEN_EXPIRED", "Token has expired"),
            _ => ("INVALID_TOKEN", "Invalid token"),
        };
        AuthError::new(code, message).into_response()
    })?;

    let user_id = claims.user_id().map_err(|_| {
        AuthError::new("INVALID_TOKEN", "Invalid user ID in token").into_response()
    })?;

    Ok(AuthenticatedUser {
        user_id,
        username: claims.username,
        role: claims.role,
    })
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Extractor for WebSocket upgrades
///
/// Browsers cannot set headers on a WebSocket handshake, so the token may
/// also arrive as `?token=`. The bearer header wins when both are present.
pub struct SocketUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for SocketUser
where
    Arc<AuthKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string());
        let token = match header {
            Some(token) => token,
            None => Query::<TokenQuery>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(q)| q.token)
                .ok_or_else(|| {
                    AuthError::new("MISSING_TOKEN", "Bearer token or token parameter required")
                        .into_response()
                })?,
        };

        let keys = Arc::<AuthKeys>::from_ref(state);
        user_from_token(&token, &keys).map(SocketUser)
    }
}

/// Extractor that additionally requires the admin role
pub struct AdminUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AuthError::forbidden("Admin access required").into_response());
        }

        Ok(AdminUser(user))
    }
}
