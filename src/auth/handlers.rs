//! Authentication endpoints.
//!
//! - `POST /auth`: exchange credentials for an access and a refresh token
//! - `GET /auth`: the account behind the bearer token
//! - `DELETE /auth`: log out (tokens are stateless, so this only acknowledges)

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::token::{Authenticated, TokenIssuer};
use crate::config::JwtConfig;
use crate::http::{Reply, ERR_PARSING_REQUEST_BODY, X_REQUEST_ID};
use crate::store::{StoreError, UserStore};

pub const ERR_INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Shared state of the auth routes.
pub struct AuthState<U> {
    users: Arc<U>,
    issuer: TokenIssuer,
    auth_ttl: Duration,
    refresh_ttl: Duration,
}

impl<U> AuthState<U> {
    pub fn new(users: U, config: &JwtConfig) -> Self {
        Self {
            users: Arc::new(users),
            issuer: TokenIssuer::new(config.secret.as_bytes()),
            auth_ttl: config.auth_token_ttl(),
            refresh_ttl: config.refresh_token_ttl(),
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }
}

impl<U> Clone for AuthState<U> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            issuer: self.issuer.clone(),
            auth_ttl: self.auth_ttl,
            refresh_ttl: self.refresh_ttl,
        }
    }
}

impl<U> FromRef<AuthState<U>> for TokenIssuer {
    fn from_ref(state: &AuthState<U>) -> Self {
        state.issuer.clone()
    }
}

/// Route table for `/auth`.
pub fn routes<U: UserStore>(state: AuthState<U>) -> Router {
    Router::new()
        .route(
            "/auth",
            post(login::<U>).get(current_user::<U>).delete(logout),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct TokenPair {
    token: String,
    refresh_token: String,
}

async fn login<U: UserStore>(
    State(state): State<AuthState<U>>,
    reply: Reply,
    headers: HeaderMap,
    body: Bytes,
) {
    let credentials: Credentials = match serde_json::from_slice(&body) {
        Ok(credentials) => credentials,
        Err(e) => {
            tracing::warn!(error = %e, "Login body could not be decoded");
            reply.fail(StatusCode::BAD_REQUEST, ERR_PARSING_REQUEST_BODY);
            return;
        }
    };

    let user = match state.users.find_by_email(&credentials.email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            reply.fail(StatusCode::FORBIDDEN, ERR_INVALID_CREDENTIALS);
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, "User lookup failed");
            reply.fail(StatusCode::INTERNAL_SERVER_ERROR, "");
            return;
        }
    };

    if !user.is_valid_password(&credentials.password) {
        reply.fail(StatusCode::FORBIDDEN, ERR_INVALID_CREDENTIALS);
        return;
    }

    let token_id = headers
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let issued = state
        .issuer
        .issue(user.id, &token_id, state.auth_ttl)
        .and_then(|token| {
            let refresh_token = state.issuer.issue(user.id, &token_id, state.refresh_ttl)?;
            Ok(TokenPair {
                token,
                refresh_token,
            })
        });

    match issued {
        Ok(pair) => {
            tracing::debug!(user = %user.id, "Tokens issued");
            reply.set_payload(&pair);
        }
        Err(e) => {
            tracing::error!(error = %e, "Token signing failed");
            reply.fail(StatusCode::INTERNAL_SERVER_ERROR, "");
        }
    }
}

async fn current_user<U: UserStore>(
    State(state): State<AuthState<U>>,
    Authenticated(claims): Authenticated,
    reply: Reply,
) {
    match state.users.find_by_id(claims.sub).await {
        Ok(user) => {
            reply.set_payload(&user);
        }
        Err(StoreError::NotFound) => {
            reply.fail(StatusCode::NOT_FOUND, format!("user {} not found", claims.sub));
        }
        Err(e) => {
            tracing::error!(error = %e, user = %claims.sub, "User lookup failed");
            reply.fail(StatusCode::INTERNAL_SERVER_ERROR, "");
        }
    }
}

async fn logout(Authenticated(claims): Authenticated, reply: Reply) {
    tracing::debug!(user = %claims.sub, token = %claims.jti, "Logged out");
    reply.set_status(StatusCode::NO_CONTENT);
}
