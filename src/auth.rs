//! Bearer token handling and the auth service introspection client.

use crate::error::{AppError, Result};
use crate::models::{AuthenticatedUser, Role};
use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::Deserialize;
use serde_json::json;

/// Resolves a bearer token to the user it was issued for.
#[async_trait]
pub trait TokenIntrospector: Send + Sync {
    async fn introspect(&self, token: &str) -> Result<AuthenticatedUser>;
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[derive(Deserialize)]
struct IntrospectionResponse {
    #[serde(default)]
    active: bool,
    user_id: Option<String>,
    email: Option<String>,
    role: Option<Role>,
}

/// Calls `POST {base_url}/auth/introspect` on the auth service.
#[derive(Debug, Clone)]
pub struct HttpIntrospector {
    client: reqwest::Client,
    url: String,
}

impl HttpIntrospector {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/auth/introspect", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl TokenIntrospector for HttpIntrospector {
    async fn introspect(&self, token: &str) -> Result<AuthenticatedUser> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "token": token }))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Auth service unreachable");
                AppError::Unauthorized("Token introspection failed".to_string())
            })?;

        if !response.status().is_success() {
            tracing::debug!(status = response.status().as_u16(), "Introspection rejected");
            return Err(AppError::Unauthorized(
                "Token introspection failed".to_string(),
            ));
        }

        let payload: IntrospectionResponse = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "Malformed introspection response");
            AppError::Unauthorized("Token introspection failed".to_string())
        })?;

        if !payload.active {
            return Err(AppError::Unauthorized("Inactive token".to_string()));
        }

        match (payload.user_id, payload.email, payload.role) {
            (Some(user_id), Some(email), Some(role)) => Ok(AuthenticatedUser {
                user_id,
                email,
                role,
            }),
            _ => Err(AppError::Unauthorized(
                "Incomplete introspection response".to_string(),
            )),
        }
    }
}
