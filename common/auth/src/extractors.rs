use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts};

use crate::api_key::ApiKeyGate;
use crate::claims::UserIdentity;
use crate::error::{AuthError, AuthResult};
use crate::verifier::TokenVerifier;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Extracts the bearer-authenticated identity from the request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    Arc<TokenVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = Arc::<TokenVerifier>::from_ref(state);

        let header_value = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;

        let token = parse_bearer(header_value)?;
        let identity = verifier.verify(&token).await?;

        Ok(Self(identity))
    }
}

/// Credential accepted on secured routes: a static API key presented by
/// service-to-service callers, or a bearer token presented by end users.
///
/// An X-API-Key header, when present, is checked and wins; otherwise a
/// bearer Authorization header is verified. Neither header present is a
/// rejection.
#[derive(Debug, Clone)]
pub enum Principal {
    Service,
    User(UserIdentity),
}

impl Principal {
    pub fn user(&self) -> Option<&UserIdentity> {
        match self {
            Principal::User(identity) => Some(identity),
            Principal::Service => None,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    Arc<TokenVerifier>: FromRef<S>,
    Arc<ApiKeyGate>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(value) = parts.headers.get(API_KEY_HEADER) {
            let gate = Arc::<ApiKeyGate>::from_ref(state);
            let presented = value.to_str().map_err(|_| AuthError::InvalidApiKey)?;
            gate.check(presented)?;
            return Ok(Self::Service);
        }

        if parts.headers.contains_key(AUTHORIZATION) {
            let CurrentUser(identity) = CurrentUser::from_request_parts(parts, state).await?;
            return Ok(Self::User(identity));
        }

        Err(AuthError::MissingApiKey)
    }
}

fn parse_bearer(value: &axum::http::HeaderValue) -> AuthResult<String> {
    let raw = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?;

    let token = raw
        .trim()
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidAuthorization)?;

    if token.is_empty() {
        return Err(AuthError::InvalidAuthorization);
    }

    Ok(token.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parse_bearer_accepts_valid_token() {
        let header = HeaderValue::from_static("Bearer abc.def.ghi");
        let token = parse_bearer(&header).expect("token");
        assert_eq!(token, "abc.def.ghi");
    }

    #[test]
    fn parse_bearer_rejects_wrong_scheme() {
        let header = HeaderValue::from_static("Basic credentials");
        let err = parse_bearer(&header).expect_err("should reject");
        assert!(matches!(err, AuthError::InvalidAuthorization));
    }

    #[test]
    fn parse_bearer_rejects_empty_value() {
        let header = HeaderValue::from_static("Bearer    ");
        let err = parse_bearer(&header).expect_err("should reject empty token");
        assert!(matches!(err, AuthError::InvalidAuthorization));
    }
}
