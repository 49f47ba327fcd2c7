use std::sync::{Arc, RwLock};

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// Resolves the JWKS endpoint URL from an OIDC discovery document.
///
/// The resolved URL is cached for the lifetime of the client, so only the
/// first call performs network I/O. Concurrent first calls may each fetch
/// the document; both arrive at the same URL, so the race is tolerated
/// rather than serialized.
#[derive(Clone)]
pub struct DiscoveryClient {
    http: Client,
    discovery_url: String,
    jwks_url: Arc<RwLock<Option<String>>>,
}

impl DiscoveryClient {
    pub fn new(discovery_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), discovery_url)
    }

    pub fn with_client(http: Client, discovery_url: impl Into<String>) -> Self {
        Self {
            http,
            discovery_url: discovery_url.into(),
            jwks_url: Arc::new(RwLock::new(None)),
        }
    }

    pub fn discovery_url(&self) -> &str {
        &self.discovery_url
    }

    /// Returns the JWKS endpoint URL, fetching the discovery document on
    /// first use.
    pub async fn resolve_jwks_url(&self) -> AuthResult<String> {
        if let Some(url) = self.cached() {
            return Ok(url);
        }

        let response = self
            .http
            .get(&self.discovery_url)
            .send()
            .await
            .map_err(|err| AuthError::DiscoveryFetch(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::DiscoveryFetch(format!(
                "HTTP {} from {}",
                response.status(),
                self.discovery_url
            )));
        }

        let document: DiscoveryDocument = response
            .json()
            .await
            .map_err(|err| AuthError::MalformedDiscovery(err.to_string()))?;

        let url = document
            .jwks_uri
            .ok_or_else(|| AuthError::MalformedDiscovery("missing jwks_uri".to_string()))?;
        debug!(jwks_uri = %url, "resolved JWKS endpoint from discovery document");

        let mut guard = self.jwks_url.write().expect("rwlock poisoned");
        *guard = Some(url.clone());
        Ok(url)
    }

    fn cached(&self) -> Option<String> {
        let guard = self.jwks_url.read().expect("rwlock poisoned");
        guard.clone()
    }
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    #[serde(default)]
    jwks_uri: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn resolves_and_caches_jwks_url() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/.well-known/openid-configuration");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "issuer": server.base_url(),
                    "jwks_uri": format!("{}/keys", server.base_url()),
                }));
        });

        let client = DiscoveryClient::new(server.url("/.well-known/openid-configuration"));

        let first = client.resolve_jwks_url().await.expect("first resolve");
        let second = client.resolve_jwks_url().await.expect("second resolve");

        assert_eq!(first, format!("{}/keys", server.base_url()));
        assert_eq!(first, second);
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn surfaces_http_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/.well-known/openid-configuration");
            then.status(502);
        });

        let client = DiscoveryClient::new(server.url("/.well-known/openid-configuration"));

        let err = client.resolve_jwks_url().await.expect_err("should fail");
        assert!(matches!(err, AuthError::DiscoveryFetch(_)));
    }

    #[tokio::test]
    async fn rejects_document_without_jwks_uri() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/.well-known/openid-configuration");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "issuer": server.base_url() }));
        });

        let client = DiscoveryClient::new(server.url("/.well-known/openid-configuration"));

        let err = client.resolve_jwks_url().await.expect_err("should fail");
        assert!(matches!(err, AuthError::MalformedDiscovery(_)));
    }
}
