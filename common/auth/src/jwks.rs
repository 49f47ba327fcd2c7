use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use jsonwebtoken::DecodingKey;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::discovery::DiscoveryClient;
use crate::error::{AuthError, AuthResult};

/// Fetches a JSON Web Key Set and parses it into decoding keys keyed by kid.
///
/// Only RSA keys are accepted, and entries carrying an alg other than RS256
/// are rejected outright.
#[derive(Clone, Default)]
pub struct JwksClient {
    http: Client,
}

impl JwksClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    pub async fn fetch(&self, url: &str) -> AuthResult<Vec<(String, DecodingKey)>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| AuthError::JwksFetch(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let body: JwksDocument = response
            .json()
            .await
            .map_err(|err| AuthError::JwksDecode(err.to_string()))?;

        let mut keys = Vec::new();
        for entry in body.keys.into_iter() {
            let kid = entry.kid.ok_or(AuthError::JwksMissingKid)?;
            let kty = entry.kty.unwrap_or_else(|| "RSA".to_string());
            if kty != "RSA" {
                return Err(AuthError::JwksUnsupportedKey { kid, kty });
            }

            if let Some(alg) = entry.alg {
                if alg != "RS256" {
                    return Err(AuthError::JwksUnsupportedAlg { kid, alg });
                }
            }

            let modulus = entry
                .n
                .ok_or_else(|| AuthError::JwksMissingComponents(kid.clone()))?;
            let exponent = entry
                .e
                .ok_or_else(|| AuthError::JwksMissingComponents(kid.clone()))?;

            let decoding_key = DecodingKey::from_rsa_components(&modulus, &exponent)
                .map_err(|err| AuthError::KeyParse(kid.clone(), err.to_string()))?;
            keys.push((kid, decoding_key));
        }

        Ok(keys)
    }
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<JwkEntry>,
}

#[derive(Debug, Deserialize)]
struct JwkEntry {
    kid: Option<String>,
    kty: Option<String>,
    alg: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

/// Thread-safe cache of decoding keys keyed by kid.
#[derive(Clone, Default)]
pub struct KeyStore {
    inner: Arc<RwLock<HashMap<String, DecodingKey>>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_key(&self, kid: impl Into<String>, key: DecodingKey) {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        guard.insert(kid.into(), key);
    }

    pub fn insert_rsa_pem(&self, kid: impl Into<String>, pem: &[u8]) -> AuthResult<()> {
        let kid = kid.into();
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|err| AuthError::KeyParse(kid.clone(), err.to_string()))?;
        self.insert_key(kid, key);
        Ok(())
    }

    pub fn get(&self, kid: &str) -> Option<DecodingKey> {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard.get(kid).cloned()
    }

    pub fn contains(&self, kid: &str) -> bool {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard.contains_key(kid)
    }

    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, DecodingKey)>,
    {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        guard.clear();
        for (kid, key) in entries.into_iter() {
            guard.insert(kid, key);
        }
    }
}

/// Resolves signing keys for token verification.
///
/// Key ids are served from the in-memory store. A miss resolves the JWKS
/// endpoint URL (cached discovery lookup), fetches the key set, replaces
/// the store contents and retries the lookup once; a key id still absent
/// after the refresh is unknown. No retries beyond that single refresh.
#[derive(Clone)]
pub struct KeyResolver {
    discovery: DiscoveryClient,
    jwks: JwksClient,
    store: KeyStore,
}

impl KeyResolver {
    pub fn new(discovery: DiscoveryClient) -> Self {
        Self {
            discovery,
            jwks: JwksClient::new(),
            store: KeyStore::new(),
        }
    }

    pub fn with_parts(discovery: DiscoveryClient, jwks: JwksClient, store: KeyStore) -> Self {
        Self {
            discovery,
            jwks,
            store,
        }
    }

    pub fn store(&self) -> &KeyStore {
        &self.store
    }

    /// Cached discovery lookup; fetches the discovery document at most once
    /// per resolver instance.
    pub async fn resolve_jwks_url(&self) -> AuthResult<String> {
        self.discovery.resolve_jwks_url().await
    }

    pub async fn resolve_signing_key(&self, kid: &str) -> AuthResult<DecodingKey> {
        if let Some(key) = self.store.get(kid) {
            return Ok(key);
        }

        let url = self.resolve_jwks_url().await?;
        let keys = self.jwks.fetch(&url).await?;
        let count = keys.len();
        if count > 0 {
            self.store.replace_all(keys);
        }
        debug!(kid, count, "refreshed key store from JWKS endpoint");

        self.store
            .get(kid)
            .ok_or_else(|| AuthError::UnknownSigningKey(kid.to_owned()))
    }
}
