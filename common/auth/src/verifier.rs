use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde_json::Value;
use tracing::debug;

use crate::claims::UserIdentity;
use crate::config::VerifierConfig;
use crate::error::{AuthError, AuthResult};
use crate::jwks::KeyResolver;

/// Verifies RS256 bearer tokens and maps their claims to a [`UserIdentity`].
///
/// The algorithm allow-list is fixed to RS256; there is no negotiation.
/// Issuer equality is always enforced. Audience and expiry checks are
/// opt-in via [`VerifierConfig`] and both default to off.
#[derive(Clone)]
pub struct TokenVerifier {
    config: VerifierConfig,
    resolver: KeyResolver,
}

impl TokenVerifier {
    pub fn new(config: VerifierConfig, resolver: KeyResolver) -> Self {
        Self { config, resolver }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    pub async fn verify(&self, token: &str) -> AuthResult<UserIdentity> {
        let header =
            decode_header(token).map_err(|err| AuthError::InvalidHeader(err.to_string()))?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;
        let key = self.resolver.resolve_signing_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.config.issuer.clone()]);
        match &self.config.audience {
            Some(audience) => validation.set_audience(&[audience.clone()]),
            None => validation.validate_aud = false,
        }
        validation.validate_exp = self.config.validate_expiry;
        validation.leeway = self.config.leeway_seconds.into();

        // Keep exp/aud out of the required claim set unless their checks
        // are enabled, so tokens without those claims still verify.
        let mut required = vec!["iss"];
        if self.config.audience.is_some() {
            required.push("aud");
        }
        if self.config.validate_expiry {
            required.push("exp");
        }
        validation.set_required_spec_claims(&required);

        let token_data = decode::<Value>(token, &key, &validation)?;
        let identity = UserIdentity::try_from(token_data.claims)?;
        debug!(kid, user_id = %identity.id, "verified bearer token");
        Ok(identity)
    }
}
