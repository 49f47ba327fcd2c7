use subtle::ConstantTimeEq;

use crate::error::{AuthError, AuthResult};

/// Gate for service-to-service routes protected by a static pre-shared key.
///
/// Stateless: a check has no side effects and keeps nothing between calls.
#[derive(Clone)]
pub struct ApiKeyGate {
    key: String,
}

impl ApiKeyGate {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Constant-time comparison against the configured key. Equality is
    /// exact, byte for byte.
    pub fn check(&self, presented: &str) -> AuthResult<()> {
        if presented.as_bytes().ct_eq(self.key.as_bytes()).into() {
            Ok(())
        } else {
            Err(AuthError::InvalidApiKey)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exact_key() {
        let gate = ApiKeyGate::new("super-secret");
        assert!(gate.check("super-secret").is_ok());
    }

    #[test]
    fn rejects_near_misses() {
        let gate = ApiKeyGate::new("super-secret");
        for presented in ["", "super", "super-secret ", "xsuper-secret", "SUPER-SECRET"] {
            let err = gate.check(presented).expect_err("should reject");
            assert!(matches!(err, AuthError::InvalidApiKey));
        }
    }
}
