use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

/// Application-facing identity derived from verified token claims.
///
/// Constructed fresh for every request and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct UserIdentity {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl TryFrom<serde_json::Value> for UserIdentity {
    type Error = AuthError;

    fn try_from(value: serde_json::Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value)
            .map_err(|err| AuthError::InvalidJson(err.to_string()))?;

        let sub = repr.sub.ok_or(AuthError::MissingClaim("sub"))?;
        let email = repr.email.ok_or(AuthError::MissingClaim("email"))?;
        let name = repr.name.ok_or(AuthError::MissingClaim("name"))?;

        let id = Uuid::parse_str(&sub).map_err(|_| AuthError::InvalidClaim("sub", sub.clone()))?;

        Ok(Self { id, email, name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_full_claim_set() {
        let id = Uuid::new_v4();
        let value = json!({
            "sub": id.to_string(),
            "email": "ada@example.com",
            "name": "Ada Lovelace",
            "iss": "https://issuer.example.com",
        });

        let identity = UserIdentity::try_from(value).expect("identity");
        assert_eq!(identity.id, id);
        assert_eq!(identity.email, "ada@example.com");
        assert_eq!(identity.name, "Ada Lovelace");
    }

    #[test]
    fn rejects_missing_name() {
        let value = json!({
            "sub": Uuid::new_v4().to_string(),
            "email": "ada@example.com",
        });

        let err = UserIdentity::try_from(value).expect_err("should fail");
        assert!(matches!(err, AuthError::MissingClaim("name")));
    }

    #[test]
    fn rejects_non_uuid_subject() {
        let value = json!({
            "sub": "not-a-uuid",
            "email": "ada@example.com",
            "name": "Ada Lovelace",
        });

        let err = UserIdentity::try_from(value).expect_err("should fail");
        assert!(matches!(err, AuthError::InvalidClaim("sub", _)));
    }
}
