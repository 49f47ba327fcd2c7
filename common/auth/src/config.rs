/// Runtime configuration for token verification.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Expected issuer claim (iss), compared by exact string equality.
    pub issuer: String,
    /// Expected audience claim (aud). Audience is not validated when unset.
    pub audience: Option<String>,
    /// Whether exp is validated. Off by default; when off, tokens past
    /// their expiry (or without an exp claim at all) still verify.
    pub validate_expiry: bool,
    /// Allowable clock skew in seconds when expiry validation is enabled.
    pub leeway_seconds: u32,
}

impl VerifierConfig {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: None,
            validate_expiry: false,
            leeway_seconds: 30,
        }
    }

    /// Enable audience validation against the given expected value.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Enable expiry validation.
    pub fn with_expiry_validation(mut self) -> Self {
        self.validate_expiry = true;
        self
    }

    /// Adjust the allowed leeway.
    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }
}
