use anyhow::{Context, Result};
use std::env;

/// Service configuration assembled from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_url: String,
    pub discovery_url: String,
    pub issuer: String,
    pub api_key: String,
    /// Expected audience; audience validation stays off when unset.
    pub audience: Option<String>,
    /// Expiry validation switch; off unless explicitly enabled.
    pub validate_expiry: bool,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

pub fn load_config() -> Result<ServiceConfig> {
    let database_url = require_env("DATABASE_URL")?;
    let discovery_url = require_env("OIDC_DISCOVERY_URL")?;
    let issuer = require_env("JWT_ISSUER")?;
    let api_key = require_env("API_KEY")?;

    let audience = env::var("JWT_AUDIENCE")
        .ok()
        .and_then(|value| normalize_optional(&value));
    let validate_expiry = bool_from_env("JWT_VALIDATE_EXPIRY").unwrap_or(false);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080);

    let cors_origins = env::var("CORS_ORIGINS")
        .ok()
        .map(|value| parse_origins(&value))
        .unwrap_or_else(default_origins);

    Ok(ServiceConfig {
        database_url,
        discovery_url,
        issuer,
        api_key,
        audience,
        validate_expiry,
        host,
        port,
        cors_origins,
    })
}

fn require_env(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn bool_from_env(key: &str) -> Option<bool> {
    env::var(key).ok().map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(|item| {
            let origin = item.trim();
            if origin.is_empty() {
                None
            } else {
                Some(origin.to_string())
            }
        })
        .collect()
}

fn default_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_from_env_parses() {
        std::env::set_var("ITEMS_TEST_BOOL_TRUE", "true");
        std::env::set_var("ITEMS_TEST_BOOL_ONE", "1");
        std::env::set_var("ITEMS_TEST_BOOL_FALSE", "no");
        assert_eq!(bool_from_env("ITEMS_TEST_BOOL_TRUE"), Some(true));
        assert_eq!(bool_from_env("ITEMS_TEST_BOOL_ONE"), Some(true));
        assert_eq!(bool_from_env("ITEMS_TEST_BOOL_FALSE"), Some(false));
    }

    #[test]
    fn parse_origins_trims_and_drops_empties() {
        let origins = parse_origins("http://a.example, http://b.example ,, ");
        assert_eq!(origins, vec!["http://a.example", "http://b.example"]);
    }

    #[test]
    fn normalize_optional_blanks_to_none() {
        assert_eq!(normalize_optional("  "), None);
        assert_eq!(normalize_optional(" aud "), Some("aud".to_string()));
    }
}
