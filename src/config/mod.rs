//! Configuration management for PremiAds
//!
//! Configuration is read once at startup into a [`Config`] value that is
//! handed to every service through the application state. Required backend
//! settings have no fallback: a missing `SUPABASE_URL` or service role key
//! aborts startup.

use std::env;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// How the payment webhook treats missing signatures and secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignaturePolicy {
    /// Verify when both secret and header are present, otherwise warn and continue.
    Lenient,
    /// Require both a configured secret and a signature header.
    Strict,
}

impl SignaturePolicy {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(SignaturePolicy::Lenient),
            "strict" => Ok(SignaturePolicy::Strict),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid webhook signature policy: '{}'. Expected: lenient or strict",
                s
            ))),
        }
    }

    /// Strict in production, lenient elsewhere.
    pub fn default_for(environment: Environment) -> Self {
        if environment.is_production() {
            SignaturePolicy::Strict
        } else {
            SignaturePolicy::Lenient
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Supabase project URL
    pub supabase_url: String,

    /// Service role key used for every backend call made by this server
    pub supabase_service_role_key: String,

    /// HS256 secret for verifying access tokens locally
    pub supabase_jwt_secret: Option<String>,

    /// Base URL for edge functions (default: `{supabase_url}/functions/v1`)
    pub functions_base_url: String,

    /// Mercado Pago REST API base URL
    pub mercado_pago_api_url: String,

    /// Mercado Pago server access token
    pub mercado_pago_access_token: Option<String>,

    /// Webhook secret for the current environment
    pub mercado_pago_webhook_secret: Option<String>,

    pub webhook_signature_policy: SignaturePolicy,

    /// Current environment
    pub environment: Environment,

    /// Server port
    pub port: u16,

    /// Outbound HTTP request timeout
    pub http_timeout_seconds: u64,

    /// CORS allowed origins for the `/api` surface
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = non_empty("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let supabase_url = non_empty("SUPABASE_URL")
            .or_else(|| non_empty("VITE_SUPABASE_URL"))
            .ok_or_else(|| ConfigError::MissingEnvVar("SUPABASE_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let supabase_service_role_key = non_empty("SUPABASE_SERVICE_ROLE_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("SUPABASE_SERVICE_ROLE_KEY".to_string()))?;

        let supabase_jwt_secret = non_empty("SUPABASE_JWT_SECRET");

        let functions_base_url = non_empty("SUPABASE_FUNCTIONS_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("{}/functions/v1", supabase_url));

        let mercado_pago_api_url = non_empty("MERCADO_PAGO_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "https://api.mercadopago.com".to_string());

        let mercado_pago_access_token = non_empty("MERCADO_PAGO_ACCESS_TOKEN");

        let secret_var = if environment.is_production() {
            "MERCADO_PAGO_WEBHOOK_SECRET_PROD"
        } else {
            "MERCADO_PAGO_WEBHOOK_SECRET_TEST"
        };
        let mercado_pago_webhook_secret = non_empty(secret_var);

        let webhook_signature_policy = match non_empty("WEBHOOK_SIGNATURE_POLICY") {
            Some(s) => SignaturePolicy::parse(&s)?,
            None => SignaturePolicy::default_for(environment),
        };

        let port = non_empty("PORT")
            .unwrap_or_else(|| "3001".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let http_timeout_seconds = non_empty("HTTP_TIMEOUT_SECONDS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(15);

        let cors_allowed_origins = non_empty("CORS_ALLOWED_ORIGINS");

        let log_level = non_empty("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Config {
            supabase_url,
            supabase_service_role_key,
            supabase_jwt_secret,
            functions_base_url,
            mercado_pago_api_url,
            mercado_pago_access_token,
            mercado_pago_webhook_secret,
            webhook_signature_policy,
            environment,
            port,
            http_timeout_seconds,
            cors_allowed_origins,
            log_level,
        })
    }

    /// Service role key with everything but the first characters hidden, for logs
    pub fn service_role_key_masked(&self) -> String {
        let visible: String = self.supabase_service_role_key.chars().take(6).collect();
        format!("{}****", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("SUPABASE_URL", "https://project.supabase.co/"),
        ("SUPABASE_SERVICE_ROLE_KEY", "service-role-key"),
    ];

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("dev").unwrap(), Environment::Development);
        assert_eq!(Environment::parse("staging").unwrap(), Environment::Staging);
        assert_eq!(Environment::parse("PROD").unwrap(), Environment::Production);
        assert!(Environment::parse("invalid").is_err());
    }

    #[test]
    fn test_missing_supabase_url_fails_fast() {
        let err = Config::from_lookup(lookup(&[("SUPABASE_SERVICE_ROLE_KEY", "k")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "SUPABASE_URL"));
    }

    #[test]
    fn test_missing_service_role_key_fails_fast() {
        let err = Config::from_lookup(lookup(&[("SUPABASE_URL", "https://x.supabase.co")]))
            .unwrap_err();
        assert!(err.to_string().contains("SUPABASE_SERVICE_ROLE_KEY"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.supabase_url, "https://project.supabase.co");
        assert_eq!(
            config.functions_base_url,
            "https://project.supabase.co/functions/v1"
        );
        assert_eq!(config.port, 3001);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.webhook_signature_policy, SignaturePolicy::Lenient);
        assert!(config.mercado_pago_access_token.is_none());
    }

    #[test]
    fn test_vite_alias_for_supabase_url() {
        let config = Config::from_lookup(lookup(&[
            ("VITE_SUPABASE_URL", "https://alias.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "k"),
        ]))
        .unwrap();
        assert_eq!(config.supabase_url, "https://alias.supabase.co");
    }

    #[test]
    fn test_webhook_secret_follows_environment() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("MERCADO_PAGO_WEBHOOK_SECRET_TEST", "test-secret"));
        vars.push(("MERCADO_PAGO_WEBHOOK_SECRET_PROD", "prod-secret"));

        let dev = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(dev.mercado_pago_webhook_secret.as_deref(), Some("test-secret"));

        vars.push(("ENVIRONMENT", "production"));
        let prod = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(prod.mercado_pago_webhook_secret.as_deref(), Some("prod-secret"));
        assert_eq!(prod.webhook_signature_policy, SignaturePolicy::Strict);
    }

    #[test]
    fn test_explicit_signature_policy_overrides_default() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("ENVIRONMENT", "prod"));
        vars.push(("WEBHOOK_SIGNATURE_POLICY", "lenient"));
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.webhook_signature_policy, SignaturePolicy::Lenient);

        let mut bad = REQUIRED.to_vec();
        bad.push(("WEBHOOK_SIGNATURE_POLICY", "sometimes"));
        assert!(Config::from_lookup(lookup(&bad)).is_err());
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "not-a-port"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(_)));
    }

    #[test]
    fn test_service_role_key_masked() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        let masked = config.service_role_key_masked();
        assert!(masked.ends_with("****"));
        assert!(!masked.contains("role-key"));
    }
}
