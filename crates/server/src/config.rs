//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_API_KEY` - App client ID from the Partner dashboard
//! - `SHOPIFY_API_SECRET` - App client secret (signs OAuth callbacks and webhooks)
//! - `HOST` - Public URL of this backend (e.g., <https://wishlist.example.com>)
//!
//! ## Optional
//! - `SHOPIFY_API_SCOPES` - Comma-separated scopes (default: `read_products,write_products,read_customers`)
//! - `MOONBOX_BIND_HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 8081)
//! - `FRONTEND_URL` - Merchant UI URL (default: <http://localhost:3000>)
//! - `DATABASE_URL` - `PostgreSQL` connection string; in-memory storage when unset
//! - `MOONBOX_ENV` - `production` or `development` (default: development)
//! - `ALLOWED_ORIGINS` - Extra comma-separated CORS origins
//! - `MOONBOX_SEED_DEMO` - Seed the in-memory store with a demo shop (`true`/`1`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_SCOPES: &str = "read_products,write_products,read_customers";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Deployment environment.
///
/// Controls whether error details are exposed to clients and whether
/// development tunnel origins are accepted by CORS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" | "test" => Ok(Self::Development),
            other => Err(ConfigError::InvalidEnvVar(
                "MOONBOX_ENV".to_string(),
                format!("unknown environment '{other}'"),
            )),
        }
    }

    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public URL of this backend (OAuth redirect base)
    pub public_url: Url,
    /// Merchant-facing frontend URL
    pub frontend_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// `PostgreSQL` connection URL; `None` selects the in-memory store
    pub database_url: Option<SecretString>,
    /// Seed the in-memory store with demo data on startup
    pub seed_demo_data: bool,
    /// Shopify app credentials
    pub shopify: ShopifyAppConfig,
    /// Extra CORS origins beyond the built-in allowances
    pub allowed_origins: Vec<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry performance sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Shopify app (OAuth client) configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyAppConfig {
    /// App client ID
    pub api_key: String,
    /// App client secret
    pub api_secret: SecretString,
    /// Requested access scopes
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for ShopifyAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAppConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the API secret fails validation in production.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = get_optional_env("MOONBOX_ENV")
            .map(|v| Environment::parse(&v))
            .transpose()?
            .unwrap_or_default();

        let host = get_env_or_default("MOONBOX_BIND_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MOONBOX_BIND_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("PORT", "8081")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let public_url = parse_public_url(&get_required_env("HOST")?)?;
        let frontend_url = get_env_or_default("FRONTEND_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();
        let database_url = get_optional_env("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::from);
        let seed_demo_data = get_optional_env("MOONBOX_SEED_DEMO")
            .is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes"));

        let shopify = ShopifyAppConfig::from_env(environment)?;
        let allowed_origins = get_optional_env("ALLOWED_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        let sentry_sample_rate = parse_rate("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = parse_rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?;

        Ok(Self {
            host,
            port,
            public_url,
            frontend_url,
            environment,
            database_url,
            seed_demo_data,
            shopify,
            allowed_origins,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// OAuth redirect URI registered with the platform.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!(
            "{}/auth/callback",
            self.public_url.as_str().trim_end_matches('/')
        )
    }

    /// Where merchants land after a direct install.
    #[must_use]
    pub fn install_redirect_url(&self) -> String {
        format!("{}/?installed=true", self.frontend_url)
    }
}

impl ShopifyAppConfig {
    fn from_env(environment: Environment) -> Result<Self, ConfigError> {
        let api_secret = if environment.is_production() {
            get_validated_secret("SHOPIFY_API_SECRET")?
        } else {
            get_required_secret("SHOPIFY_API_SECRET")?
        };

        Ok(Self {
            api_key: get_required_env("SHOPIFY_API_KEY")?,
            api_secret,
            scopes: split_list(&get_env_or_default("SHOPIFY_API_SCOPES", DEFAULT_SCOPES)),
        })
    }

    /// The client secret as a plain string slice (for HMAC keys).
    #[must_use]
    pub fn secret(&self) -> &str {
        self.api_secret.expose_secret()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |v| {
        v.parse::<f32>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Split a comma-separated list, dropping blanks.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse the public `HOST` value.
///
/// A bare host name without a scheme is treated as plain `http`.
fn parse_public_url(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    let with_scheme = if raw.starts_with("https://") || raw.starts_with("http://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            "HOST".to_string(),
            "must include a host name".to_string(),
        ));
    }

    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
