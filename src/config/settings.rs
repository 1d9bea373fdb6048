//! Application settings loaded from environment variables.

use std::env;

use super::constants::{DEFAULT_DATABASE_URL, DEFAULT_REDIS_URL, MIN_JWT_SECRET_LENGTH};

/// Key material used to verify identity-provider session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKey<'a> {
    /// PEM encoded RSA public key (RS256, production)
    RsaPem(&'a str),
    /// Shared secret (HS256, development and tests)
    Secret(&'a [u8]),
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    clerk_jwt_key: Option<String>,
    jwt_secret: Option<String>,
    webhook_secret: Option<String>,
    pub authorized_parties: Vec<String>,
    pub admin_emails: Vec<String>,
    /// Take client addresses from X-Forwarded-For / X-Real-IP
    pub trust_proxy: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("clerk_jwt_key", &self.clerk_jwt_key.as_ref().map(|_| "[REDACTED]"))
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "[REDACTED]"))
            .field("authorized_parties", &self.authorized_parties)
            .field("admin_emails", &self.admin_emails)
            .field("trust_proxy", &self.trust_proxy)
            .finish()
    }
}

/// Local defaults with no keys configured
impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            clerk_jwt_key: None,
            jwt_secret: None,
            webhook_secret: None,
            authorized_parties: Vec::new(),
            admin_emails: Vec::new(),
            trust_proxy: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics in release builds when no token verification key is configured,
    /// or when a configured JWT_SECRET is too short.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let clerk_jwt_key = env::var("CLERK_JWT_KEY")
            .ok()
            .map(|pem| pem.replace("\\n", "\n"))
            .filter(|pem| !pem.trim().is_empty());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => Some(secret),
            Err(_) if clerk_jwt_key.is_some() => None,
            Err(_) => {
                if cfg!(debug_assertions) {
                    tracing::warn!(
                        "Neither CLERK_JWT_KEY nor JWT_SECRET set, using insecure default for development"
                    );
                    Some("dev-secret-key-minimum-32-chars!!".to_string())
                } else {
                    panic!("CLERK_JWT_KEY environment variable must be set in production");
                }
            }
        };

        if let Some(secret) = &jwt_secret {
            if secret.len() < MIN_JWT_SECRET_LENGTH {
                panic!(
                    "JWT_SECRET must be at least {} characters long",
                    MIN_JWT_SECRET_LENGTH
                );
            }
        }

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            clerk_jwt_key,
            jwt_secret,
            webhook_secret: env::var("CLERK_WEBHOOK_SECRET").ok(),
            authorized_parties: split_list(env::var("CLERK_AUTHORIZED_PARTIES").ok()),
            admin_emails: split_list(env::var("ADMIN_EMAILS").ok())
                .into_iter()
                .map(|email| email.to_lowercase())
                .collect(),
            trust_proxy: parse_flag(env::var("TRUST_PROXY").ok()),
        }
    }

    /// Use an HS256 shared secret for session tokens.
    pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    /// Use a PEM encoded RSA public key for session tokens.
    pub fn with_clerk_jwt_key(mut self, pem: impl Into<String>) -> Self {
        self.clerk_jwt_key = Some(pem.into());
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }

    /// Key used to verify session tokens. The RSA key wins when both are set.
    pub fn token_key(&self) -> Option<TokenKey<'_>> {
        match (&self.clerk_jwt_key, &self.jwt_secret) {
            (Some(pem), _) => Some(TokenKey::RsaPem(pem)),
            (None, Some(secret)) if !secret.is_empty() => Some(TokenKey::Secret(secret.as_bytes())),
            _ => None,
        }
    }

    /// Webhook signing secret (`whsec_...`), if configured.
    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret.as_deref()
    }
}

/// Split a comma separated environment value, dropping blanks.
fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `1`, `true`, `yes` or `on`, case-insensitive
fn parse_flag(value: Option<String>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}
