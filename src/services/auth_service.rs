//! Session token verification.
//!
//! Sessions are issued by the identity provider; this service only checks
//! the signature and standard claims and yields the user id.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{Config, TokenKey, JWT_LEEWAY_SECONDS};
use crate::errors::{AppError, AppResult};

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity-provider user id
    pub sub: String,
    /// Session id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// Authorized party (origin of the front-end that requested the token)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// Authentication service trait for dependency injection.
pub trait AuthService: Send + Sync {
    /// Verify a session token and extract its claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

/// JWT verifier built once from configuration.
pub struct Authenticator {
    key: DecodingKey,
    validation: Validation,
    authorized_parties: Vec<String>,
}

impl Authenticator {
    /// Build a verifier from the configured RSA key or shared secret.
    pub fn new(config: &Config) -> AppResult<Self> {
        let (key, algorithm) = match config.token_key() {
            Some(TokenKey::RsaPem(pem)) => (
                DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| AppError::internal(format!("Invalid CLERK_JWT_KEY: {}", e)))?,
                Algorithm::RS256,
            ),
            Some(TokenKey::Secret(secret)) => (DecodingKey::from_secret(secret), Algorithm::HS256),
            None => {
                return Err(AppError::internal(
                    "No session token key configured (CLERK_JWT_KEY or JWT_SECRET)",
                ))
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = JWT_LEEWAY_SECONDS;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            key,
            validation,
            authorized_parties: config.authorized_parties.clone(),
        })
    }
}

impl AuthService for Authenticator {
    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)?.claims;

        if let Some(azp) = claims.azp.as_deref() {
            if !self.authorized_parties.is_empty()
                && !self.authorized_parties.iter().any(|party| party == azp)
            {
                tracing::warn!(azp = %azp, "Rejected token from unauthorized party");
                return Err(AppError::Unauthorized);
            }
        }

        if claims.sub.is_empty() {
            return Err(AppError::Unauthorized);
        }

        Ok(claims)
    }
}
