//! Svix-signed webhook deliveries.
//!
//! A delivery carries `svix-id`, `svix-timestamp` and `svix-signature`
//! headers. The signature is `base64(HMAC-SHA256(secret, "{id}.{timestamp}.{body}"))`,
//! sent as a space separated list of `v1,<signature>` entries so secrets can
//! be rotated.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_LENGTH, HeaderMap, StatusCode},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::api::AppState;
use crate::config::{WEBHOOK_MAX_BODY_BYTES, WEBHOOK_SECRET_PREFIX, WEBHOOK_TOLERANCE_SECONDS};
use crate::errors::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

const HEADER_ID: &str = "svix-id";
const HEADER_TIMESTAMP: &str = "svix-timestamp";
const HEADER_SIGNATURE: &str = "svix-signature";

/// Verifies Svix signatures with a `whsec_` signing secret
#[derive(Clone)]
pub struct WebhookVerifier {
    keyed: HmacSha256,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier").field("keyed", &"[REDACTED]").finish()
    }
}

impl WebhookVerifier {
    /// Decode a signing secret. The `whsec_` prefix is optional.
    pub fn new(secret: &str) -> AppResult<Self> {
        let encoded = secret.strip_prefix(WEBHOOK_SECRET_PREFIX).unwrap_or(secret);
        let key = BASE64
            .decode(encoded.trim())
            .map_err(|e| AppError::internal(format!("Invalid webhook secret: {}", e)))?;

        if key.is_empty() {
            return Err(AppError::internal("Webhook secret is empty"));
        }

        let keyed = HmacSha256::new_from_slice(&key)
            .map_err(|e| AppError::internal(format!("Invalid webhook secret: {}", e)))?;

        Ok(Self { keyed })
    }

    fn mac(&self, id: &str, timestamp: &str, payload: &[u8]) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac
    }

    /// Signature header value for a payload (`v1,<base64>`)
    pub fn sign(&self, id: &str, timestamp: i64, payload: &[u8]) -> String {
        let digest = self
            .mac(id, &timestamp.to_string(), payload)
            .finalize()
            .into_bytes();
        format!("v1,{}", BASE64.encode(digest))
    }

    /// Check a delivery against the signing secret at time `now` (unix seconds).
    pub fn verify(
        &self,
        id: &str,
        timestamp: &str,
        signatures: &str,
        payload: &[u8],
        now: i64,
    ) -> AppResult<()> {
        let sent_at: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| AppError::bad_request("Invalid webhook timestamp"))?;

        if (now - sent_at).abs() > WEBHOOK_TOLERANCE_SECONDS {
            return Err(AppError::bad_request("Webhook timestamp outside tolerance"));
        }

        let expected = self.mac(id, timestamp.trim(), payload);

        let matched = signatures
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == "v1")
            .filter_map(|(_, signature)| BASE64.decode(signature).ok())
            .any(|signature| expected.clone().verify_slice(&signature).is_ok());

        if matched {
            Ok(())
        } else {
            Err(AppError::bad_request("Invalid webhook signature"))
        }
    }
}

/// A webhook body whose signature has been verified.
///
/// Rejects with 400 when a header is missing or the signature does not match,
/// and with 500 when no signing secret is configured.
#[derive(Debug)]
pub struct SignedWebhook {
    /// `svix-id` of the delivery, stable across retries
    pub delivery_id: String,
    pub payload: Bytes,
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::bad_request(format!("Missing {} header", name)))
}

#[async_trait]
impl FromRequest<AppState> for SignedWebhook {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let verifier = state
            .webhook_verifier
            .clone()
            .ok_or_else(|| AppError::internal("Webhook secret is not configured"))?;

        let headers = req.headers();
        let id = required_header(headers, HEADER_ID)?.to_string();
        let timestamp = required_header(headers, HEADER_TIMESTAMP)?.to_string();
        let signatures = required_header(headers, HEADER_SIGNATURE)?.to_string();

        if declared_length(headers).is_some_and(|len| len > WEBHOOK_MAX_BODY_BYTES) {
            return Err(body_too_large());
        }

        // Chunked bodies are capped by the route's DefaultBodyLimit.
        let payload = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => body_too_large(),
                _ => AppError::bad_request(rejection.body_text()),
            })?;

        if let Err(e) = verifier.verify(
            &id,
            &timestamp,
            &signatures,
            &payload,
            chrono::Utc::now().timestamp(),
        ) {
            tracing::warn!(delivery_id = %id, error = %e, "Rejected webhook delivery");
            return Err(e);
        }

        Ok(Self {
            delivery_id: id,
            payload,
        })
    }
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn body_too_large() -> AppError {
    AppError::PayloadTooLarge(format!(
        "Webhook body exceeds {} bytes",
        WEBHOOK_MAX_BODY_BYTES
    ))
}
