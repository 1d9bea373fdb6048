//! Custom request extractors.

mod signed_webhook;
mod validated_json;

pub use signed_webhook::{SignedWebhook, WebhookVerifier};
pub use validated_json::ValidatedJson;
