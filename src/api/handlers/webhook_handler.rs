//! Identity-provider (Clerk) webhook.

use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::post,
    Router,
};

use crate::api::extractors::SignedWebhook;
use crate::api::AppState;
use crate::config::WEBHOOK_MAX_BODY_BYTES;
use crate::domain::{UserSyncEvent, WebhookEnvelope};
use crate::errors::{AppError, AppResult};
use crate::jobs::UserSyncJob;
use crate::types::MessageResponse;

/// Create webhook routes
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/clerk", post(clerk_webhook))
        .layer(DefaultBodyLimit::max(WEBHOOK_MAX_BODY_BYTES))
}

/// Receive a Svix-signed Clerk event and queue it for the user sync worker
#[utoipa::path(
    post,
    path = "/api/webhooks/clerk",
    tag = "Webhooks",
    request_body(content = String, description = "Clerk event JSON", content_type = "application/json"),
    params(
        ("svix-id" = String, Header, description = "Delivery id"),
        ("svix-timestamp" = String, Header, description = "Unix seconds"),
        ("svix-signature" = String, Header, description = "Space separated `v1,<base64>` signatures")
    ),
    responses(
        (status = 200, description = "Event accepted or ignored", body = MessageResponse),
        (status = 400, description = "Missing headers, bad signature or malformed event"),
        (status = 413, description = "Body larger than the webhook limit")
    )
)]
pub async fn clerk_webhook(
    State(state): State<AppState>,
    webhook: SignedWebhook,
) -> AppResult<Json<MessageResponse>> {
    let envelope: WebhookEnvelope = serde_json::from_slice(&webhook.payload)
        .map_err(|e| AppError::bad_request(format!("Malformed webhook payload: {}", e)))?;
    let event_type = envelope.event_type.clone();

    let event = UserSyncEvent::from_envelope(envelope)
        .map_err(|e| AppError::bad_request(format!("Malformed {} event: {}", event_type, e)))?;

    let Some(event) = event else {
        tracing::debug!(event_type = %event_type, "Ignoring webhook event");
        return Ok(Json(MessageResponse::new("Event ignored")));
    };

    tracing::info!(
        event_type = %event_type,
        user_id = %event.user_id(),
        delivery_id = %webhook.delivery_id,
        "Queueing user sync"
    );

    state
        .user_sync_queue
        .enqueue(UserSyncJob::new(event, Some(webhook.delivery_id)))
        .await?;

    Ok(Json(MessageResponse::new("Event received")))
}
