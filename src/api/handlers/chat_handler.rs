//! Chat handlers. Request bodies use camelCase keys (`listingId`, `chatId`).

use axum::{extract::State, response::Json, routing::{get, post}, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{ChatDetails, Message};
use crate::errors::AppResult;

/// Open the chat for a listing, or a known chat by id
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetChatRequest {
    pub listing_id: Uuid,
    pub chat_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub chat_id: Uuid,
    #[validate(length(min = 1, max = 2000, message = "Message must be 1 to 2000 characters"))]
    #[schema(example = "Hi, is this still available?")]
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub chat: ChatDetails,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatsResponse {
    pub chats: Vec<ChatDetails>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendMessageResponse {
    pub message: String,
    pub new_message: Message,
}

/// Create chat routes
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(get_chat))
        .route("/user", get(user_chats))
        .route("/send-message", post(send_message))
}

/// Get or create the chat between the caller and a listing's owner
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "Chats",
    request_body = GetChatRequest,
    responses(
        (status = 200, description = "Chat with listing, participants and messages", body = ChatResponse),
        (status = 400, description = "Own listing"),
        (status = 404, description = "Listing or chat not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_chat(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<GetChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let chat = state
        .chat_service
        .get_or_create_chat(&user.id, payload.listing_id, payload.chat_id)
        .await?;

    Ok(Json(ChatResponse { chat }))
}

/// Every chat the caller takes part in, most recent first
#[utoipa::path(
    get,
    path = "/api/chat/user",
    tag = "Chats",
    responses(
        (status = 200, description = "Chats", body = ChatsResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn user_chats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ChatsResponse>> {
    let chats = state.chat_service.user_chats(&user.id).await?;
    Ok(Json(ChatsResponse { chats }))
}

/// Post a message to a chat
#[utoipa::path(
    post,
    path = "/api/chat/send-message",
    tag = "Chats",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message stored", body = SendMessageResponse),
        (status = 400, description = "Empty message or listing not active"),
        (status = 404, description = "Chat not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_message(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<SendMessageRequest>,
) -> AppResult<Json<SendMessageResponse>> {
    let new_message = state
        .chat_service
        .send_message(&user.id, payload.chat_id, payload.message)
        .await?;

    Ok(Json(SendMessageResponse {
        message: "Message sent".to_string(),
        new_message,
    }))
}
