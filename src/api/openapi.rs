//! OpenAPI documentation configuration.
//!
//! Served through Swagger UI at `/swagger-ui`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{chat_handler, listing_handler, webhook_handler};
use crate::domain::{
    Balance, Chat, ChatDetails, CredentialField, Listing, ListingStatus, ListingWithOwner,
    Message, Order, Transaction, UserSummary, Withdrawal,
};
use crate::services::UserListings;
use crate::types::{MessageResponse, PaginatedListings, PaginationMeta};

/// OpenAPI documentation for the Profile Marketplace API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Profile Marketplace API",
        version = "0.1.0",
        description = "Buy and sell social media accounts: listings, chats, purchases and payouts"
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        listing_handler::create_listing,
        listing_handler::update_listing,
        listing_handler::public_listings,
        listing_handler::user_listings,
        listing_handler::toggle_status,
        listing_handler::delete_listing,
        listing_handler::add_credential,
        listing_handler::mark_featured,
        listing_handler::user_orders,
        listing_handler::withdraw,
        listing_handler::purchase_account,
        chat_handler::get_chat,
        chat_handler::user_chats,
        chat_handler::send_message,
        webhook_handler::clerk_webhook,
    ),
    components(
        schemas(
            // Domain types
            Listing,
            ListingStatus,
            ListingWithOwner,
            UserSummary,
            CredentialField,
            Balance,
            Chat,
            ChatDetails,
            Message,
            Transaction,
            Order,
            Withdrawal,
            UserListings,
            PaginatedListings,
            PaginationMeta,
            MessageResponse,
            // Listing handler types
            listing_handler::ListingRequest,
            listing_handler::AddCredentialRequest,
            listing_handler::FeaturedRequest,
            listing_handler::WithdrawRequest,
            listing_handler::ListingResponse,
            listing_handler::OrdersResponse,
            listing_handler::OrderResponse,
            listing_handler::WithdrawalResponse,
            // Chat handler types
            chat_handler::GetChatRequest,
            chat_handler::SendMessageRequest,
            chat_handler::ChatResponse,
            chat_handler::ChatsResponse,
            chat_handler::SendMessageResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Listings", description = "Seller listings and credentials"),
        (name = "Orders", description = "Purchases and withdrawals"),
        (name = "Chats", description = "Buyer and seller conversations"),
        (name = "Webhooks", description = "Identity provider events")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for bearer session tokens
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Clerk session token"))
                        .build(),
                ),
            );
        }
    }
}
