//! Router-level tests for the HTTP API.
//!
//! Services and the job queue are replaced by in-memory fakes so the full
//! axum stack (routing, auth middleware, extractors, error mapping) runs
//! without Postgres or Redis.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use profile_marketplace::api::extractors::WebhookVerifier;
use profile_marketplace::api::{create_router, AppState};
use profile_marketplace::config::WEBHOOK_MAX_BODY_BYTES;
use profile_marketplace::domain::{
    Balance, Chat, ChatDetails, CredentialField, Listing, ListingDraft, ListingStatus,
    ListingWithOwner, Message, Order, Transaction, UserSummary, Withdrawal,
};
use profile_marketplace::errors::{AppError, AppResult};
use profile_marketplace::jobs::{UserSyncJob, UserSyncQueue};
use profile_marketplace::services::{
    AuthService, ChatService, Claims, ListingService, OrderService, UserListings,
};
use profile_marketplace::types::{Paginated, PaginationParams};

const OWNER: &str = "user_owner";
const BUYER: &str = "user_buyer";
const WEBHOOK_SECRET: &str = "whsec_dGVzdC1zaWduaW5nLXNlY3JldA==";

// =============================================================================
// Fakes
// =============================================================================

/// Accepts `token-<user id>`
struct FakeAuth;

impl AuthService for FakeAuth {
    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let sub = token.strip_prefix("token-").ok_or(AppError::Unauthorized)?;
        Ok(Claims {
            sub: sub.to_string(),
            sid: None,
            azp: None,
            exp: Utc::now().timestamp() + 3600,
            iat: Utc::now().timestamp(),
        })
    }
}

fn listing(id: Uuid, owner: &str, status: ListingStatus) -> Listing {
    let now = Utc::now();
    Listing {
        id,
        owner_id: owner.to_string(),
        title: "Gaming channel".to_string(),
        platform: "youtube".to_string(),
        username: "playsalot".to_string(),
        followers_count: 48_000,
        engagement_rate: 6.5,
        monthly_views: 900_000,
        niche: "Gaming".to_string(),
        price: 2500,
        description: String::new(),
        verified: true,
        monetized: true,
        country: "US".to_string(),
        age_range: "18-24".to_string(),
        images: vec![],
        status,
        featured: false,
        is_credential_submitted: true,
        created_at: now,
        updated_at: now,
    }
}

fn summary(id: &str) -> UserSummary {
    UserSummary { id: id.to_string(), name: id.to_string(), image: None }
}

struct FakeListings {
    listings: Mutex<HashMap<Uuid, Listing>>,
    created_by: Mutex<Vec<String>>,
}

impl FakeListings {
    fn with(listings: Vec<Listing>) -> Self {
        Self {
            listings: Mutex::new(listings.into_iter().map(|l| (l.id, l)).collect()),
            created_by: Mutex::new(vec![]),
        }
    }

    fn get(&self, id: Uuid) -> AppResult<Listing> {
        self.listings
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Listing"))
    }
}

#[async_trait]
impl ListingService for FakeListings {
    async fn create_listing(&self, owner_id: &str, draft: ListingDraft) -> AppResult<Listing> {
        self.created_by.lock().unwrap().push(owner_id.to_string());
        let mut created = listing(Uuid::new_v4(), owner_id, ListingStatus::Active);
        created.title = draft.title;
        created.price = draft.price;
        Ok(created)
    }

    async fn update_listing(&self, owner_id: &str, id: Uuid, draft: ListingDraft) -> AppResult<Listing> {
        let mut existing = self.get(id)?;
        if !existing.is_owned_by(owner_id) {
            return Err(AppError::not_found("Listing"));
        }
        existing.title = draft.title;
        Ok(existing)
    }

    async fn public_listings(&self, params: PaginationParams) -> AppResult<Paginated<ListingWithOwner>> {
        let data: Vec<ListingWithOwner> = self
            .listings
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.is_active())
            .map(|l| ListingWithOwner { listing: l.clone(), owner: summary(&l.owner_id) })
            .collect();
        let total = data.len() as u64;
        Ok(Paginated::new(data, params.page, params.limit(), total))
    }

    async fn user_listings(&self, owner_id: &str) -> AppResult<UserListings> {
        let listings = self
            .listings
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.is_owned_by(owner_id))
            .cloned()
            .collect();
        Ok(UserListings {
            listings,
            balance: Balance { earned: 0, withdrawn: 0, available: 0 },
        })
    }

    async fn toggle_status(&self, _owner_id: &str, id: Uuid) -> AppResult<Listing> {
        let mut existing = self.get(id)?;
        existing.status = existing
            .status
            .toggled()
            .ok_or_else(|| AppError::bad_request("Listing is sold"))?;
        Ok(existing)
    }

    async fn delete_listing(&self, _owner_id: &str, id: Uuid) -> AppResult<()> {
        self.get(id).map(|_| ())
    }

    async fn add_credential(&self, _owner_id: &str, id: Uuid, _fields: Vec<CredentialField>) -> AppResult<()> {
        self.get(id).map(|_| ())
    }

    async fn mark_featured(&self, _user_id: &str, _id: Uuid, _featured: Option<bool>) -> AppResult<Listing> {
        Err(AppError::Forbidden)
    }
}

/// One chat per (listing, buyer), like the real service
struct FakeChats {
    listings: Arc<FakeListings>,
    chats: Mutex<HashMap<(Uuid, String), ChatDetails>>,
    sent: Mutex<Vec<(String, Uuid, String)>>,
}

#[async_trait]
impl ChatService for FakeChats {
    async fn get_or_create_chat(&self, user_id: &str, listing_id: Uuid, chat_id: Option<Uuid>) -> AppResult<ChatDetails> {
        let listing = self.listings.get(listing_id)?;
        let mut chats = self.chats.lock().unwrap();

        if let Some(chat_id) = chat_id {
            return chats
                .values()
                .find(|c| c.chat.id == chat_id && c.chat.is_participant(user_id))
                .cloned()
                .ok_or_else(|| AppError::not_found("Chat"));
        }
        if listing.is_owned_by(user_id) {
            return Err(AppError::bad_request("You cannot chat about your own listing"));
        }

        let now = Utc::now();
        let details = chats
            .entry((listing_id, user_id.to_string()))
            .or_insert_with(|| ChatDetails {
                chat: Chat {
                    id: Uuid::new_v4(),
                    listing_id,
                    owner_user_id: listing.owner_id.clone(),
                    chat_user_id: user_id.to_string(),
                    last_message: None,
                    last_message_sender_id: None,
                    is_last_message_read: true,
                    created_at: now,
                    updated_at: now,
                },
                owner_user: summary(&listing.owner_id),
                chat_user: summary(user_id),
                listing: listing.clone(),
                messages: vec![],
            });
        Ok(details.clone())
    }

    async fn user_chats(&self, user_id: &str) -> AppResult<Vec<ChatDetails>> {
        Ok(self
            .chats
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.chat.is_participant(user_id))
            .cloned()
            .collect())
    }

    async fn send_message(&self, user_id: &str, chat_id: Uuid, text: String) -> AppResult<Message> {
        let chats = self.chats.lock().unwrap();
        let details = chats
            .values()
            .find(|c| c.chat.id == chat_id && c.chat.is_participant(user_id))
            .ok_or_else(|| AppError::not_found("Chat"))?;
        if !details.listing.is_active() {
            return Err(AppError::bad_request(format!("Listing is {}", details.listing.status)));
        }
        self.sent
            .lock()
            .unwrap()
            .push((user_id.to_string(), chat_id, text.clone()));
        Ok(Message {
            id: Uuid::new_v4(),
            chat_id,
            sender_id: user_id.to_string(),
            message: text,
            created_at: Utc::now(),
        })
    }
}

struct FakeOrders {
    listings: Arc<FakeListings>,
}

#[async_trait]
impl OrderService for FakeOrders {
    async fn purchase(&self, buyer_id: &str, listing_id: Uuid) -> AppResult<Order> {
        let mut listing = self.listings.get(listing_id)?;
        if listing.is_owned_by(buyer_id) {
            return Err(AppError::bad_request("You cannot purchase your own listing"));
        }
        listing.status = ListingStatus::Sold;
        Ok(Order {
            transaction: Transaction {
                id: Uuid::new_v4(),
                user_id: buyer_id.to_string(),
                listing_id,
                amount: listing.price,
                created_at: Utc::now(),
            },
            listing,
            credential: vec![CredentialField {
                name: "Password".to_string(),
                kind: "password".to_string(),
                value: "hunter2".to_string(),
            }],
        })
    }

    async fn user_orders(&self, _buyer_id: &str) -> AppResult<Vec<Order>> {
        Ok(vec![])
    }

    async fn withdraw(&self, user_id: &str, amount: i64, account: String) -> AppResult<Withdrawal> {
        if amount > 1000 {
            return Err(AppError::bad_request("Insufficient balance"));
        }
        Ok(Withdrawal {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            amount,
            account,
            created_at: Utc::now(),
        })
    }
}

#[derive(Default)]
struct RecordingQueue {
    jobs: Mutex<Vec<UserSyncJob>>,
}

#[async_trait]
impl UserSyncQueue for RecordingQueue {
    async fn enqueue(&self, job: UserSyncJob) -> AppResult<()> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

// =============================================================================
// Harness
// =============================================================================

struct TestApp {
    router: Router,
    active: Uuid,
    inactive: Uuid,
    listings: Arc<FakeListings>,
    chats: Arc<FakeChats>,
    queue: Arc<RecordingQueue>,
}

impl TestApp {
    fn new() -> Self {
        Self::build(true)
    }

    fn build(with_webhook_secret: bool) -> Self {
        let active = Uuid::new_v4();
        let inactive = Uuid::new_v4();
        let listings = Arc::new(FakeListings::with(vec![
            listing(active, OWNER, ListingStatus::Active),
            listing(inactive, OWNER, ListingStatus::Inactive),
        ]));
        let chats = Arc::new(FakeChats {
            listings: listings.clone(),
            chats: Mutex::new(HashMap::new()),
            sent: Mutex::new(vec![]),
        });
        let orders = Arc::new(FakeOrders { listings: listings.clone() });
        let queue = Arc::new(RecordingQueue::default());

        let mut state = AppState::new(
            Arc::new(FakeAuth),
            listings.clone(),
            chats.clone(),
            orders,
            queue.clone(),
        );
        if with_webhook_secret {
            state = state.with_webhook_verifier(WebhookVerifier::new(WEBHOOK_SECRET).unwrap());
        }

        Self { router: create_router(state), active, inactive, listings, chats, queue }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    async fn call(&self, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer token-{user}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn webhook(&self, payload: &Value, signer: Option<&WebhookVerifier>) -> (StatusCode, Value) {
        let body = payload.to_string();
        let now = Utc::now().timestamp();
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/webhooks/clerk")
            .header(header::CONTENT_TYPE, "application/json")
            .header("svix-id", "msg_2test")
            .header("svix-timestamp", now.to_string());
        if let Some(signer) = signer {
            builder = builder.header("svix-signature", signer.sign("msg_2test", now, body.as_bytes()));
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }
}

fn listing_body() -> Value {
    json!({
        "title": "Cooking shorts",
        "platform": "tiktok",
        "username": "quickbites",
        "followers_count": 3100,
        "engagement_rate": 8.1,
        "monthly_views": 120000,
        "niche": "Food",
        "price": 900
    })
}

// =============================================================================
// Root & Health
// =============================================================================

#[tokio::test]
async fn root_returns_banner() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().is_some_and(|s| s.contains("Profile Marketplace")));
}

#[tokio::test]
async fn health_is_degraded_without_database() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["redis"]["status"], "disabled");
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = TestApp::new();

    for (method, uri) in [
        (Method::GET, "/api/listing/user"),
        (Method::GET, "/api/chat/user"),
        (Method::GET, "/api/listing/user-orders"),
    ] {
        let (status, body) = app.call(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/api/chat/user")
        .header(header::AUTHORIZATION, "Bearer not-a-session")
        .body(Body::empty())
        .unwrap();

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Listings
// =============================================================================

#[tokio::test]
async fn public_listings_need_no_session_and_hide_inactive() {
    let app = TestApp::new();
    let (status, body) = app
        .call(Method::GET, "/api/listing/public?page=1&per_page=10", None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["id"], app.active.to_string());
    assert_eq!(body["data"][0]["owner"]["id"], OWNER);
}

#[tokio::test]
async fn create_listing_with_and_without_trailing_slash() {
    let app = TestApp::new();

    for uri in ["/api/listing", "/api/listing/"] {
        let (status, body) = app.call(Method::POST, uri, Some(OWNER), Some(listing_body())).await;
        assert_eq!(status, StatusCode::CREATED, "{uri}");
        assert_eq!(body["listing"]["title"], "Cooking shorts");
        assert_eq!(body["listing"]["status"], "active");
    }

    assert_eq!(*app.listings.created_by.lock().unwrap(), vec![OWNER, OWNER]);
}

#[tokio::test]
async fn invalid_listing_is_a_validation_error() {
    let app = TestApp::new();
    let mut body = listing_body();
    body["price"] = json!(0);
    body["platform"] = json!("myspace");

    let (status, body) = app.call(Method::POST, "/api/listing", Some(OWNER), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(app.listings.created_by.lock().unwrap().is_empty());
}

#[tokio::test]
async fn update_requires_listing_id() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::PUT, "/api/listing", Some(OWNER), Some(listing_body())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Listing id is required");

    let mut with_id = listing_body();
    with_id["id"] = json!(app.active);
    let (status, body) = app.call(Method::PUT, "/api/listing/", Some(OWNER), Some(with_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["listing"]["id"], app.active.to_string());
}

#[tokio::test]
async fn toggle_and_delete_use_path_ids() {
    let app = TestApp::new();

    let uri = format!("/api/listing/{}/status", app.inactive);
    let (status, body) = app.call(Method::PUT, &uri, Some(OWNER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["listing"]["status"], "active");

    let uri = format!("/api/listing/{}", Uuid::new_v4());
    let (status, body) = app.call(Method::DELETE, &uri, Some(OWNER), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Listing not found");
}

#[tokio::test]
async fn featured_is_forbidden_for_regular_users() {
    let app = TestApp::new();
    let uri = format!("/api/listing/featured/{}", app.active);

    let (status, body) = app.call(Method::PUT, &uri, Some(BUYER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn purchase_reveals_credentials() {
    let app = TestApp::new();
    let uri = format!("/api/listing/purchase-account/{}", app.active);

    let (status, body) = app.call(Method::POST, &uri, Some(BUYER), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["user_id"], BUYER);
    assert_eq!(body["order"]["amount"], 2500);
    assert_eq!(body["order"]["listing"]["status"], "sold");
    assert_eq!(body["order"]["credential"][0]["type"], "password");
}

#[tokio::test]
async fn purchasing_own_listing_is_rejected() {
    let app = TestApp::new();
    let uri = format!("/api/listing/purchase-account/{}", app.active);

    let (status, body) = app.call(Method::POST, &uri, Some(OWNER), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn withdrawal_validates_and_reports_insufficient_balance() {
    let app = TestApp::new();

    let (status, _) = app
        .call(Method::POST, "/api/listing/withdraw", Some(OWNER), Some(json!({"amount": 0, "account": "x"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(Method::POST, "/api/listing/withdraw", Some(OWNER), Some(json!({"amount": 5000, "account": "IBAN"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Insufficient balance");

    let (status, body) = app
        .call(Method::POST, "/api/listing/withdraw", Some(OWNER), Some(json!({"amount": 400, "account": "IBAN"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["withdrawal"]["amount"], 400);
}

// =============================================================================
// Chats
// =============================================================================

#[tokio::test]
async fn buyer_gets_the_same_chat_twice_and_can_message() {
    let app = TestApp::new();
    let request = json!({ "listingId": app.active });

    let (status, first) = app.call(Method::POST, "/api/chat", Some(BUYER), Some(request.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["chat"]["chat_user_id"], BUYER);
    assert_eq!(first["chat"]["owner_user_id"], OWNER);

    let (_, second) = app.call(Method::POST, "/api/chat/", Some(BUYER), Some(request)).await;
    assert_eq!(first["chat"]["id"], second["chat"]["id"]);

    let chat_id = first["chat"]["id"].clone();
    let (status, body) = app
        .call(
            Method::POST,
            "/api/chat/send-message",
            Some(BUYER),
            Some(json!({ "chatId": chat_id, "message": "Hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_message"]["message"], "Hi");
    assert_eq!(body["new_message"]["sender_id"], BUYER);

    let (_, owner_chats) = app.call(Method::GET, "/api/chat/user", Some(OWNER), None).await;
    assert_eq!(owner_chats["chats"].as_array().map(Vec::len), Some(1));
    assert_eq!(app.chats.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn owner_cannot_open_chat_on_own_listing() {
    let app = TestApp::new();
    let (status, _) = app
        .call(Method::POST, "/api/chat", Some(OWNER), Some(json!({ "listingId": app.active })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn messages_to_inactive_listings_are_rejected() {
    let app = TestApp::new();
    let (_, chat) = app
        .call(Method::POST, "/api/chat", Some(BUYER), Some(json!({ "listingId": app.inactive })))
        .await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/chat/send-message",
            Some(BUYER),
            Some(json!({ "chatId": chat["chat"]["id"], "message": "still there?" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Listing is inactive");
    assert!(app.chats.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_message_is_rejected_before_the_service() {
    let app = TestApp::new();
    let (status, body) = app
        .call(
            Method::POST,
            "/api/chat/send-message",
            Some(BUYER),
            Some(json!({ "chatId": Uuid::new_v4(), "message": "" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// =============================================================================
// Clerk webhook
// =============================================================================

fn user_created_event() -> Value {
    json!({
        "type": "user.created",
        "object": "event",
        "data": {
            "id": "user_new",
            "email_addresses": [{"id": "idn_1", "email_address": "new@x.io"}],
            "primary_email_address_id": "idn_1",
            "first_name": "New",
            "last_name": "Seller",
            "image_url": ""
        }
    })
}

#[tokio::test]
async fn signed_user_event_is_queued() {
    let app = TestApp::new();
    let signer = WebhookVerifier::new(WEBHOOK_SECRET).unwrap();

    let (status, body) = app.webhook(&user_created_event(), Some(&signer)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event received");

    let jobs = app.queue.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].event.user_id(), "user_new");
    assert_eq!(jobs[0].delivery_id.as_deref(), Some("msg_2test"));
}

#[tokio::test]
async fn unsigned_or_foreign_signatures_are_rejected() {
    let app = TestApp::new();

    let (status, _) = app.webhook(&user_created_event(), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let foreign = WebhookVerifier::new("whsec_b3RoZXItc2VjcmV0").unwrap();
    let (status, body) = app.webhook(&user_created_event(), Some(&foreign)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid webhook signature");

    assert!(app.queue.jobs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn untracked_events_are_acknowledged() {
    let app = TestApp::new();
    let signer = WebhookVerifier::new(WEBHOOK_SECRET).unwrap();
    let event = json!({"type": "session.created", "data": {"id": "sess_1"}});

    let (status, body) = app.webhook(&event, Some(&signer)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event ignored");
    assert!(app.queue.jobs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn oversized_webhook_body_is_rejected_before_verification() {
    let app = TestApp::new();
    let signer = WebhookVerifier::new(WEBHOOK_SECRET).unwrap();

    let mut event = user_created_event();
    event["data"]["padding"] = json!("x".repeat(WEBHOOK_MAX_BODY_BYTES));

    // Streamed body without a Content-Length
    let (status, body) = app.webhook(&event, Some(&signer)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");

    // Declared length over the cap
    let payload = event.to_string();
    let now = Utc::now().timestamp();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/webhooks/clerk")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, payload.len())
        .header("svix-id", "msg_2test")
        .header("svix-timestamp", now.to_string())
        .header("svix-signature", signer.sign("msg_2test", now, payload.as_bytes()))
        .body(Body::from(payload))
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    assert!(app.queue.jobs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn webhook_without_configured_secret_fails() {
    let app = TestApp::build(false);
    let signer = WebhookVerifier::new(WEBHOOK_SECRET).unwrap();

    let (status, _) = app.webhook(&user_created_event(), Some(&signer)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
