//! Listing, purchase and withdrawal handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::config::{is_valid_platform, MAX_LISTING_IMAGES};
use crate::domain::{CredentialField, Listing, ListingDraft, Order, Withdrawal};
use crate::errors::{AppError, AppResult};
use crate::services::UserListings;
use crate::types::{MessageResponse, PaginatedListings, PaginationParams};

/// Account handle: optional `@`, then letters, digits, `.`, `_` or `-`
static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@?[A-Za-z0-9._\-]{1,64}$").unwrap_or_else(|e| panic!("invalid regex: {e}"))
});

fn validate_platform(platform: &str) -> Result<(), ValidationError> {
    if is_valid_platform(platform) {
        Ok(())
    } else {
        Err(ValidationError::new("platform").with_message("Unsupported platform".into()))
    }
}

fn validate_images(images: &[String]) -> Result<(), ValidationError> {
    if images.len() > MAX_LISTING_IMAGES {
        return Err(ValidationError::new("images")
            .with_message(format!("You can add up to {} images", MAX_LISTING_IMAGES).into()));
    }
    if images.iter().any(|url| url.trim().is_empty()) {
        return Err(ValidationError::new("images").with_message("Image URLs cannot be empty".into()));
    }
    Ok(())
}

/// Listing details submitted by a seller
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ListingRequest {
    /// Required when updating
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 120, message = "Title is required"))]
    #[schema(example = "Premium Travel Instagram")]
    pub title: String,
    #[validate(custom(function = "validate_platform"))]
    #[schema(example = "instagram")]
    pub platform: String,
    #[validate(regex(path = *USERNAME_REGEX, message = "Invalid account username"))]
    #[schema(example = "travelwithme")]
    pub username: String,
    #[validate(range(min = 0, message = "Followers count cannot be negative"))]
    #[serde(default)]
    pub followers_count: i64,
    #[validate(range(min = 0.0, max = 100.0, message = "Engagement rate must be between 0 and 100"))]
    #[serde(default)]
    pub engagement_rate: f64,
    #[validate(range(min = 0, message = "Monthly views cannot be negative"))]
    #[serde(default)]
    pub monthly_views: i64,
    #[validate(length(min = 1, message = "Niche is required"))]
    #[schema(example = "Travel")]
    pub niche: String,
    #[validate(range(min = 1, message = "Price must be greater than zero"))]
    #[schema(example = 2500)]
    pub price: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub monetized: bool,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub age_range: String,
    /// Already-hosted image URLs
    #[validate(custom(function = "validate_images"))]
    #[serde(default)]
    pub images: Vec<String>,
}

impl ListingRequest {
    fn into_draft(self) -> ListingDraft {
        ListingDraft {
            title: self.title.trim().to_string(),
            platform: self.platform,
            username: self.username.trim_start_matches('@').to_string(),
            followers_count: self.followers_count,
            engagement_rate: self.engagement_rate,
            monthly_views: self.monthly_views,
            niche: self.niche,
            price: self.price,
            description: self.description,
            verified: self.verified,
            monetized: self.monetized,
            country: self.country,
            age_range: self.age_range,
            images: self.images,
        }
    }
}

/// Credentials for a listing, revealed to the buyer after purchase
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddCredentialRequest {
    pub listing_id: Uuid,
    #[validate(length(min = 1, message = "At least one credential field is required"))]
    pub credential: Vec<CredentialField>,
}

/// Optional explicit featured flag; omitted means toggle
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FeaturedRequest {
    pub featured: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct WithdrawRequest {
    #[validate(range(min = 1, message = "Amount must be greater than zero"))]
    #[schema(example = 1000)]
    pub amount: i64,
    #[validate(length(min = 1, message = "Account details are required"))]
    #[schema(example = "IBAN DE89 3704 0044 0532 0130 00")]
    pub account: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingResponse {
    pub message: String,
    pub listing: Listing,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub message: String,
    pub order: Order,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawalResponse {
    pub message: String,
    pub withdrawal: Withdrawal,
}

/// Create listing routes
pub fn listing_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_listing).put(update_listing))
        .route("/user", get(user_listings))
        .route("/:id/status", put(toggle_status))
        .route("/:id", delete(delete_listing))
        .route("/add-credential", post(add_credential))
        .route("/featured/:id", put(mark_featured))
        .route("/user-orders", get(user_orders))
        .route("/withdraw", post(withdraw))
        .route("/purchase-account/:id", post(purchase_account))
}

/// Routes reachable without a session
pub fn public_listing_routes() -> Router<AppState> {
    Router::new().route("/public", get(public_listings))
}

/// Drop cached public pages after a listing changes. Failures only log.
async fn invalidate_public_cache(state: &AppState) {
    if let Some(cache) = &state.cache {
        if let Err(e) = cache.invalidate_public_listings().await {
            tracing::warn!(error = %e, "Failed to invalidate public listing cache");
        }
    }
}

/// Create a listing
#[utoipa::path(
    post,
    path = "/api/listing",
    tag = "Listings",
    request_body = ListingRequest,
    responses(
        (status = 201, description = "Listing created", body = ListingResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_listing(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<ListingRequest>,
) -> AppResult<(StatusCode, Json<ListingResponse>)> {
    let listing = state
        .listing_service
        .create_listing(&user.id, payload.into_draft())
        .await?;

    invalidate_public_cache(&state).await;

    Ok((
        StatusCode::CREATED,
        Json(ListingResponse {
            message: "Account listed successfully".to_string(),
            listing,
        }),
    ))
}

/// Update a listing (id in body)
#[utoipa::path(
    put,
    path = "/api/listing",
    tag = "Listings",
    request_body = ListingRequest,
    responses(
        (status = 200, description = "Listing updated", body = ListingResponse),
        (status = 400, description = "Validation error or listing sold"),
        (status = 404, description = "Listing not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_listing(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<ListingRequest>,
) -> AppResult<Json<ListingResponse>> {
    let id = payload
        .id
        .ok_or_else(|| AppError::validation("Listing id is required"))?;

    let listing = state
        .listing_service
        .update_listing(&user.id, id, payload.into_draft())
        .await?;

    invalidate_public_cache(&state).await;

    Ok(Json(ListingResponse {
        message: "Account updated successfully".to_string(),
        listing,
    }))
}

/// Active listings, featured first then newest
#[utoipa::path(
    get,
    path = "/api/listing/public",
    tag = "Listings",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of active listings", body = PaginatedListings)
    )
)]
pub async fn public_listings(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<PaginatedListings>> {
    let params = params.normalized();

    if let Some(cache) = &state.cache {
        match cache.get_public_listings(params.page, params.per_page).await {
            Ok(Some(page)) => return Ok(Json(page)),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Public listing cache read failed"),
        }
    }

    let page = state.listing_service.public_listings(params.clone()).await?;

    if let Some(cache) = &state.cache {
        if let Err(e) = cache
            .set_public_listings(params.page, params.per_page, &page)
            .await
        {
            tracing::warn!(error = %e, "Public listing cache write failed");
        }
    }

    Ok(Json(page))
}

/// Caller's listings and balance
#[utoipa::path(
    get,
    path = "/api/listing/user",
    tag = "Listings",
    responses(
        (status = 200, description = "Own listings with balance", body = UserListings),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn user_listings(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<UserListings>> {
    let listings = state.listing_service.user_listings(&user.id).await?;
    Ok(Json(listings))
}

/// Toggle a listing between active and inactive
#[utoipa::path(
    put,
    path = "/api/listing/{id}/status",
    tag = "Listings",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Status changed", body = ListingResponse),
        (status = 400, description = "Listing is sold"),
        (status = 404, description = "Listing not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ListingResponse>> {
    let listing = state.listing_service.toggle_status(&user.id, id).await?;

    invalidate_public_cache(&state).await;

    Ok(Json(ListingResponse {
        message: format!("Listing is now {}", listing.status),
        listing,
    }))
}

/// Delete a listing with its credential, chats and messages
#[utoipa::path(
    delete,
    path = "/api/listing/{id}",
    tag = "Listings",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing deleted", body = MessageResponse),
        (status = 400, description = "Listing is sold"),
        (status = 404, description = "Listing not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_listing(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state.listing_service.delete_listing(&user.id, id).await?;

    invalidate_public_cache(&state).await;

    Ok(Json(MessageResponse::new("Listing deleted successfully")))
}

/// Submit (or replace) a listing's credentials
#[utoipa::path(
    post,
    path = "/api/listing/add-credential",
    tag = "Listings",
    request_body = AddCredentialRequest,
    responses(
        (status = 200, description = "Credentials saved", body = MessageResponse),
        (status = 400, description = "Validation error or listing sold"),
        (status = 404, description = "Listing not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_credential(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<AddCredentialRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .listing_service
        .add_credential(&user.id, payload.listing_id, payload.credential)
        .await?;

    Ok(Json(MessageResponse::new("Credentials added successfully")))
}

/// Set or toggle the featured flag (admins only)
#[utoipa::path(
    put,
    path = "/api/listing/featured/{id}",
    tag = "Listings",
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body(content = FeaturedRequest, description = "Omit `featured` to toggle"),
    responses(
        (status = 200, description = "Featured flag updated", body = ListingResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Listing not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_featured(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<FeaturedRequest>>,
) -> AppResult<Json<ListingResponse>> {
    let featured = payload.and_then(|Json(body)| body.featured);

    let listing = state
        .listing_service
        .mark_featured(&user.id, id, featured)
        .await?;

    invalidate_public_cache(&state).await;

    Ok(Json(ListingResponse {
        message: if listing.featured {
            "Listing marked as featured".to_string()
        } else {
            "Listing removed from featured".to_string()
        },
        listing,
    }))
}

/// Caller's purchases with revealed credentials, newest first
#[utoipa::path(
    get,
    path = "/api/listing/user-orders",
    tag = "Orders",
    responses(
        (status = 200, description = "Orders", body = OrdersResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn user_orders(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<OrdersResponse>> {
    let orders = state.order_service.user_orders(&user.id).await?;
    Ok(Json(OrdersResponse { orders }))
}

/// Withdraw from the available balance
#[utoipa::path(
    post,
    path = "/api/listing/withdraw",
    tag = "Orders",
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Withdrawal recorded", body = WithdrawalResponse),
        (status = 400, description = "Validation error or insufficient balance")
    ),
    security(("bearer_auth" = []))
)]
pub async fn withdraw(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<WithdrawRequest>,
) -> AppResult<Json<WithdrawalResponse>> {
    let withdrawal = state
        .order_service
        .withdraw(&user.id, payload.amount, payload.account)
        .await?;

    Ok(Json(WithdrawalResponse {
        message: "Withdrawal request submitted".to_string(),
        withdrawal,
    }))
}

/// Purchase a listing
#[utoipa::path(
    post,
    path = "/api/listing/purchase-account/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Purchased, credentials revealed", body = OrderResponse),
        (status = 400, description = "Listing unavailable, own listing or no credentials"),
        (status = 404, description = "Listing not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn purchase_account(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<OrderResponse>> {
    let order = state.order_service.purchase(&user.id, id).await?;

    invalidate_public_cache(&state).await;

    Ok(Json(OrderResponse {
        message: "Purchase successful".to_string(),
        order,
    }))
}
