use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_roles, AuthUser};
use crate::middleware::ownership::{assert_entity_access, OwnedEntity};
use crate::models::{HomestayModel, Role, VerificationStatus};
use crate::response::ApiResponse;
use crate::services::homestay::{HomestayPatch, HomestayService, NewHomestay, NewRoom};
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

const LISTING_ROLES: &[Role] = &[Role::Owner, Role::CommunityOwner, Role::Superuser];

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRoomRequest {
    /// Room name (1-200 characters)
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Room description (max 2000 characters)
    #[validate(length(max = 2000))]
    pub description: String,
    /// Nightly price
    #[validate(range(min = 0))]
    pub price: i32,
    /// Adult capacity
    #[validate(range(min = 1))]
    pub adults: i32,
    /// Child capacity
    pub children: Option<i32>,
    /// Total sleeping capacity
    #[validate(range(min = 1))]
    pub total_people: i32,
    /// Image URLs
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateHomestayRequest {
    /// Listing name (1-200 characters)
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Listing description (max 2000 characters)
    #[validate(length(max = 2000))]
    pub description: String,
    /// Location (1-255 characters)
    #[validate(length(min = 1, max = 255))]
    pub location: String,
    /// Total guest capacity
    #[validate(range(min = 1))]
    pub total_capacity: i32,
    /// Check-in policy time
    pub check_in: chrono::NaiveDateTime,
    /// Check-out policy time
    pub check_out: chrono::NaiveDateTime,
    /// Image URLs
    pub images: Option<Vec<String>>,
    /// Nested rooms
    #[validate(nested)]
    #[serde(default)]
    pub rooms: Vec<CreateRoomRequest>,
    /// Facility names, deduplicated system-wide
    #[serde(default)]
    pub facilities: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateHomestayRequest {
    /// Listing name (1-200 characters)
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    /// Listing description (max 2000 characters)
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Location (1-255 characters)
    #[validate(length(min = 1, max = 255))]
    pub location: Option<String>,
    /// Total guest capacity
    #[validate(range(min = 1))]
    pub total_capacity: Option<i32>,
    /// Listing status
    pub status: Option<VerificationStatus>,
    /// Check-in policy time
    pub check_in: Option<chrono::NaiveDateTime>,
    /// Check-out policy time
    pub check_out: Option<chrono::NaiveDateTime>,
    /// Image URLs
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchQuery {
    /// Location substring, matched case-insensitively
    pub location: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HomestayResponse {
    /// Homestay ID
    pub id: i32,
    /// Owner user ID
    pub owner_id: i32,
    /// Listing name
    pub name: String,
    /// Listing description
    pub description: String,
    /// Location
    pub location: String,
    /// Total guest capacity
    pub total_capacity: i32,
    /// Currently reserved occupancy
    pub total_booked: i32,
    /// Listing status
    pub status: VerificationStatus,
    /// Check-in policy time
    pub check_in: String,
    /// Check-out policy time
    pub check_out: String,
    /// Image URLs
    pub images: Option<serde_json::Value>,
}

impl From<HomestayModel> for HomestayResponse {
    fn from(h: HomestayModel) -> Self {
        Self {
            id: h.id,
            owner_id: h.owner_id,
            name: h.name,
            description: h.description,
            location: h.location,
            total_capacity: h.total_capacity,
            total_booked: h.total_booked,
            status: h.status,
            check_in: h.check_in.to_string(),
            check_out: h.check_out.to_string(),
            images: h.images,
        }
    }
}

#[utoipa::path(
    post,
    path = "/homestay",
    security(("jwt_token" = [])),
    request_body = CreateHomestayRequest,
    responses(
        (status = 200, description = "Homestay created", body = HomestayResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "OWNER already has a listing", body = AppError),
    ),
    tag = "homestay"
)]
pub async fn create_homestay(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateHomestayRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    require_roles(&auth_user, LISTING_ROLES)?;

    tracing::info!(owner_id = auth_user.id, "Creating homestay");

    let service = HomestayService::new(db);
    let homestay = service
        .create(
            auth_user.id,
            auth_user.role,
            NewHomestay {
                name: payload.name,
                description: payload.description,
                location: payload.location,
                total_capacity: payload.total_capacity,
                check_in: payload.check_in,
                check_out: payload.check_out,
                images: payload.images,
                rooms: payload
                    .rooms
                    .into_iter()
                    .map(|r| NewRoom {
                        name: r.name,
                        description: r.description,
                        price: r.price,
                        adults: r.adults,
                        children: r.children,
                        total_people: r.total_people,
                        images: r.images,
                    })
                    .collect(),
                facilities: payload.facilities,
            },
        )
        .await?;

    Ok(ApiResponse::ok(HomestayResponse::from(homestay)))
}

#[utoipa::path(
    get,
    path = "/homestay",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Caller's listings (all listings for SUPERUSER)", body = Vec<HomestayResponse>),
        (status = 403, description = "Forbidden", body = AppError),
    ),
    tag = "homestay"
)]
pub async fn list_my_homestays(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    require_roles(&auth_user, LISTING_ROLES)?;

    let service = HomestayService::new(db);
    let homestays = service.list_mine(auth_user.id, auth_user.role).await?;
    let response: Vec<HomestayResponse> =
        homestays.into_iter().map(HomestayResponse::from).collect();
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    get,
    path = "/homestay/list-all",
    responses(
        (status = 200, description = "All listings, visible to guests", body = Vec<HomestayResponse>),
    ),
    tag = "homestay"
)]
pub async fn list_all_homestays(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = HomestayService::new(db);
    let homestays = service.list_all().await?;
    let response: Vec<HomestayResponse> =
        homestays.into_iter().map(HomestayResponse::from).collect();
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    get,
    path = "/homestay/search",
    params(("location" = String, Query, description = "Location substring")),
    responses(
        (status = 200, description = "Listings matching the location", body = Vec<HomestayResponse>),
    ),
    tag = "homestay"
)]
pub async fn search_homestays(
    Extension(db): Extension<DatabaseConnection>,
    Query(query): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(location = %query.location, "Searching homestays");

    let service = HomestayService::new(db);
    let homestays = service.search(&query.location).await?;
    let response: Vec<HomestayResponse> =
        homestays.into_iter().map(HomestayResponse::from).collect();
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    get,
    path = "/homestay/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Homestay ID")),
    responses(
        (status = 200, description = "Homestay details", body = HomestayResponse),
        (status = 404, description = "Homestay not found", body = AppError),
    ),
    tag = "homestay"
)]
pub async fn get_homestay(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_roles(&auth_user, LISTING_ROLES)?;

    let service = HomestayService::new(db);
    let homestay = service.get(id).await?;
    Ok(ApiResponse::ok(HomestayResponse::from(homestay)))
}

#[utoipa::path(
    patch,
    path = "/homestay/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Homestay ID")),
    request_body = UpdateHomestayRequest,
    responses(
        (status = 200, description = "Homestay updated", body = HomestayResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the owner", body = AppError),
        (status = 404, description = "Homestay not found", body = AppError),
    ),
    tag = "homestay"
)]
pub async fn update_homestay(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateHomestayRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    require_roles(&auth_user, LISTING_ROLES)?;
    assert_entity_access(&db, &auth_user, OwnedEntity::Homestay(id)).await?;

    let service = HomestayService::new(db);
    let homestay = service
        .update(
            id,
            HomestayPatch {
                name: payload.name,
                description: payload.description,
                location: payload.location,
                total_capacity: payload.total_capacity,
                status: payload.status,
                check_in: payload.check_in,
                check_out: payload.check_out,
                images: payload.images,
            },
        )
        .await?;

    Ok(ApiResponse::ok(HomestayResponse::from(homestay)))
}

#[utoipa::path(
    delete,
    path = "/homestay/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Homestay ID")),
    responses(
        (status = 200, description = "Homestay and its bookings deleted", body = String),
        (status = 403, description = "Not the owner", body = AppError),
        (status = 404, description = "Homestay not found", body = AppError),
    ),
    tag = "homestay"
)]
pub async fn delete_homestay(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_roles(&auth_user, LISTING_ROLES)?;
    assert_entity_access(&db, &auth_user, OwnedEntity::Homestay(id)).await?;

    let service = HomestayService::new(db);
    service.remove(id).await?;
    Ok(ApiResponse::ok("Homestay deleted"))
}
