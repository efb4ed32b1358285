use crate::error::{AppError, AppResult};
use crate::handlers::homestay::HomestayResponse;
use crate::middleware::auth::{require_roles, AuthUser};
use crate::middleware::ownership::{assert_entity_access, OwnedEntity};
use crate::models::{BookingModel, Role, UserModel, VerificationStatus};
use crate::response::ApiResponse;
use crate::services::booking::{BookingPatch, BookingService, NewBooking};
use crate::services::email::EmailService;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

const HOST_ROLES: &[Role] = &[Role::Owner, Role::CommunityOwner, Role::Superuser];

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    /// Target homestay ID
    pub homestay_id: i32,
    /// Check-in date
    pub check_in: chrono::NaiveDateTime,
    /// Check-out date
    pub check_out: chrono::NaiveDateTime,
    /// Number of adults
    #[validate(range(min = 1))]
    pub adults: i32,
    /// Number of children
    pub children: Option<i32>,
    /// Total party size counted against capacity
    #[validate(range(min = 1))]
    pub total_people: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookingRequest {
    /// Check-in date
    pub check_in: Option<chrono::NaiveDateTime>,
    /// Check-out date
    pub check_out: Option<chrono::NaiveDateTime>,
    /// Number of adults
    pub adults: Option<i32>,
    /// Number of children
    pub children: Option<i32>,
    /// Rejected: capacity counters are not reconciled through this path
    pub total_people: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyBookingRequest {
    /// New status: APPROVED or REJECTED
    pub status: VerificationStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CancelBookingRequest {
    /// Reason recorded on the booking and relayed to the owner
    #[validate(length(min = 1, max = 500))]
    pub cancellation_reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingResponse {
    /// Booking ID
    pub id: i32,
    /// Homestay ID
    pub homestay_id: i32,
    /// Guest user ID
    pub guest_id: i32,
    /// Check-in date
    pub check_in: String,
    /// Check-out date
    pub check_out: String,
    /// Number of adults
    pub adults: i32,
    /// Number of children
    pub children: Option<i32>,
    /// Total party size
    pub total_people: i32,
    /// Booking status
    pub status: VerificationStatus,
    /// Cancellation reason, if canceled
    pub cancellation_reason: Option<String>,
    /// Cancellation timestamp, if canceled
    pub canceled_at: Option<String>,
}

impl From<BookingModel> for BookingResponse {
    fn from(b: BookingModel) -> Self {
        Self {
            id: b.id,
            homestay_id: b.homestay_id,
            guest_id: b.guest_id,
            check_in: b.check_in.to_string(),
            check_out: b.check_out.to_string(),
            adults: b.adults,
            children: b.children,
            total_people: b.total_people,
            status: b.status,
            cancellation_reason: b.cancellation_reason,
            canceled_at: b.canceled_at.map(|t| t.to_string()),
        }
    }
}

/// Guest projection exposed to owners: never includes password or tokens.
#[derive(Debug, Serialize, ToSchema)]
pub struct GuestProfile {
    /// User ID
    pub id: i32,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Account role
    pub role: Role,
    /// Phone number
    pub phone_number: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Verification status
    pub verification_status: VerificationStatus,
    /// Profile picture URL
    pub profile_picture: Option<String>,
}

impl From<UserModel> for GuestProfile {
    fn from(u: UserModel) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            phone_number: u.phone_number,
            address: u.address,
            verification_status: u.verification_status,
            profile_picture: u.profile_picture,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OwnerBookingResponse {
    #[serde(flatten)]
    #[schema(inline)]
    pub booking: BookingResponse,
    /// The booked homestay
    pub homestay: HomestayResponse,
    /// The guest who booked
    pub guest: GuestProfile,
}

#[utoipa::path(
    post,
    path = "/bookings",
    security(("jwt_token" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 200, description = "Booking created (PENDING)", body = BookingResponse),
        (status = 400, description = "Validation error or capacity exceeded", body = AppError),
        (status = 404, description = "Homestay not found", body = AppError),
    ),
    tag = "booking"
)]
pub async fn create_booking(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    tracing::info!(guest = %auth_user.email, "Creating booking");

    let service = BookingService::new(db);
    let booking = service
        .create(
            auth_user.id,
            NewBooking {
                homestay_id: payload.homestay_id,
                check_in: payload.check_in,
                check_out: payload.check_out,
                adults: payload.adults,
                children: payload.children,
                total_people: payload.total_people,
            },
        )
        .await?;

    Ok(ApiResponse::ok(BookingResponse::from(booking)))
}

#[utoipa::path(
    get,
    path = "/bookings",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Bookings against the caller's homestays", body = Vec<OwnerBookingResponse>),
        (status = 403, description = "Hosts only", body = AppError),
    ),
    tag = "booking"
)]
pub async fn list_bookings(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    require_roles(&auth_user, HOST_ROLES)?;

    tracing::info!(owner = %auth_user.email, "Listing bookings for owner");

    let service = BookingService::new(db);
    let rows = service.list_for_owner(auth_user.id).await?;
    let response: Vec<OwnerBookingResponse> = rows
        .into_iter()
        .map(|(booking, homestay, guest)| OwnerBookingResponse {
            booking: BookingResponse::from(booking),
            homestay: HomestayResponse::from(homestay),
            guest: GuestProfile::from(guest),
        })
        .collect();
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    get,
    path = "/bookings/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking details", body = BookingResponse),
        (status = 403, description = "Not your booking", body = AppError),
        (status = 404, description = "Booking not found", body = AppError),
    ),
    tag = "booking"
)]
pub async fn get_booking(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    assert_entity_access(&db, &auth_user, OwnedEntity::Booking(id)).await?;

    let service = BookingService::new(db);
    let booking = service.get(id).await?;
    Ok(ApiResponse::ok(BookingResponse::from(booking)))
}

#[utoipa::path(
    patch,
    path = "/bookings/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Booking updated", body = BookingResponse),
        (status = 400, description = "total_people cannot be changed here", body = AppError),
        (status = 403, description = "Not your booking", body = AppError),
        (status = 404, description = "Booking not found", body = AppError),
    ),
    tag = "booking"
)]
pub async fn update_booking(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateBookingRequest>,
) -> AppResult<impl IntoResponse> {
    // Party size is capacity-bearing; changing it here would desynchronize
    // the homestay's total_booked counter.
    if payload.total_people.is_some() {
        return Err(AppError::Validation(
            "total_people cannot be changed; cancel and rebook instead".to_string(),
        ));
    }

    assert_entity_access(&db, &auth_user, OwnedEntity::Booking(id)).await?;

    let service = BookingService::new(db);
    let booking = service
        .update(
            id,
            BookingPatch {
                check_in: payload.check_in,
                check_out: payload.check_out,
                adults: payload.adults,
                children: payload.children,
            },
        )
        .await?;

    Ok(ApiResponse::ok(BookingResponse::from(booking)))
}

#[utoipa::path(
    delete,
    path = "/bookings/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking deleted, capacity restored", body = String),
        (status = 403, description = "Not your booking", body = AppError),
        (status = 404, description = "Booking not found", body = AppError),
    ),
    tag = "booking"
)]
pub async fn delete_booking(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    assert_entity_access(&db, &auth_user, OwnedEntity::Booking(id)).await?;

    let service = BookingService::new(db);
    service.remove(id).await?;
    Ok(ApiResponse::ok("Booking deleted"))
}

#[utoipa::path(
    patch,
    path = "/bookings/verify-booking/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    request_body = VerifyBookingRequest,
    responses(
        (status = 200, description = "Booking approved or rejected", body = BookingResponse),
        (status = 400, description = "Status must be APPROVED or REJECTED", body = AppError),
        (status = 403, description = "Not the homestay owner", body = AppError),
        (status = 404, description = "Booking not found", body = AppError),
        (status = 409, description = "Booking already canceled", body = AppError),
    ),
    tag = "booking"
)]
pub async fn verify_booking(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<VerifyBookingRequest>,
) -> AppResult<impl IntoResponse> {
    require_roles(&auth_user, HOST_ROLES)?;
    assert_entity_access(&db, &auth_user, OwnedEntity::Booking(id)).await?;

    tracing::info!(booking_id = id, status = ?payload.status, "Verifying booking");

    let service = BookingService::new(db);
    let booking = service.verify(id, payload.status, &email_service).await?;
    Ok(ApiResponse::ok(BookingResponse::from(booking)))
}

#[utoipa::path(
    patch,
    path = "/bookings/{id}/cancel",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    request_body = CancelBookingRequest,
    responses(
        (status = 200, description = "Booking canceled, capacity released", body = BookingResponse),
        (status = 403, description = "Not your booking", body = AppError),
        (status = 404, description = "Booking not found", body = AppError),
        (status = 409, description = "Booking already canceled", body = AppError),
    ),
    tag = "booking"
)]
pub async fn cancel_booking(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CancelBookingRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    require_roles(
        &auth_user,
        &[Role::Guest, Role::CommunityOwner, Role::Superuser],
    )?;
    assert_entity_access(&db, &auth_user, OwnedEntity::Booking(id)).await?;

    tracing::info!(booking_id = id, user_id = auth_user.id, "Canceling booking");

    let service = BookingService::new(db);
    let booking = service
        .cancel(id, &payload.cancellation_reason, &email_service)
        .await?;
    Ok(ApiResponse::ok(BookingResponse::from(booking)))
}
