use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::{Role, UserModel, VerificationStatus};
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use crate::services::email::EmailService;
use anyhow::anyhow;
use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Display name (1-100 characters)
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Email address
    #[validate(email)]
    pub email: String,
    /// Password (min 8 characters)
    #[validate(length(min = 8))]
    pub password: String,
    /// Account role; defaults to GUEST
    pub role: Option<Role>,
    /// Verification status; defaults to PENDING
    pub verification_status: Option<VerificationStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// User password
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// JWT access token
    pub access_token: String,
    /// Opaque refresh token (also set as an HttpOnly cookie)
    pub refresh_token: String,
    /// User ID
    pub user_id: i32,
    /// Account role
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    /// User ID
    pub id: i32,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Account role
    pub role: Role,
    /// Verification status
    pub verification_status: VerificationStatus,
    /// Phone number
    pub phone_number: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Profile picture URL
    pub profile_picture: Option<String>,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            verification_status: user.verification_status,
            phone_number: user.phone_number,
            address: user.address,
            profile_picture: user.profile_picture,
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Email already registered", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    tracing::info!(email = %payload.email, "Registering user");

    let service = AuthService::new(db);
    let user = service
        .register(
            &payload.name,
            &payload.email,
            &payload.password,
            payload.role,
            payload.verification_status,
        )
        .await?;

    Ok(ApiResponse::with_message(
        UserResponse::from(user),
        "Registration successful".to_string(),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials or unapproved account", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let (user, access_token, refresh_token) =
        service.login(&payload.email, &payload.password).await?;

    tracing::info!(email = %user.email, "Login successful");

    let response = AuthResponse {
        access_token,
        refresh_token: refresh_token.clone(),
        user_id: user.id,
        role: user.role,
    };

    let mut http_response = ApiResponse::ok(response).into_response();
    set_refresh_cookie(&mut http_response, &refresh_token)?;
    Ok(http_response)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    /// Refresh token; may be omitted when the cookie is present
    pub refresh_token: Option<String>,
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair issued", body = AuthResponse),
        (status = 401, description = "Invalid or missing refresh token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    payload: Option<Json<RefreshTokenRequest>>,
) -> AppResult<impl IntoResponse> {
    let refresh_token = crate::utils::cookie::extract_cookie(
        &headers,
        crate::utils::cookie::REFRESH_TOKEN_COOKIE,
    )
    .or_else(|| payload.and_then(|Json(body)| body.refresh_token))
    .ok_or(AppError::Unauthorized)?;

    let service = AuthService::new(db);
    let (user, access_token, new_refresh_token) = service.refresh(&refresh_token).await?;

    let response = AuthResponse {
        access_token,
        refresh_token: new_refresh_token.clone(),
        user_id: user.id,
        role: user.role,
    };

    let mut http_response = ApiResponse::ok(response).into_response();
    set_refresh_cookie(&mut http_response, &new_refresh_token)?;
    Ok(http_response)
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Logout successful", body = String),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn logout(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    service.logout(&auth_user.email).await?;

    tracing::info!(email = %auth_user.email, "Logged out");

    let mut response = ApiResponse::ok("Logged out successfully").into_response();
    clear_refresh_cookie(&mut response)?;
    Ok(response)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    /// Email address
    #[validate(email)]
    pub email: String,
}

#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Password reset email sent if account exists", body = serde_json::Value),
        (status = 400, description = "Validation error", body = AppError),
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    service
        .forgot_password(&payload.email, &email_service)
        .await?;

    // Always report success so the endpoint cannot be used for email enumeration.
    Ok(ApiResponse::ok(serde_json::json!({
        "message": "If an account with that email exists, a password reset link has been sent."
    })))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    /// Password reset token
    pub token: String,
    /// New password (min 8 characters)
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset successfully", body = serde_json::Value),
        (status = 400, description = "Invalid or expired token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn reset_password(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    service
        .reset_password(&payload.token, &payload.new_password)
        .await?;

    Ok(ApiResponse::ok(serde_json::json!({
        "message": "Password has been reset successfully"
    })))
}

fn set_refresh_cookie(response: &mut Response, refresh_token: &str) -> AppResult<()> {
    let cookie = crate::utils::cookie::build_refresh_cookie(
        refresh_token,
        crate::utils::jwt::refresh_token_expiry_seconds(),
    );
    response.headers_mut().append(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|e| anyhow!("Invalid cookie header: {e}"))?,
    );
    Ok(())
}

fn clear_refresh_cookie(response: &mut Response) -> AppResult<()> {
    let cookie = crate::utils::cookie::build_clear_refresh_cookie();
    response.headers_mut().append(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|e| anyhow!("Invalid cookie header: {e}"))?,
    );
    Ok(())
}
