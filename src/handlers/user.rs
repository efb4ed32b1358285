use crate::error::{AppError, AppResult};
use crate::handlers::auth::UserResponse;
use crate::middleware::auth::AuthUser;
use crate::models::{Role, VerificationStatus};
use crate::response::ApiResponse;
use crate::services::user::{UserPatch, UserService};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
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

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    /// Display name (1-100 characters)
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// Phone number
    pub phone_number: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Profile picture URL
    pub profile_picture: Option<String>,
    /// Account role (SUPERUSER only)
    pub role: Option<Role>,
    /// Verification status (SUPERUSER only)
    pub verification_status: Option<VerificationStatus>,
}

#[utoipa::path(
    post,
    path = "/user",
    security(("jwt_token" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Superuser only", body = AppError),
        (status = 409, description = "Email already registered", body = AppError),
    ),
    tag = "user"
)]
pub async fn create_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    crate::middleware::auth::require_roles(&auth_user, &[Role::Superuser])?;

    let service = UserService::new(db);
    let user = service
        .create(
            &payload.name,
            &payload.email,
            &payload.password,
            payload.role,
            payload.verification_status,
        )
        .await?;

    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/user",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "List all users", body = Vec<UserResponse>),
        (status = 403, description = "Superuser only", body = AppError),
    ),
    tag = "user"
)]
pub async fn list_users(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    crate::middleware::auth::require_roles(&auth_user, &[Role::Superuser])?;

    let service = UserService::new(db);
    let users = service.list().await?;
    let response: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    get,
    path = "/user/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 403, description = "Not your account", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "user"
)]
pub async fn get_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_self_or_superuser(&auth_user, id)?;

    let service = UserService::new(db);
    let user = service.get(id).await?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/user/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not your account", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "user"
)]
pub async fn update_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    require_self_or_superuser(&auth_user, id)?;

    // Role and verification changes are privileged.
    if (payload.role.is_some() || payload.verification_status.is_some())
        && auth_user.role != Role::Superuser
    {
        return Err(AppError::Forbidden);
    }

    let service = UserService::new(db);
    let user = service
        .update(
            id,
            UserPatch {
                name: payload.name,
                phone_number: payload.phone_number,
                address: payload.address,
                profile_picture: payload.profile_picture,
                role: payload.role,
                verification_status: payload.verification_status,
            },
        )
        .await?;

    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/user/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = String),
        (status = 403, description = "Not your account", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "user"
)]
pub async fn delete_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_self_or_superuser(&auth_user, id)?;

    let service = UserService::new(db);
    service.remove(id).await?;
    Ok(ApiResponse::ok("User deleted"))
}

fn require_self_or_superuser(auth_user: &AuthUser, target_id: i32) -> AppResult<()> {
    if auth_user.role == Role::Superuser || auth_user.id == target_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i32, role: Role) -> AuthUser {
        AuthUser {
            id,
            email: "u@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn self_access_allowed() {
        assert!(require_self_or_superuser(&user(7, Role::Guest), 7).is_ok());
    }

    #[test]
    fn superuser_access_allowed() {
        assert!(require_self_or_superuser(&user(1, Role::Superuser), 7).is_ok());
    }

    #[test]
    fn other_user_forbidden() {
        assert!(require_self_or_superuser(&user(2, Role::Owner), 7).is_err());
    }
}
