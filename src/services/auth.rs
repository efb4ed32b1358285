use crate::{
    error::{AppError, AppResult},
    models::{password_reset_token, user, PasswordResetToken, Role, User, VerificationStatus},
    services::email::EmailService,
    utils::{encode_access_token, generate_refresh_token, hash_password, verify_password},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new account. Verification starts PENDING unless supplied,
    /// so fresh accounts cannot log in until approved.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Option<Role>,
        verification_status: Option<VerificationStatus>,
    ) -> AppResult<crate::models::UserModel> {
        if self.email_taken(email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            name: sea_orm::ActiveValue::Set(name.to_string()),
            email: sea_orm::ActiveValue::Set(email.to_string()),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            role: sea_orm::ActiveValue::Set(role.unwrap_or(Role::Guest)),
            verification_status: sea_orm::ActiveValue::Set(
                verification_status.unwrap_or(VerificationStatus::Pending),
            ),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let user = new_user.insert(&self.db).await?;
        Ok(user)
    }

    /// Login with email and password.
    /// Returns (user_model, access_token, refresh_token).
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> AppResult<(crate::models::UserModel, String, String)> {
        let user = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let is_valid = verify_password(password, &user.password_hash)?;
        if !is_valid {
            return Err(AppError::Unauthorized);
        }

        // Unapproved accounts cannot sign in.
        if user.verification_status != VerificationStatus::Approved {
            return Err(AppError::Unauthorized);
        }

        self.issue_tokens(user).await
    }

    /// Rotate the refresh token and mint a fresh access token.
    pub async fn refresh(
        &self,
        refresh_token: &str,
    ) -> AppResult<(crate::models::UserModel, String, String)> {
        let user = User::find()
            .filter(user::Column::RefreshToken.eq(refresh_token))
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        self.issue_tokens(user).await
    }

    /// Clear the stored refresh token so it can no longer be redeemed.
    pub async fn logout(&self, email: &str) -> AppResult<()> {
        let user = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = user.into();
        active.refresh_token = sea_orm::ActiveValue::Set(None);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;
        Ok(())
    }

    /// Request a password reset. Silently succeeds for unknown emails so the
    /// endpoint does not reveal which addresses have accounts.
    pub async fn forgot_password(
        &self,
        email: &str,
        email_service: &EmailService,
    ) -> AppResult<()> {
        let user = match User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?
        {
            Some(u) => u,
            None => return Ok(()),
        };

        let token = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().naive_utc();
        let expires = now + chrono::Duration::hours(1);

        // One reset token per user: replace any outstanding one.
        PasswordResetToken::delete_many()
            .filter(password_reset_token::Column::UserId.eq(user.id))
            .exec(&self.db)
            .await?;

        let reset = password_reset_token::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user.id),
            token: sea_orm::ActiveValue::Set(token.clone()),
            expires_at: sea_orm::ActiveValue::Set(expires),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        reset.insert(&self.db).await?;

        if let Err(e) = email_service
            .send_password_reset_email(&user.email, &token)
            .await
        {
            tracing::warn!("Failed to send password reset email: {e}");
        }

        Ok(())
    }

    /// Reset the password using a token; the token is consumed on success.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let reset = PasswordResetToken::find()
            .filter(password_reset_token::Column::Token.eq(token))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Validation("Invalid or expired token".to_string()))?;

        if chrono::Utc::now().naive_utc() > reset.expires_at {
            return Err(AppError::Validation("Token has expired".to_string()));
        }

        let user = User::find_by_id(reset.user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let new_hash = hash_password(new_password)?;
        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = user.into();
        active.password_hash = sea_orm::ActiveValue::Set(new_hash);
        active.refresh_token = sea_orm::ActiveValue::Set(None);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;

        PasswordResetToken::delete_by_id(reset.id)
            .exec(&self.db)
            .await?;

        Ok(())
    }

    async fn issue_tokens(
        &self,
        user: crate::models::UserModel,
    ) -> AppResult<(crate::models::UserModel, String, String)> {
        let access_token = encode_access_token(user.id, &user.email, user.role)?;
        let refresh_token = generate_refresh_token();

        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = user.clone().into();
        active.refresh_token = sea_orm::ActiveValue::Set(Some(refresh_token.clone()));
        active.updated_at = sea_orm::ActiveValue::Set(now);
        let user = active.update(&self.db).await?;

        Ok((user, access_token, refresh_token))
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}
