use crate::{
    error::{AppError, AppResult},
    models::{user, Role, User, UserModel, VerificationStatus},
    utils::hash_password,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

pub struct UserService {
    db: DatabaseConnection,
}

pub struct UserPatch {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    pub role: Option<Role>,
    pub verification_status: Option<VerificationStatus>,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Option<Role>,
        verification_status: Option<VerificationStatus>,
    ) -> AppResult<UserModel> {
        let existing = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let now = chrono::Utc::now().naive_utc();
        let new_user = user::ActiveModel {
            name: sea_orm::ActiveValue::Set(name.to_string()),
            email: sea_orm::ActiveValue::Set(email.to_string()),
            password_hash: sea_orm::ActiveValue::Set(hash_password(password)?),
            role: sea_orm::ActiveValue::Set(role.unwrap_or(Role::Guest)),
            verification_status: sea_orm::ActiveValue::Set(
                verification_status.unwrap_or(VerificationStatus::Pending),
            ),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        Ok(new_user.insert(&self.db).await?)
    }

    pub async fn list(&self) -> AppResult<Vec<UserModel>> {
        Ok(User::find().all(&self.db).await?)
    }

    pub async fn get(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn update(&self, id: i32, patch: UserPatch) -> AppResult<UserModel> {
        let user = self.get(id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: user::ActiveModel = user.into();
        if let Some(name) = patch.name {
            active.name = sea_orm::ActiveValue::Set(name);
        }
        if let Some(phone_number) = patch.phone_number {
            active.phone_number = sea_orm::ActiveValue::Set(Some(phone_number));
        }
        if let Some(address) = patch.address {
            active.address = sea_orm::ActiveValue::Set(Some(address));
        }
        if let Some(profile_picture) = patch.profile_picture {
            active.profile_picture = sea_orm::ActiveValue::Set(Some(profile_picture));
        }
        if let Some(role) = patch.role {
            active.role = sea_orm::ActiveValue::Set(role);
        }
        if let Some(status) = patch.verification_status {
            active.verification_status = sea_orm::ActiveValue::Set(status);
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        Ok(active.update(&self.db).await?)
    }

    pub async fn remove(&self, id: i32) -> AppResult<()> {
        let user = self.get(id).await?;
        User::delete_by_id(user.id).exec(&self.db).await?;
        Ok(())
    }
}
