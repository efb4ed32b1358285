use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Booking, Homestay, Role, Room},
};
use sea_orm::{DatabaseConnection, EntityTrait};

/// Target of an ownership check, dispatched over the known entity kinds so
/// the compiler enforces exhaustive handling.
#[derive(Debug, Clone, Copy)]
pub enum OwnedEntity {
    Booking(i32),
    Homestay(i32),
    Room(i32),
}

/// Resolved ownership of an entity: the owning homestay's owner, plus the
/// booking guest where the entity is a booking.
struct ResolvedOwnership {
    owner_id: i32,
    guest_id: Option<i32>,
}

/// Assert the caller may act on the entity:
/// SUPERUSER always passes; a GUEST passes on their own booking; an OWNER or
/// COMMUNITY_OWNER passes when they own the entity's homestay.
pub async fn assert_entity_access(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
    entity: OwnedEntity,
) -> AppResult<()> {
    if auth_user.role == Role::Superuser {
        return Ok(());
    }

    let resolved = resolve_ownership(db, entity).await?;

    let allowed = match auth_user.role {
        Role::Superuser => true,
        Role::Guest => resolved.guest_id == Some(auth_user.id),
        Role::Owner | Role::CommunityOwner => resolved.owner_id == auth_user.id,
    };

    if allowed {
        Ok(())
    } else {
        tracing::warn!(
            user_id = auth_user.id,
            ?entity,
            "Ownership check failed"
        );
        Err(AppError::Forbidden)
    }
}

async fn resolve_ownership(
    db: &DatabaseConnection,
    entity: OwnedEntity,
) -> AppResult<ResolvedOwnership> {
    match entity {
        OwnedEntity::Booking(id) => {
            let booking = Booking::find_by_id(id)
                .one(db)
                .await?
                .ok_or(AppError::NotFound)?;
            let owner_id = homestay_owner(db, booking.homestay_id).await?;
            Ok(ResolvedOwnership {
                owner_id,
                guest_id: Some(booking.guest_id),
            })
        }
        OwnedEntity::Homestay(id) => {
            let owner_id = homestay_owner(db, id).await?;
            Ok(ResolvedOwnership {
                owner_id,
                guest_id: None,
            })
        }
        OwnedEntity::Room(id) => {
            let room = Room::find_by_id(id)
                .one(db)
                .await?
                .ok_or(AppError::NotFound)?;
            let owner_id = homestay_owner(db, room.homestay_id).await?;
            Ok(ResolvedOwnership {
                owner_id,
                guest_id: None,
            })
        }
    }
}

async fn homestay_owner(db: &DatabaseConnection, homestay_id: i32) -> AppResult<i32> {
    let homestay = Homestay::find_by_id(homestay_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(homestay.owner_id)
}
