use super::enums::VerificationStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub homestay_id: i32,
    pub guest_id: i32,
    pub check_in: DateTime,
    pub check_out: DateTime,
    pub adults: i32,
    pub children: Option<i32>,
    pub total_people: i32,
    /// PENDING -> APPROVED | REJECTED via verification;
    /// any non-CANCELED state -> CANCELED via cancellation. CANCELED is terminal.
    pub status: VerificationStatus,
    pub cancellation_reason: Option<String>,
    pub canceled_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::homestay::Entity",
        from = "Column::HomestayId",
        to = "super::homestay::Column::Id"
    )]
    Homestay,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::GuestId",
        to = "super::user::Column::Id"
    )]
    Guest,
}

impl Related<super::homestay::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Homestay.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Guest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
