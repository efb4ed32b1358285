use super::enums::RoomStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "rooms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub homestay_id: i32,
    pub name: String,
    pub description: String,
    pub price: i32,
    pub adults: i32,
    pub children: Option<i32>,
    pub total_people: i32,
    #[sea_orm(column_type = "Json", nullable)]
    #[schema(value_type = Option<Vec<String>>)]
    pub images: Option<Json>,
    pub status: RoomStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::homestay::Entity",
        from = "Column::HomestayId",
        to = "super::homestay::Column::Id"
    )]
    Homestay,
}

impl Related<super::homestay::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Homestay.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
