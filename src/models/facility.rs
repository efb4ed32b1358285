use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A named amenity, deduplicated by name system-wide.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "facilities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::homestay_facility::Entity")]
    HomestayFacility,
}

impl Related<super::homestay_facility::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HomestayFacility.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
