use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "pets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub household_id: i32,
    pub name: String,
    pub species: String,
    pub birthday: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::household::Entity",
        from = "Column::HouseholdId",
        to = "super::household::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Household,
    #[sea_orm(has_many = "super::care_event::Entity")]
    CareEvent,
}

impl Related<super::household::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Household.def()
    }
}

impl Related<super::care_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CareEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
