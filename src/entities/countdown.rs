use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calendar::Recurrence;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "countdowns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub household_id: i32,
    pub created_by: Uuid,
    pub title: String,
    pub month: i32,
    pub day: i32,
    pub is_lunar: bool,
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
}

impl Related<super::household::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Household.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn recurrence(&self) -> Recurrence {
        let (month, day) = (self.month.max(0) as u32, self.day.max(0) as u32);
        if self.is_lunar {
            Recurrence::Lunar { month, day }
        } else {
            Recurrence::Solar { month, day }
        }
    }
}
