use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A feed update. `household_id = None` means the post is shown in every
/// household the author belongs to.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: Uuid,
    pub household_id: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    pub image_path: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post_like::Entity")]
    PostLike,
}

impl Related<super::post_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostLike.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
