use axum::extract::{Extension, Json};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use super::record;
use crate::entities::{app_update, AppUpdate};
use crate::error::AppResult;

/// The announcement currently pushed to clients, if any.
pub async fn latest_update(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<Json<Option<app_update::Model>>> {
    record("app_updates", "latest");
    let pushed = AppUpdate::find()
        .filter(app_update::Column::IsPushed.eq(true))
        .order_by_desc(app_update::Column::CreatedAt)
        .one(&db)
        .await?;
    Ok(Json(pushed))
}
