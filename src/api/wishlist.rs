use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{optional_text, record, require_member, required_text};
use crate::entities::{wishlist_item, WishlistItem};
use crate::error::{AppError, AppResult};

#[derive(Deserialize)]
pub struct CreateItemRequest {
    name: String,
    note: Option<String>,
}

pub async fn list_items(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
) -> AppResult<Json<Vec<wishlist_item::Model>>> {
    record("wishlist_items", "list");
    require_member(&db, household_id, member_id).await?;

    let items = WishlistItem::find()
        .filter(wishlist_item::Column::HouseholdId.eq(household_id))
        .order_by_asc(wishlist_item::Column::IsDone)
        .order_by_desc(wishlist_item::Column::CreatedAt)
        .all(&db)
        .await?;
    Ok(Json(items))
}

pub async fn create_item(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
    Json(payload): Json<CreateItemRequest>,
) -> AppResult<impl IntoResponse> {
    record("wishlist_items", "create");
    require_member(&db, household_id, member_id).await?;

    let created = wishlist_item::ActiveModel {
        household_id: Set(household_id),
        user_id: Set(member_id),
        name: Set(required_text(&payload.name, "name")?),
        note: Set(optional_text(payload.note)),
        is_done: Set(false),
        created_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn household_item(db: &DatabaseConnection, item_id: i32, member_id: Uuid) -> AppResult<wishlist_item::Model> {
    let item = WishlistItem::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Wishlist item"))?;
    require_member(db, item.household_id, member_id).await?;
    Ok(item)
}

pub async fn toggle_item(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(item_id): Path<i32>,
) -> AppResult<Json<wishlist_item::Model>> {
    record("wishlist_items", "toggle");
    let item = household_item(&db, item_id, member_id).await?;

    let done = !item.is_done;
    let mut active = item.into_active_model();
    active.is_done = Set(done);
    Ok(Json(active.update(&db).await?))
}

pub async fn delete_item(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(item_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    record("wishlist_items", "delete");
    household_item(&db, item_id, member_id).await?.delete(&db).await?;
    Ok(Json(json!({"message": "Wishlist item deleted"})))
}
