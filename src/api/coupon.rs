use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use super::reminder::{require_other_member, write_reminder};
use super::{display_names, name_of, record, require_member, required_text};
use crate::entities::coupon::CouponStatus;
use crate::entities::reminder::ReminderKind;
use crate::entities::{coupon, Coupon};
use crate::error::{AppError, AppResult};

#[derive(Deserialize)]
pub struct IssueCouponRequest {
    target_id: Uuid,
    title: String,
}

/// Who may move a coupon out of `active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Actor {
    Issuer,
    Target,
}

/// Only active coupons move: the target redeems, the issuer voids.
fn transition(current: &str, to: CouponStatus, actor: Actor) -> AppResult<CouponStatus> {
    let required = match to {
        CouponStatus::Used => Actor::Target,
        CouponStatus::Void => Actor::Issuer,
        CouponStatus::Active => return Err(AppError::Conflict("Coupons cannot be reactivated".to_string())),
    };
    if actor != required {
        return Err(AppError::Forbidden(match required {
            Actor::Target => "Only the recipient can redeem this coupon",
            Actor::Issuer => "Only the issuer can void this coupon",
        }));
    }
    match CouponStatus::parse(current) {
        Some(CouponStatus::Active) => Ok(to),
        _ => Err(AppError::Conflict(format!("Coupon is already {current}"))),
    }
}

pub fn coupon_message(issuer_name: &str, title: &str) -> String {
    format!("🎫 {issuer_name} gave you a coupon: {title}")
}

pub async fn list_coupons(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
) -> AppResult<Json<Vec<coupon::Model>>> {
    record("coupons", "list");
    require_member(&db, household_id, member_id).await?;

    let rows = Coupon::find()
        .filter(coupon::Column::HouseholdId.eq(household_id))
        .order_by_desc(coupon::Column::CreatedAt)
        .all(&db)
        .await?;
    Ok(Json(rows))
}

/// Issues a coupon and notifies the target with a system reminder.
pub async fn issue_coupon(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
    Json(payload): Json<IssueCouponRequest>,
) -> AppResult<impl IntoResponse> {
    record("coupons", "issue");
    require_member(&db, household_id, member_id).await?;
    require_other_member(&db, household_id, member_id, payload.target_id).await?;
    let title = required_text(&payload.title, "title")?;
    let names = display_names(&db, [member_id]).await?;

    let now = Utc::now().fixed_offset();
    let txn = db.begin().await?;
    let created = coupon::ActiveModel {
        household_id: Set(household_id),
        issuer_id: Set(member_id),
        target_id: Set(payload.target_id),
        title: Set(title.clone()),
        status: Set(CouponStatus::Active.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    write_reminder(
        &txn,
        household_id,
        member_id,
        Some(payload.target_id),
        coupon_message(&name_of(&names, member_id), &title),
        ReminderKind::System,
    )
    .await?;
    txn.commit().await?;

    tracing::Span::current().record("business_event", "coupon_issued");
    crate::metrics::increment_coupons_issued();
    Ok((StatusCode::CREATED, Json(created)))
}

async fn move_coupon(
    db: &DatabaseConnection,
    coupon_id: i32,
    member_id: Uuid,
    to: CouponStatus,
) -> AppResult<coupon::Model> {
    let row = Coupon::find_by_id(coupon_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Coupon"))?;
    tracing::Span::current().record("household_id", row.household_id);

    let actor = if row.target_id == member_id {
        Actor::Target
    } else if row.issuer_id == member_id {
        Actor::Issuer
    } else {
        return Err(AppError::Forbidden("Not your coupon"));
    };
    let next = transition(&row.status, to, actor)?;

    let mut active = row.into_active_model();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(Utc::now().fixed_offset());
    Ok(active.update(db).await?)
}

pub async fn redeem_coupon(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(coupon_id): Path<i32>,
) -> AppResult<Json<coupon::Model>> {
    record("coupons", "redeem");
    let updated = move_coupon(&db, coupon_id, member_id, CouponStatus::Used).await?;
    tracing::Span::current().record("business_event", "coupon_redeemed");
    Ok(Json(updated))
}

pub async fn void_coupon(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(coupon_id): Path<i32>,
) -> AppResult<Json<coupon::Model>> {
    record("coupons", "void");
    let updated = move_coupon(&db, coupon_id, member_id, CouponStatus::Void).await?;
    tracing::Span::current().record("business_event", "coupon_voided");
    Ok(Json(updated))
}
