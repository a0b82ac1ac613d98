use std::collections::HashSet;

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{display_names, is_member, name_of, record, require_member, required_text};
use crate::entities::reminder::ReminderKind;
use crate::entities::{reminder, Reminder};
use crate::error::{AppError, AppResult};
use crate::time::format_relative;

#[derive(Deserialize)]
pub struct CreateReminderRequest {
    content: String,
    target_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct PokeRequest {
    target_id: Uuid,
}

#[derive(Serialize)]
pub struct ReminderView {
    pub id: i32,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub target_id: Option<Uuid>,
    pub content: String,
    pub kind: ReminderKind,
    pub is_read: bool,
    pub sent: String,
    pub created_at: DateTime<FixedOffset>,
}

pub fn poke_message(sender_name: &str) -> String {
    format!("👋 {sender_name} poked you")
}

/// Writes a reminder with an explicit kind. Shared with coupon issuing.
pub(crate) async fn write_reminder<C: ConnectionTrait>(
    db: &C,
    household_id: i32,
    sender_id: Uuid,
    target_id: Option<Uuid>,
    content: String,
    kind: ReminderKind,
) -> AppResult<reminder::Model> {
    Ok(reminder::ActiveModel {
        household_id: Set(household_id),
        sender_id: Set(sender_id),
        target_id: Set(target_id),
        content: Set(content),
        kind: Set(Some(kind.as_str().to_string())),
        is_read: Set(false),
        created_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Another member of the same household, or 400.
pub(crate) async fn require_other_member(
    db: &DatabaseConnection,
    household_id: i32,
    member_id: Uuid,
    target_id: Uuid,
) -> AppResult<()> {
    if target_id == member_id {
        return Err(AppError::BadRequest("Pick another member".to_string()));
    }
    if !is_member(db, household_id, target_id).await? {
        return Err(AppError::BadRequest("Target is not in this household".to_string()));
    }
    Ok(())
}

/// Broadcasts, reminders I sent and reminders addressed to me.
pub async fn list_reminders(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
) -> AppResult<Json<Vec<ReminderView>>> {
    record("reminders", "list");
    require_member(&db, household_id, member_id).await?;

    let rows = Reminder::find()
        .filter(reminder::Column::HouseholdId.eq(household_id))
        .filter(
            Condition::any()
                .add(reminder::Column::TargetId.is_null())
                .add(reminder::Column::TargetId.eq(member_id))
                .add(reminder::Column::SenderId.eq(member_id)),
        )
        .order_by_desc(reminder::Column::CreatedAt)
        .all(&db)
        .await?;
    let names = display_names(&db, rows.iter().map(|r| r.sender_id).collect::<HashSet<_>>()).await?;
    let now = Utc::now();

    Ok(Json(
        rows.into_iter()
            .map(|r| ReminderView {
                kind: r.resolved_kind(),
                sender_name: name_of(&names, r.sender_id),
                sent: format_relative(r.created_at.with_timezone(&Utc), now),
                id: r.id,
                sender_id: r.sender_id,
                target_id: r.target_id,
                content: r.content,
                is_read: r.is_read,
                created_at: r.created_at,
            })
            .collect(),
    ))
}

pub async fn create_reminder(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
    Json(payload): Json<CreateReminderRequest>,
) -> AppResult<impl IntoResponse> {
    record("reminders", "create");
    require_member(&db, household_id, member_id).await?;
    let content = required_text(&payload.content, "content")?;
    if let Some(target) = payload.target_id {
        require_other_member(&db, household_id, member_id, target).await?;
    }

    let created = write_reminder(&db, household_id, member_id, payload.target_id, content, ReminderKind::Note).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn poke(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
    Json(payload): Json<PokeRequest>,
) -> AppResult<impl IntoResponse> {
    record("reminders", "poke");
    require_member(&db, household_id, member_id).await?;
    require_other_member(&db, household_id, member_id, payload.target_id).await?;

    let names = display_names(&db, [member_id]).await?;
    let content = poke_message(&name_of(&names, member_id));
    let created = write_reminder(
        &db,
        household_id,
        member_id,
        Some(payload.target_id),
        content,
        ReminderKind::Poke,
    )
    .await?;

    tracing::Span::current().record("business_event", "poke_sent");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn mark_read(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(reminder_id): Path<i32>,
) -> AppResult<Json<reminder::Model>> {
    record("reminders", "read");
    let row = Reminder::find_by_id(reminder_id)
        .one(&db)
        .await?
        .ok_or(AppError::NotFound("Reminder"))?;
    match row.target_id {
        Some(target) if target != member_id => {
            return Err(AppError::Forbidden("Only the recipient can mark this read"));
        }
        Some(_) => {}
        None => {
            require_member(&db, row.household_id, member_id).await?;
        }
    }

    let mut active = row.into_active_model();
    active.is_read = Set(true);
    Ok(Json(active.update(&db).await?))
}

pub async fn delete_reminder(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(reminder_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    record("reminders", "delete");
    let row = Reminder::find_by_id(reminder_id)
        .one(&db)
        .await?
        .ok_or(AppError::NotFound("Reminder"))?;
    if row.sender_id != member_id {
        return Err(AppError::Forbidden("Only the sender can delete this reminder"));
    }

    row.delete(&db).await?;
    Ok(Json(json!({"message": "Reminder deleted"})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poke_text_reads_as_a_poke_on_legacy_readers() {
        let text = poke_message("Dad");
        assert_eq!(text, "👋 Dad poked you");
        assert_eq!(ReminderKind::classify(None, &text, true), ReminderKind::Poke);
    }
}
