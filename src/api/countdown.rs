use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{record, require_member, required_text};
use crate::calendar::{days_until, next_occurrence};
use crate::entities::{countdown, Countdown};
use crate::error::{AppError, AppResult};
use crate::time::local_date;

#[derive(Deserialize)]
pub struct CreateCountdownRequest {
    title: String,
    month: u32,
    day: u32,
    #[serde(default)]
    is_lunar: bool,
}

#[derive(Debug, Serialize)]
pub struct CountdownView {
    pub id: i32,
    pub title: String,
    pub month: i32,
    pub day: i32,
    pub is_lunar: bool,
    pub next_date: Option<NaiveDate>,
    pub days_left: Option<i64>,
}

fn validate_date(month: u32, day: u32, is_lunar: bool) -> AppResult<()> {
    let valid = if is_lunar {
        (1..=12).contains(&month) && (1..=30).contains(&day)
    } else {
        // 2000 is a leap year, so Feb 29 is accepted
        NaiveDate::from_ymd_opt(2000, month, day).is_some()
    };
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid date {month}-{day}")))
    }
}

/// Countdowns with their next date, soonest first. Ones without a computable
/// date go last.
pub fn upcoming(rows: Vec<countdown::Model>, today: NaiveDate) -> Vec<CountdownView> {
    let mut views: Vec<CountdownView> = rows
        .into_iter()
        .map(|c| {
            let next_date = next_occurrence(c.recurrence(), today);
            CountdownView {
                id: c.id,
                title: c.title,
                month: c.month,
                day: c.day,
                is_lunar: c.is_lunar,
                next_date,
                days_left: next_date.map(|d| days_until(d, today)),
            }
        })
        .collect();
    views.sort_by_key(|v| (v.days_left.is_none(), v.days_left.unwrap_or(0), v.id));
    views
}

pub async fn list_countdowns(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
) -> AppResult<Json<Vec<CountdownView>>> {
    record("countdowns", "list");
    require_member(&db, household_id, member_id).await?;

    let rows = Countdown::find()
        .filter(countdown::Column::HouseholdId.eq(household_id))
        .all(&db)
        .await?;
    Ok(Json(upcoming(rows, local_date(Utc::now()))))
}

pub async fn create_countdown(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
    Json(payload): Json<CreateCountdownRequest>,
) -> AppResult<impl IntoResponse> {
    record("countdowns", "create");
    require_member(&db, household_id, member_id).await?;
    validate_date(payload.month, payload.day, payload.is_lunar)?;

    let created = countdown::ActiveModel {
        household_id: Set(household_id),
        created_by: Set(member_id),
        title: Set(required_text(&payload.title, "title")?),
        month: Set(payload.month as i32),
        day: Set(payload.day as i32),
        is_lunar: Set(payload.is_lunar),
        created_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    let view = upcoming(vec![created], local_date(Utc::now())).remove(0);
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn delete_countdown(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(countdown_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    record("countdowns", "delete");
    let row = Countdown::find_by_id(countdown_id)
        .one(&db)
        .await?
        .ok_or(AppError::NotFound("Countdown"))?;
    require_member(&db, row.household_id, member_id).await?;

    row.delete(&db).await?;
    Ok(Json(json!({"message": "Countdown deleted"})))
}
