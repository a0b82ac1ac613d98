use std::collections::HashMap;

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, FixedOffset, Utc};
use rand::Rng;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{display_names, name_of, record, require_member, required_text};
use crate::entities::{household, household_member, Household, HouseholdMember, Profile};
use crate::error::{AppError, AppResult};
use crate::scoring::counter::tenure_days;

const INVITE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const INVITE_LEN: usize = 6;
const INVITE_ATTEMPTS: usize = 5;

pub fn invite_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..INVITE_LEN)
        .map(|_| INVITE_ALPHABET[rng.random_range(0..INVITE_ALPHABET.len())] as char)
        .collect()
}

/// Invite codes are matched case-insensitively.
pub fn normalize_invite_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[derive(Deserialize)]
pub struct CreateHouseholdRequest {
    pub(crate) name: String,
}

#[derive(Deserialize)]
pub struct JoinHouseholdRequest {
    invite_code: String,
}

#[derive(Serialize)]
pub struct HouseholdSummary {
    pub id: i32,
    pub name: String,
    pub invite_code: String,
    pub joined_at: DateTime<FixedOffset>,
    pub member_count: i64,
}

#[derive(Serialize)]
pub struct MemberView {
    pub user_id: Uuid,
    pub display_name: String,
    pub joined_at: DateTime<FixedOffset>,
    pub tenure_days: u32,
}

pub async fn list_households(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
) -> AppResult<Json<Vec<HouseholdSummary>>> {
    record("households", "list");
    let memberships = HouseholdMember::find()
        .filter(household_member::Column::UserId.eq(member_id))
        .order_by_asc(household_member::Column::JoinedAt)
        .all(&db)
        .await?;
    let ids: Vec<i32> = memberships.iter().map(|m| m.household_id).collect();
    if ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let households: HashMap<i32, household::Model> = Household::find()
        .filter(household::Column::Id.is_in(ids.clone()))
        .all(&db)
        .await?
        .into_iter()
        .map(|h| (h.id, h))
        .collect();
    let counts = member_counts(&db, ids).await?;

    let summaries = memberships
        .into_iter()
        .filter_map(|m| {
            let h = households.get(&m.household_id)?;
            Some(HouseholdSummary {
                id: h.id,
                name: h.name.clone(),
                invite_code: h.invite_code.clone(),
                joined_at: m.joined_at,
                member_count: counts.get(&h.id).copied().unwrap_or(0),
            })
        })
        .collect();

    Ok(Json(summaries))
}

pub(crate) async fn member_counts(db: &DatabaseConnection, household_ids: Vec<i32>) -> AppResult<HashMap<i32, i64>> {
    let rows: Vec<(i32, i64)> = HouseholdMember::find()
        .select_only()
        .column(household_member::Column::HouseholdId)
        .column_as(Expr::col(household_member::Column::Id).count(), "member_count")
        .filter(household_member::Column::HouseholdId.is_in(household_ids))
        .group_by(household_member::Column::HouseholdId)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

/// A fresh invite code no household uses yet.
pub(crate) async fn allocate_invite_code(db: &DatabaseConnection) -> AppResult<String> {
    for _ in 0..INVITE_ATTEMPTS {
        let candidate = invite_code(&mut rand::rng());
        let taken = Household::find()
            .filter(household::Column::InviteCode.eq(candidate.as_str()))
            .count(db)
            .await?
            > 0;
        if !taken {
            return Ok(candidate);
        }
    }
    Err(AppError::Conflict("Could not allocate an invite code".to_string()))
}

pub async fn create_household(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Json(payload): Json<CreateHouseholdRequest>,
) -> AppResult<impl IntoResponse> {
    record("households", "create");
    let name = required_text(&payload.name, "name")?;
    if Profile::find_by_id(member_id).one(&db).await?.is_none() {
        return Err(AppError::NotFound("Profile"));
    }

    let code = allocate_invite_code(&db).await?;

    let now = Utc::now().fixed_offset();
    let txn = db.begin().await?;
    let created = household::ActiveModel {
        name: Set(name),
        invite_code: Set(code),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    household_member::ActiveModel {
        household_id: Set(created.id),
        user_id: Set(member_id),
        joined_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    let span = tracing::Span::current();
    span.record("household_id", created.id);
    span.record("business_event", "household_created");
    crate::metrics::adjust_households(1.0);
    tracing::info!(household_id = created.id, "household created");

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn join_household(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Json(payload): Json<JoinHouseholdRequest>,
) -> AppResult<impl IntoResponse> {
    record("household_members", "join");
    let code = normalize_invite_code(&payload.invite_code);
    if Profile::find_by_id(member_id).one(&db).await?.is_none() {
        return Err(AppError::NotFound("Profile"));
    }

    let target = Household::find()
        .filter(household::Column::InviteCode.eq(code))
        .one(&db)
        .await?
        .ok_or(AppError::NotFound("Household"))?;
    tracing::Span::current().record("household_id", target.id);

    if super::is_member(&db, target.id, member_id).await? {
        return Err(AppError::Conflict("Already a member of this household".to_string()));
    }

    // the unique index still guards against a concurrent double join
    household_member::ActiveModel {
        household_id: Set(target.id),
        user_id: Set(member_id),
        joined_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    tracing::Span::current().record("business_event", "household_joined");
    Ok((StatusCode::CREATED, Json(target)))
}

pub async fn leave_household(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    record("household_members", "leave");
    let membership = require_member(&db, household_id, member_id).await?;
    membership.delete(&db).await?;

    tracing::Span::current().record("business_event", "household_left");
    Ok(Json(json!({"message": "Left household"})))
}

pub async fn list_members(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
) -> AppResult<Json<Vec<MemberView>>> {
    record("household_members", "list");
    require_member(&db, household_id, member_id).await?;

    let members = HouseholdMember::find()
        .filter(household_member::Column::HouseholdId.eq(household_id))
        .order_by_asc(household_member::Column::JoinedAt)
        .order_by_asc(household_member::Column::UserId)
        .all(&db)
        .await?;
    let names = display_names(&db, members.iter().map(|m| m.user_id)).await?;
    let now = Utc::now();

    Ok(Json(
        members
            .into_iter()
            .map(|m| MemberView {
                user_id: m.user_id,
                display_name: name_of(&names, m.user_id),
                joined_at: m.joined_at,
                tenure_days: tenure_days(m.joined_at.with_timezone(&Utc), now),
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn invite_codes_use_the_restricted_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let code = invite_code(&mut rng);
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn invite_codes_match_case_insensitively() {
        assert_eq!(normalize_invite_code("  ab12cd "), "AB12CD");
    }
}
