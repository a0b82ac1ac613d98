pub mod admin;
pub mod care;
pub mod countdown;
pub mod coupon;
pub mod household;
pub mod middleware;
pub mod pet;
pub mod post;
pub mod profile;
pub mod reminder;
pub mod stats;
pub mod updates;
pub mod wishlist;

use std::collections::HashMap;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::{household_member, profile as profile_entity, HouseholdMember, Profile};
use crate::error::{AppError, AppResult};

/// Fills the request span's business fields.
pub(crate) fn record(table: &'static str, action: &'static str) {
    let span = tracing::Span::current();
    span.record("table", table);
    span.record("action", action);
}

/// The caller's membership row, or 403.
pub(crate) async fn require_member(
    db: &DatabaseConnection,
    household_id: i32,
    member_id: Uuid,
) -> AppResult<household_member::Model> {
    tracing::Span::current().record("household_id", household_id);

    HouseholdMember::find()
        .filter(household_member::Column::HouseholdId.eq(household_id))
        .filter(household_member::Column::UserId.eq(member_id))
        .one(db)
        .await?
        .ok_or(AppError::Forbidden("Not a member of this household"))
}

pub(crate) async fn is_member(db: &DatabaseConnection, household_id: i32, user_id: Uuid) -> AppResult<bool> {
    Ok(HouseholdMember::find()
        .filter(household_member::Column::HouseholdId.eq(household_id))
        .filter(household_member::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .is_some())
}

/// Ids of every household the member belongs to.
pub(crate) async fn household_ids_of(db: &DatabaseConnection, member_id: Uuid) -> AppResult<Vec<i32>> {
    Ok(HouseholdMember::find()
        .select_only()
        .column(household_member::Column::HouseholdId)
        .filter(household_member::Column::UserId.eq(member_id))
        .into_tuple()
        .all(db)
        .await?)
}

pub(crate) async fn display_names(
    db: &DatabaseConnection,
    ids: impl IntoIterator<Item = Uuid>,
) -> AppResult<HashMap<Uuid, String>> {
    let ids: Vec<Uuid> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, String)> = Profile::find()
        .select_only()
        .column(profile_entity::Column::Id)
        .column(profile_entity::Column::DisplayName)
        .filter(profile_entity::Column::Id.is_in(ids))
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows.into_iter().collect())
}

pub(crate) fn name_of(names: &HashMap<Uuid, String>, id: Uuid) -> String {
    names.get(&id).cloned().unwrap_or_else(|| "Unknown".to_string())
}

/// Trimmed text, or 400 when blank.
pub(crate) fn required_text(value: &str, field: &'static str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// `Some` trimmed text, `None` for missing or blank input.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        assert!(matches!(required_text("   ", "name"), Err(AppError::BadRequest(_))));
        assert_eq!(required_text("  Mochi ", "name").unwrap(), "Mochi");
    }

    #[test]
    fn blank_optional_text_is_dropped() {
        assert_eq!(optional_text(Some(" ".into())), None);
        assert_eq!(optional_text(Some(" hi ".into())), Some("hi".into()));
        assert_eq!(optional_text(None), None);
    }
}
