use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{display_names, is_member, name_of, record, require_member, required_text};
use crate::entities::care_event::CareAction;
use crate::entities::{care_event, pet, pet_owner, CareEvent, Pet, PetOwner};
use crate::error::{AppError, AppResult};
use crate::time::{age_on, format_relative, local_date, today_start_utc};

#[derive(Deserialize)]
pub struct CreatePetRequest {
    name: String,
    species: String,
    birthday: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct UpdatePetRequest {
    name: Option<String>,
    species: Option<String>,
    birthday: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct AddOwnerRequest {
    user_id: Uuid,
}

/// Who last did a care action today.
#[derive(Debug, Serialize, PartialEq)]
pub struct CareStatus {
    pub by: Uuid,
    pub by_name: String,
    pub at: String,
}

#[derive(Serialize)]
pub struct PetCard {
    pub id: i32,
    pub name: String,
    pub species: String,
    pub birthday: Option<NaiveDate>,
    pub age: Option<String>,
    pub owners: Vec<Uuid>,
    pub is_owner: bool,
    pub fed: Option<CareStatus>,
    pub walked: Option<CareStatus>,
    pub latest_photo: Option<String>,
}

/// Latest event of `action` among `events`, which must be newest first.
fn latest_status(
    events: &[&care_event::Model],
    action: CareAction,
    names: &HashMap<Uuid, String>,
    now: DateTime<Utc>,
) -> Option<CareStatus> {
    events.iter().find(|e| e.action == action.as_str()).map(|e| CareStatus {
        by: e.user_id,
        by_name: name_of(names, e.user_id),
        at: format_relative(e.created_at.with_timezone(&Utc), now),
    })
}

pub async fn list_pets(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
) -> AppResult<Json<Vec<PetCard>>> {
    record("pets", "list");
    require_member(&db, household_id, member_id).await?;

    let pets = Pet::find()
        .filter(pet::Column::HouseholdId.eq(household_id))
        .order_by_asc(pet::Column::CreatedAt)
        .all(&db)
        .await?;
    if pets.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let pet_ids: Vec<i32> = pets.iter().map(|p| p.id).collect();

    let owners = PetOwner::find()
        .filter(pet_owner::Column::PetId.is_in(pet_ids.clone()))
        .all(&db)
        .await?;

    let now = Utc::now();
    let today = CareEvent::find()
        .filter(care_event::Column::PetId.is_in(pet_ids))
        .filter(care_event::Column::CreatedAt.gte(today_start_utc(now)))
        .order_by_desc(care_event::Column::CreatedAt)
        .all(&db)
        .await?;
    let names = display_names(&db, today.iter().map(|e| e.user_id).collect::<HashSet<_>>()).await?;

    let mut cards = Vec::with_capacity(pets.len());
    for p in pets {
        let latest_photo = CareEvent::find()
            .filter(care_event::Column::PetId.eq(p.id))
            .filter(care_event::Column::Action.eq(CareAction::Photo.as_str()))
            .filter(care_event::Column::ImagePath.is_not_null())
            .order_by_desc(care_event::Column::CreatedAt)
            .one(&db)
            .await?
            .and_then(|e| e.image_path);

        let events: Vec<&care_event::Model> = today.iter().filter(|e| e.pet_id == p.id).collect();
        let pet_owners: Vec<Uuid> = owners.iter().filter(|o| o.pet_id == p.id).map(|o| o.user_id).collect();

        cards.push(PetCard {
            id: p.id,
            age: p.birthday.and_then(|b| age_on(b, local_date(now))).map(|a| a.to_string()),
            is_owner: pet_owners.contains(&member_id),
            owners: pet_owners,
            fed: latest_status(&events, CareAction::Feed, &names, now),
            walked: latest_status(&events, CareAction::Walk, &names, now),
            latest_photo,
            name: p.name,
            species: p.species,
            birthday: p.birthday,
        });
    }

    Ok(Json(cards))
}

pub async fn create_pet(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
    Json(payload): Json<CreatePetRequest>,
) -> AppResult<impl IntoResponse> {
    record("pets", "create");
    require_member(&db, household_id, member_id).await?;

    let txn = db.begin().await?;
    let created = pet::ActiveModel {
        household_id: Set(household_id),
        name: Set(required_text(&payload.name, "name")?),
        species: Set(required_text(&payload.species, "species")?),
        birthday: Set(payload.birthday),
        created_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    pet_owner::ActiveModel {
        pet_id: Set(created.id),
        user_id: Set(member_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    let span = tracing::Span::current();
    span.record("pet_id", created.id);
    span.record("business_event", "pet_created");
    crate::metrics::adjust_pets(1.0);

    Ok((StatusCode::CREATED, Json(created)))
}

/// Loads a pet the caller co-owns.
async fn owned_pet(db: &DatabaseConnection, pet_id: i32, member_id: Uuid) -> AppResult<pet::Model> {
    tracing::Span::current().record("pet_id", pet_id);
    let p = Pet::find_by_id(pet_id).one(db).await?.ok_or(AppError::NotFound("Pet"))?;
    let owner = PetOwner::find()
        .filter(pet_owner::Column::PetId.eq(pet_id))
        .filter(pet_owner::Column::UserId.eq(member_id))
        .one(db)
        .await?;
    match owner {
        Some(_) => Ok(p),
        None => Err(AppError::Forbidden("Only owners can change this pet")),
    }
}

pub async fn update_pet(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(pet_id): Path<i32>,
    Json(payload): Json<UpdatePetRequest>,
) -> AppResult<Json<pet::Model>> {
    record("pets", "update");
    let mut active = owned_pet(&db, pet_id, member_id).await?.into_active_model();

    if let Some(name) = payload.name {
        active.name = Set(required_text(&name, "name")?);
    }
    if let Some(species) = payload.species {
        active.species = Set(required_text(&species, "species")?);
    }
    if let Some(birthday) = payload.birthday {
        active.birthday = Set(Some(birthday));
    }

    Ok(Json(active.update(&db).await?))
}

pub async fn delete_pet(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(pet_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    record("pets", "delete");
    owned_pet(&db, pet_id, member_id).await?.delete(&db).await?;

    tracing::Span::current().record("business_event", "pet_deleted");
    crate::metrics::adjust_pets(-1.0);
    Ok(Json(json!({"message": "Pet deleted"})))
}

pub async fn add_owner(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(pet_id): Path<i32>,
    Json(payload): Json<AddOwnerRequest>,
) -> AppResult<impl IntoResponse> {
    record("pet_owners", "create");
    let p = owned_pet(&db, pet_id, member_id).await?;

    if !is_member(&db, p.household_id, payload.user_id).await? {
        return Err(AppError::BadRequest("New owner must belong to the household".to_string()));
    }
    let already = PetOwner::find()
        .filter(pet_owner::Column::PetId.eq(pet_id))
        .filter(pet_owner::Column::UserId.eq(payload.user_id))
        .one(&db)
        .await?;
    if already.is_some() {
        return Err(AppError::Conflict("Already an owner".to_string()));
    }

    let created = pet_owner::ActiveModel {
        pet_id: Set(pet_id),
        user_id: Set(payload.user_id),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(id: i32, user: u128, action: &str, at: DateTime<Utc>) -> care_event::Model {
        care_event::Model {
            id,
            pet_id: 1,
            user_id: Uuid::from_u128(user),
            action: action.to_string(),
            image_path: None,
            created_at: at.fixed_offset(),
        }
    }

    #[test]
    fn status_reports_latest_matching_action() {
        let now = Utc.with_ymd_and_hms(2026, 10, 21, 4, 0, 0).unwrap();
        let walk = event(3, 2, "walk", now - chrono::Duration::minutes(5));
        let feed_late = event(2, 1, "feed", now - chrono::Duration::minutes(30));
        let feed_early = event(1, 2, "feed", now - chrono::Duration::hours(3));
        let events = vec![&walk, &feed_late, &feed_early];
        let names = HashMap::from([(Uuid::from_u128(1), "Mum".to_string())]);

        assert_eq!(
            latest_status(&events, CareAction::Feed, &names, now),
            Some(CareStatus {
                by: Uuid::from_u128(1),
                by_name: "Mum".to_string(),
                at: "30 min ago".to_string(),
            })
        );
        assert_eq!(latest_status(&events, CareAction::Walk, &names, now).unwrap().by_name, "Unknown");
        assert_eq!(latest_status(&events, CareAction::Photo, &names, now), None);
    }
}
