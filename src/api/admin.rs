use std::collections::HashMap;

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::household::{allocate_invite_code, member_counts, CreateHouseholdRequest};
use super::{name_of, record, required_text};
use crate::entities::{
    app_update, care_event, household, household_member, pet, pet_owner, post, post_like, profile,
    AppUpdate, CareEvent, Household, HouseholdMember, Pet, PetOwner, Post, PostLike, Profile,
};
use crate::error::{AppError, AppResult};

#[derive(Serialize)]
pub struct HouseholdRow {
    pub id: i32,
    pub name: String,
    pub invite_code: String,
    pub member_count: i64,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Serialize)]
pub struct ProfileRow {
    pub id: Uuid,
    pub display_name: String,
    pub role: String,
    /// Household names in join order; empty for members without a home.
    pub households: Vec<String>,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Serialize)]
pub struct PetRow {
    pub id: i32,
    pub name: String,
    pub species: String,
    pub household: Option<String>,
    pub owners: Vec<String>,
}

#[derive(Serialize)]
pub struct Dashboard {
    pub profiles: u64,
    pub households: u64,
    pub pets: u64,
    pub posts: u64,
    pub household_list: Vec<HouseholdRow>,
    pub profile_list: Vec<ProfileRow>,
    pub pet_list: Vec<PetRow>,
}

#[derive(Deserialize)]
pub struct PublishUpdateRequest {
    version: String,
    content: String,
    #[serde(default)]
    is_pushed: bool,
}

fn profile_rows(
    profiles: Vec<profile::Model>,
    memberships: &[household_member::Model],
    household_names: &HashMap<i32, String>,
) -> Vec<ProfileRow> {
    let mut homes: HashMap<Uuid, Vec<String>> = HashMap::new();
    for m in memberships {
        if let Some(name) = household_names.get(&m.household_id) {
            homes.entry(m.user_id).or_default().push(name.clone());
        }
    }

    profiles
        .into_iter()
        .map(|p| ProfileRow {
            households: homes.remove(&p.id).unwrap_or_default(),
            id: p.id,
            display_name: p.display_name,
            role: p.role,
            created_at: p.created_at,
        })
        .collect()
}

fn pet_rows(
    pets: Vec<pet::Model>,
    owners: &[pet_owner::Model],
    household_names: &HashMap<i32, String>,
    names: &HashMap<Uuid, String>,
) -> Vec<PetRow> {
    let mut owned: HashMap<i32, Vec<String>> = HashMap::new();
    for o in owners {
        owned.entry(o.pet_id).or_default().push(name_of(names, o.user_id));
    }

    pets.into_iter()
        .map(|p| PetRow {
            household: household_names.get(&p.household_id).cloned(),
            owners: owned.remove(&p.id).unwrap_or_default(),
            id: p.id,
            name: p.name,
            species: p.species,
        })
        .collect()
}

pub async fn dashboard(Extension(db): Extension<DatabaseConnection>) -> AppResult<Json<Dashboard>> {
    record("households", "admin_dashboard");
    let households = Household::find()
        .order_by_desc(household::Column::CreatedAt)
        .all(&db)
        .await?;
    let counts = member_counts(&db, households.iter().map(|h| h.id).collect()).await?;
    let household_names: HashMap<i32, String> = households.iter().map(|h| (h.id, h.name.clone())).collect();

    let profiles = Profile::find()
        .order_by_asc(profile::Column::CreatedAt)
        .all(&db)
        .await?;
    let names: HashMap<Uuid, String> = profiles.iter().map(|p| (p.id, p.display_name.clone())).collect();
    let memberships = HouseholdMember::find()
        .order_by_asc(household_member::Column::JoinedAt)
        .all(&db)
        .await?;
    let pets = Pet::find().order_by_asc(pet::Column::Id).all(&db).await?;
    let owners = PetOwner::find().order_by_asc(pet_owner::Column::Id).all(&db).await?;

    Ok(Json(Dashboard {
        profiles: profiles.len() as u64,
        households: households.len() as u64,
        pets: pets.len() as u64,
        posts: Post::find().count(&db).await?,
        household_list: households
            .into_iter()
            .map(|h| HouseholdRow {
                member_count: counts.get(&h.id).copied().unwrap_or(0),
                id: h.id,
                name: h.name,
                invite_code: h.invite_code,
                created_at: h.created_at,
            })
            .collect(),
        profile_list: profile_rows(profiles, &memberships, &household_names),
        pet_list: pet_rows(pets, &owners, &household_names, &names),
    }))
}

/// An empty household; members join it with the invite code.
pub async fn create_household(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<CreateHouseholdRequest>,
) -> AppResult<impl IntoResponse> {
    record("households", "admin_create");
    let name = required_text(&payload.name, "name")?;
    let code = allocate_invite_code(&db).await?;

    let created = household::ActiveModel {
        name: Set(name),
        invite_code: Set(code),
        created_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    let span = tracing::Span::current();
    span.record("household_id", created.id);
    span.record("business_event", "household_created");
    crate::metrics::adjust_households(1.0);
    tracing::info!(household_id = created.id, "household created by admin");

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn remove_member(
    Extension(db): Extension<DatabaseConnection>,
    Path((household_id, user_id)): Path<(i32, Uuid)>,
) -> AppResult<impl IntoResponse> {
    record("household_members", "admin_remove");
    let span = tracing::Span::current();
    span.record("household_id", household_id);

    let res = HouseholdMember::delete_many()
        .filter(household_member::Column::HouseholdId.eq(household_id))
        .filter(household_member::Column::UserId.eq(user_id))
        .exec(&db)
        .await?;
    if res.rows_affected == 0 {
        return Err(AppError::NotFound("Membership"));
    }

    span.record("business_event", "member_removed");
    tracing::info!(household_id, %user_id, "member removed by admin");
    Ok(Json(json!({"message": "Member removed"})))
}

/// Deletes a profile with its posts, likes, care log and pet ownerships.
/// Memberships go with the profile through the cascade.
pub async fn delete_profile(
    Extension(db): Extension<DatabaseConnection>,
    Path(user_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    record("profiles", "admin_delete");

    let txn = db.begin().await?;
    CareEvent::delete_many()
        .filter(care_event::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    PostLike::delete_many()
        .filter(post_like::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    PetOwner::delete_many()
        .filter(pet_owner::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    Post::delete_many()
        .filter(post::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    let res = Profile::delete_by_id(user_id).exec(&txn).await?;
    if res.rows_affected == 0 {
        return Err(AppError::NotFound("Profile"));
    }
    txn.commit().await?;

    tracing::Span::current().record("business_event", "profile_deleted");
    crate::metrics::decrement_profiles();
    tracing::info!(%user_id, "profile deleted by admin");
    Ok(Json(json!({"message": "Profile deleted"})))
}

/// Removes a household and, through the cascades, everything it owns.
pub async fn delete_household(
    Extension(db): Extension<DatabaseConnection>,
    Path(household_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    record("households", "admin_delete");
    tracing::Span::current().record("household_id", household_id);

    let res = Household::delete_by_id(household_id).exec(&db).await?;
    if res.rows_affected == 0 {
        return Err(AppError::NotFound("Household"));
    }

    tracing::Span::current().record("business_event", "household_deleted");
    crate::metrics::adjust_households(-1.0);
    tracing::info!(household_id, "household deleted by admin");
    Ok(Json(json!({"message": "Household deleted"})))
}

pub async fn delete_pet(
    Extension(db): Extension<DatabaseConnection>,
    Path(pet_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    record("pets", "admin_delete");
    tracing::Span::current().record("pet_id", pet_id);

    let res = Pet::delete_by_id(pet_id).exec(&db).await?;
    if res.rows_affected == 0 {
        return Err(AppError::NotFound("Pet"));
    }

    crate::metrics::adjust_pets(-1.0);
    Ok(Json(json!({"message": "Pet deleted"})))
}

/// At most one update is pushed at a time.
async fn clear_pushed<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    AppUpdate::update_many()
        .col_expr(app_update::Column::IsPushed, Expr::value(false))
        .filter(app_update::Column::IsPushed.eq(true))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn publish_update(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<PublishUpdateRequest>,
) -> AppResult<impl IntoResponse> {
    record("app_updates", "create");
    let version = required_text(&payload.version, "version")?;
    let content = required_text(&payload.content, "content")?;

    let txn = db.begin().await?;
    if payload.is_pushed {
        clear_pushed(&txn).await?;
    }
    let created = app_update::ActiveModel {
        version: Set(version),
        content: Set(content),
        is_pushed: Set(payload.is_pushed),
        created_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Pushes the update (un-pushing every other one), or withdraws it.
pub async fn toggle_update(
    Extension(db): Extension<DatabaseConnection>,
    Path(update_id): Path<i32>,
) -> AppResult<Json<app_update::Model>> {
    record("app_updates", "toggle");
    let txn = db.begin().await?;
    let existing = AppUpdate::find_by_id(update_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Update"))?;

    let push = !existing.is_pushed;
    if push {
        clear_pushed(&txn).await?;
    }
    let mut active = existing.into_active_model();
    active.is_pushed = Set(push);
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(updated))
}

pub async fn delete_update(
    Extension(db): Extension<DatabaseConnection>,
    Path(update_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    record("app_updates", "delete");
    AppUpdate::find_by_id(update_id)
        .one(&db)
        .await?
        .ok_or(AppError::NotFound("Update"))?
        .delete(&db)
        .await?;
    Ok(Json(json!({"message": "Update deleted"})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2026, 10, day, 0, 0, 0).unwrap().fixed_offset()
    }

    fn person(n: u128, name: &str) -> profile::Model {
        profile::Model {
            id: Uuid::from_u128(n),
            display_name: name.to_string(),
            avatar_path: None,
            role: "user".to_string(),
            created_at: at(1),
        }
    }

    fn membership(id: i32, household_id: i32, n: u128) -> household_member::Model {
        household_member::Model {
            id,
            household_id,
            user_id: Uuid::from_u128(n),
            joined_at: at(2),
        }
    }

    fn homes() -> HashMap<i32, String> {
        HashMap::from([(1, "Lin".to_string()), (2, "Grandma".to_string())])
    }

    #[test]
    fn profiles_list_every_household_they_belong_to() {
        let rows = profile_rows(
            vec![person(1, "Mei"), person(2, "Tao")],
            &[membership(1, 1, 1), membership(2, 2, 1), membership(3, 9, 2)],
            &homes(),
        );

        assert_eq!(rows[0].households, vec!["Lin", "Grandma"]);
        // household 9 is gone, so Tao has no home
        assert!(rows[1].households.is_empty());
    }

    #[test]
    fn pets_list_their_household_and_owners() {
        let pets = vec![
            pet::Model {
                id: 10,
                household_id: 1,
                name: "Mochi".to_string(),
                species: "cat".to_string(),
                birthday: None,
                created_at: at(3),
            },
            pet::Model {
                id: 11,
                household_id: 9,
                name: "Bean".to_string(),
                species: "dog".to_string(),
                birthday: None,
                created_at: at(3),
            },
        ];
        let owners = vec![
            pet_owner::Model {
                id: 1,
                pet_id: 10,
                user_id: Uuid::from_u128(1),
            },
            pet_owner::Model {
                id: 2,
                pet_id: 10,
                user_id: Uuid::from_u128(3),
            },
        ];
        let names = HashMap::from([(Uuid::from_u128(1), "Mei".to_string())]);

        let rows = pet_rows(pets, &owners, &homes(), &names);

        assert_eq!(rows[0].household.as_deref(), Some("Lin"));
        assert_eq!(rows[0].owners, vec!["Mei", "Unknown"]);
        assert_eq!(rows[1].household, None);
        assert!(rows[1].owners.is_empty());
    }
}
