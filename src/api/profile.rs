use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set};
use serde::Deserialize;
use uuid::Uuid;

use super::{optional_text, record, required_text};
use crate::entities::{profile, Profile};
use crate::error::{AppError, AppResult};

#[derive(Deserialize)]
pub struct CreateProfileRequest {
    display_name: String,
    avatar_path: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    display_name: Option<String>,
    avatar_path: Option<String>,
}

pub async fn get_profile(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
) -> AppResult<Json<profile::Model>> {
    record("profiles", "get");
    Profile::find_by_id(member_id)
        .one(&db)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Profile"))
}

/// First login: creates the profile, or returns the existing one unchanged.
pub async fn create_profile(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Json(payload): Json<CreateProfileRequest>,
) -> AppResult<Response> {
    record("profiles", "create");
    if let Some(existing) = Profile::find_by_id(member_id).one(&db).await? {
        return Ok((StatusCode::OK, Json(existing)).into_response());
    }

    let created = profile::ActiveModel {
        id: Set(member_id),
        display_name: Set(required_text(&payload.display_name, "display_name")?),
        avatar_path: Set(optional_text(payload.avatar_path)),
        role: Set("user".to_string()),
        created_at: Set(chrono::Utc::now().fixed_offset()),
    }
    .insert(&db)
    .await?;

    tracing::Span::current().record("business_event", "profile_created");
    crate::metrics::increment_profiles();
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<profile::Model>> {
    record("profiles", "update");
    let existing = Profile::find_by_id(member_id)
        .one(&db)
        .await?
        .ok_or(AppError::NotFound("Profile"))?;

    let mut active = existing.into_active_model();
    if let Some(name) = payload.display_name {
        active.display_name = Set(required_text(&name, "display_name")?);
    }
    if let Some(avatar) = payload.avatar_path {
        active.avatar_path = Set(optional_text(Some(avatar)));
    }

    Ok(Json(active.update(&db).await?))
}
