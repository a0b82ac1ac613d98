use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, Set};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{optional_text, record, require_member};
use crate::entities::care_event::CareAction;
use crate::entities::{care_event, CareEvent, Pet};
use crate::error::{AppError, AppResult};

#[derive(Deserialize)]
pub struct LogCareRequest {
    action: CareAction,
    image_path: Option<String>,
}

/// A photo needs a stored image; feeding and walking carry none.
fn image_for(action: CareAction, image_path: Option<String>) -> AppResult<Option<String>> {
    match (action, optional_text(image_path)) {
        (CareAction::Photo, None) => Err(AppError::BadRequest("A photo needs an image_path".to_string())),
        (CareAction::Photo, path) => Ok(path),
        _ => Ok(None),
    }
}

pub async fn log_care(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(pet_id): Path<i32>,
    Json(payload): Json<LogCareRequest>,
) -> AppResult<impl IntoResponse> {
    record("care_events", payload.action.as_str());
    tracing::Span::current().record("pet_id", pet_id);

    let p = Pet::find_by_id(pet_id).one(&db).await?.ok_or(AppError::NotFound("Pet"))?;
    require_member(&db, p.household_id, member_id).await?;
    let image_path = image_for(payload.action, payload.image_path)?;

    let created = care_event::ActiveModel {
        pet_id: Set(pet_id),
        user_id: Set(member_id),
        action: Set(payload.action.as_str().to_string()),
        image_path: Set(image_path),
        created_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    tracing::Span::current().record("business_event", "care_logged");
    crate::metrics::increment_care_events(payload.action.as_str());
    tracing::info!(pet_id, action = payload.action.as_str(), "care logged");

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_care(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(event_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    record("care_events", "delete");
    let event = CareEvent::find_by_id(event_id)
        .one(&db)
        .await?
        .ok_or(AppError::NotFound("Care event"))?;
    if event.user_id != member_id {
        return Err(AppError::Forbidden("Only the author can delete this entry"));
    }

    event.delete(&db).await?;
    Ok(Json(json!({"message": "Care event deleted"})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photos_require_an_image() {
        assert!(matches!(image_for(CareAction::Photo, None), Err(AppError::BadRequest(_))));
        assert!(matches!(image_for(CareAction::Photo, Some("  ".into())), Err(AppError::BadRequest(_))));
        assert_eq!(
            image_for(CareAction::Photo, Some("pets/1/a.jpg".into())).unwrap(),
            Some("pets/1/a.jpg".to_string())
        );
    }

    #[test]
    fn other_actions_drop_images() {
        assert_eq!(image_for(CareAction::Feed, Some("x.jpg".into())).unwrap(), None);
        assert_eq!(image_for(CareAction::Walk, None).unwrap(), None);
    }
}
