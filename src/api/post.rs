use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{display_names, household_ids_of, name_of, optional_text, record, require_member};
use crate::entities::{household_member, post, post_like, HouseholdMember, Post, PostLike};
use crate::error::{AppError, AppResult};
use crate::time::format_relative;

const FEED_LIMIT: u64 = 20;

#[derive(Deserialize)]
pub struct CreatePostRequest {
    content: Option<String>,
    image_path: Option<String>,
    household_id: Option<i32>,
}

#[derive(Serialize)]
pub struct FeedItem {
    pub id: i32,
    pub author_id: Uuid,
    pub author_name: String,
    pub household_id: Option<i32>,
    pub content: Option<String>,
    pub image_path: Option<String>,
    pub posted: String,
    pub like_count: usize,
    pub liked_by_me: bool,
    pub is_mine: bool,
}

/// Everyone sharing at least one household with the member, the member included.
async fn co_members(db: &DatabaseConnection, household_ids: &[i32]) -> AppResult<Vec<Uuid>> {
    let ids: Vec<Uuid> = HouseholdMember::find()
        .select_only()
        .column(household_member::Column::UserId)
        .filter(household_member::Column::HouseholdId.is_in(household_ids.to_vec()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect::<HashSet<_>>().into_iter().collect())
}

fn visible_to(household_ids: Vec<i32>, authors: Vec<Uuid>) -> Condition {
    Condition::any()
        .add(post::Column::HouseholdId.is_in(household_ids))
        .add(
            Condition::all()
                .add(post::Column::HouseholdId.is_null())
                .add(post::Column::UserId.is_in(authors)),
        )
}

pub async fn feed(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
) -> AppResult<Json<Vec<FeedItem>>> {
    record("posts", "feed");
    let households = household_ids_of(&db, member_id).await?;
    let mut authors = co_members(&db, &households).await?;
    if !authors.contains(&member_id) {
        authors.push(member_id);
    }

    let posts = Post::find()
        .filter(visible_to(households, authors))
        .order_by_desc(post::Column::CreatedAt)
        .limit(FEED_LIMIT)
        .all(&db)
        .await?;
    if posts.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let likes = PostLike::find()
        .filter(post_like::Column::PostId.is_in(posts.iter().map(|p| p.id).collect::<Vec<_>>()))
        .all(&db)
        .await?;
    let mut like_counts: HashMap<i32, usize> = HashMap::new();
    let mut mine: HashSet<i32> = HashSet::new();
    for like in &likes {
        *like_counts.entry(like.post_id).or_default() += 1;
        if like.user_id == member_id {
            mine.insert(like.post_id);
        }
    }

    let names = display_names(&db, posts.iter().map(|p| p.user_id).collect::<HashSet<_>>()).await?;
    let now = Utc::now();

    Ok(Json(
        posts
            .into_iter()
            .map(|p| FeedItem {
                id: p.id,
                author_id: p.user_id,
                author_name: name_of(&names, p.user_id),
                household_id: p.household_id,
                posted: format_relative(p.created_at.with_timezone(&Utc), now),
                like_count: like_counts.get(&p.id).copied().unwrap_or(0),
                liked_by_me: mine.contains(&p.id),
                is_mine: p.user_id == member_id,
                content: p.content,
                image_path: p.image_path,
            })
            .collect(),
    ))
}

pub async fn create_post(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<impl IntoResponse> {
    record("posts", "create");
    let content = optional_text(payload.content);
    let image_path = optional_text(payload.image_path);
    if content.is_none() && image_path.is_none() {
        return Err(AppError::BadRequest("A post needs text or an image".to_string()));
    }
    if let Some(household_id) = payload.household_id {
        require_member(&db, household_id, member_id).await?;
    }

    let created = post::ActiveModel {
        user_id: Set(member_id),
        household_id: Set(payload.household_id),
        content: Set(content),
        image_path: Set(image_path),
        created_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    tracing::Span::current().record("business_event", "post_created");
    crate::metrics::increment_posts();
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_post(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(post_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    record("posts", "delete");
    let p = Post::find_by_id(post_id).one(&db).await?.ok_or(AppError::NotFound("Post"))?;
    if p.user_id != member_id {
        return Err(AppError::Forbidden("Only the author can delete this post"));
    }

    p.delete(&db).await?;
    Ok(Json(json!({"message": "Post deleted"})))
}

/// Likes the post, or takes the like back if it was already there.
pub async fn toggle_like(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(post_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    record("post_likes", "toggle");
    let p = Post::find_by_id(post_id).one(&db).await?.ok_or(AppError::NotFound("Post"))?;

    let households = household_ids_of(&db, member_id).await?;
    let visible = match p.household_id {
        Some(h) => households.contains(&h),
        None => p.user_id == member_id || co_members(&db, &households).await?.contains(&p.user_id),
    };
    if !visible {
        return Err(AppError::NotFound("Post"));
    }

    let existing = PostLike::find()
        .filter(post_like::Column::PostId.eq(post_id))
        .filter(post_like::Column::UserId.eq(member_id))
        .one(&db)
        .await?;

    let liked = match existing {
        Some(like) => {
            like.delete(&db).await?;
            false
        }
        None => {
            post_like::ActiveModel {
                post_id: Set(post_id),
                user_id: Set(member_id),
                created_at: Set(Utc::now().fixed_offset()),
                ..Default::default()
            }
            .insert(&db)
            .await?;
            true
        }
    };

    Ok(Json(json!({"post_id": post_id, "liked": liked})))
}
