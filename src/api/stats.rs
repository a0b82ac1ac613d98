use std::sync::Arc;

use axum::extract::{Extension, Json, Path};
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;
use uuid::Uuid;

use super::{display_names, name_of, record, require_member};
use crate::config::Config;
use crate::entities::{weekly_honor, WeeklyHonor};
use crate::error::AppResult;
use crate::scoring::{self, ArchiveOutcome, Edge, MemberStanding, Title, WeekKey};

/// Honors included with the live stats.
const RECENT_HONORS: u64 = 8;

#[derive(Serialize)]
pub struct StandingView {
    pub display_name: String,
    #[serde(flatten)]
    pub standing: MemberStanding,
}

#[derive(Serialize)]
pub struct HonorView {
    pub week_key: String,
    pub member_id: Uuid,
    pub display_name: String,
    pub title: String,
    pub title_label: Option<&'static str>,
    pub score: i32,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub week: WeekKey,
    pub last_week: WeekKey,
    pub archive: ArchiveOutcome,
    pub members: Vec<StandingView>,
    pub honors: Vec<HonorView>,
}

#[derive(Serialize)]
pub struct GraphNode {
    pub id: Uuid,
    pub display_name: String,
}

#[derive(Serialize)]
pub struct GraphResponse {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<Edge>,
}

async fn honors(db: &DatabaseConnection, household_id: i32, limit: Option<u64>) -> AppResult<Vec<HonorView>> {
    let rows = WeeklyHonor::find()
        .filter(weekly_honor::Column::HouseholdId.eq(household_id))
        .order_by_desc(weekly_honor::Column::WeekKey)
        .limit(limit)
        .all(db)
        .await?;
    let names = display_names(db, rows.iter().map(|h| h.member_id)).await?;

    Ok(rows
        .into_iter()
        .map(|h| HonorView {
            display_name: name_of(&names, h.member_id),
            title_label: Title::parse(&h.title).map(|t| t.label()),
            week_key: h.week_key,
            member_id: h.member_id,
            title: h.title,
            score: h.score,
        })
        .collect())
}

/// Reads that only decorate a computed ranking fall back to empty.
fn or_empty<T: Default>(what: &'static str, result: AppResult<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = ?e, "{what} unavailable, serving stats without them");
        T::default()
    })
}

/// This week's standings. Archives last week's champion on the way.
pub async fn household_stats(
    Extension(db): Extension<DatabaseConnection>,
    Extension(config): Extension<Arc<Config>>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
) -> AppResult<Json<StatsResponse>> {
    record("weekly_honors", "stats");
    require_member(&db, household_id, member_id).await?;

    let live = scoring::live_stats(&db, household_id, Utc::now(), config.query_timeout).await;
    if let ArchiveOutcome::Archived { .. } = live.archive {
        tracing::Span::current().record("business_event", "honor_archived");
    }

    let names = or_empty(
        "display names",
        display_names(&db, live.members.iter().map(|m| m.member_id)).await,
    );
    let members = live
        .members
        .into_iter()
        .map(|standing| StandingView {
            display_name: name_of(&names, standing.member_id),
            standing,
        })
        .collect();

    Ok(Json(StatsResponse {
        week: live.week,
        last_week: live.last_week,
        archive: live.archive,
        members,
        honors: or_empty("honors", honors(&db, household_id, Some(RECENT_HONORS)).await),
    }))
}

pub async fn interaction_graph(
    Extension(db): Extension<DatabaseConnection>,
    Extension(config): Extension<Arc<Config>>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
) -> AppResult<Json<GraphResponse>> {
    record("household_members", "graph");
    require_member(&db, household_id, member_id).await?;

    let (members, graph) = scoring::load_graph(&db, household_id, config.query_timeout).await;
    let names = or_empty("display names", display_names(&db, members.iter().copied()).await);

    Ok(Json(GraphResponse {
        nodes: members
            .into_iter()
            .map(|id| GraphNode {
                id,
                display_name: name_of(&names, id),
            })
            .collect(),
        edges: graph.edges(),
    }))
}

pub async fn honor_history(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    Path(household_id): Path<i32>,
) -> AppResult<Json<Vec<HonorView>>> {
    record("weekly_honors", "list");
    require_member(&db, household_id, member_id).await?;
    Ok(Json(honors(&db, household_id, None).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use sea_orm::DbErr;

    #[test]
    fn failed_decorations_fall_back_to_empty() {
        let names: std::collections::HashMap<Uuid, String> =
            or_empty("display names", Err(AppError::Database(DbErr::Custom("down".into()))));
        assert!(names.is_empty());
        assert_eq!(name_of(&names, Uuid::from_u128(1)), "Unknown");

        let kept = or_empty("honors", Ok(vec![1, 2]));
        assert_eq!(kept, vec![1, 2]);
    }
}
