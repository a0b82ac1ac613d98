use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::champion::{select_champion, Champion};
use super::counter::count_members;
use super::store::{FamilyStore, HonorWrite, NewHonor};
use super::window::WeekWindows;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArchiveOutcome {
    AlreadyArchived,
    Archived { champion: Champion },
    /// Nobody was active last week. Nothing is stored, so the next request
    /// evaluates the week again.
    NoChampion,
    /// A concurrent request archived the week first.
    Conflict,
    /// The store could not be read or written; retried on the next request.
    Skipped,
}

/// The honor column is a signed int; saturate instead of wrapping.
fn stored_score(score: u32) -> i32 {
    i32::try_from(score).unwrap_or(i32::MAX)
}

/// Archives last week's champion for the household unless a record already
/// exists. Never fails the caller.
#[tracing::instrument(skip(store, windows, timeout), fields(week = %windows.last_week_key))]
pub async fn archive_last_week<S>(
    store: &S,
    household_id: i32,
    windows: &WeekWindows,
    now: DateTime<Utc>,
    timeout: Duration,
) -> ArchiveOutcome
where
    S: FamilyStore + ?Sized,
{
    let week_key = windows.last_week_key.to_string();

    match tokio::time::timeout(timeout, store.honor_exists(household_id, &week_key)).await {
        Ok(Ok(true)) => return ArchiveOutcome::AlreadyArchived,
        Ok(Ok(false)) => {}
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "honor lookup failed, skipping archival");
            return ArchiveOutcome::Skipped;
        }
        Err(_) => {
            tracing::warn!("honor lookup timed out, skipping archival");
            return ArchiveOutcome::Skipped;
        }
    }

    let counts = count_members(store, household_id, &windows.last_week, now, timeout).await;
    let Some(champion) = select_champion(&counts) else {
        tracing::debug!("no activity last week, nothing to archive");
        return ArchiveOutcome::NoChampion;
    };

    let honor = NewHonor {
        household_id,
        week_key,
        member_id: champion.member_id,
        title: champion.title.as_str().to_string(),
        score: stored_score(champion.score),
        created_at: now,
    };

    match tokio::time::timeout(timeout, store.insert_honor(honor)).await {
        Ok(Ok(HonorWrite::Inserted)) => {
            tracing::info!(
                member_id = %champion.member_id,
                title = champion.title.as_str(),
                score = champion.score,
                "archived weekly honor"
            );
            crate::metrics::increment_honors_archived();
            ArchiveOutcome::Archived { champion }
        }
        Ok(Ok(HonorWrite::AlreadyPresent)) => {
            tracing::debug!("weekly honor written concurrently");
            crate::metrics::increment_honor_conflicts();
            ArchiveOutcome::Conflict
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "weekly honor insert failed");
            ArchiveOutcome::Skipped
        }
        Err(_) => {
            tracing::warn!("weekly honor insert timed out");
            ArchiveOutcome::Skipped
        }
    }
}
