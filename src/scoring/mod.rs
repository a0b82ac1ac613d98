//! Weekly family scoring: per-member activity counts, titles, the archived
//! weekly champion and the interaction graph.

pub mod archive;
pub mod champion;
pub mod counter;
pub mod graph;
pub mod store;
pub mod title;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use serde::Serialize;
use uuid::Uuid;

pub use archive::{archive_last_week, ArchiveOutcome};
pub use champion::{select_champion, Champion};
pub use counter::{count_members, CategoryCounts, MemberCounts};
pub use graph::{load_graph, Edge, InteractionGraph};
pub use store::FamilyStore;
pub use title::{assign_title, Title};
pub use window::{TimeWindow, WeekKey, WeekWindows};

/// Days of membership worth one unit of weekly activity.
pub const TENURE_DAYS_PER_UNIT: f64 = 30.0;
pub const LIKE_WEIGHT: i64 = 1;
pub const POKE_WEIGHT: i64 = 2;
pub const COUPON_ACTIVE_WEIGHT: i64 = 3;
pub const COUPON_USED_WEIGHT: i64 = 5;
pub const COUPON_VOID_WEIGHT: i64 = -3;

/// Awaits a store query under `timeout`, falling back to the empty value.
pub(crate) async fn or_zero<T, F>(category: &'static str, household_id: i32, timeout: Duration, query: F) -> T
where
    T: Default,
    F: Future<Output = Result<T, DbErr>>,
{
    match tokio::time::timeout(timeout, query).await {
        Ok(Ok(rows)) => rows,
        Ok(Err(e)) => {
            tracing::warn!(category, household_id, error = %e, "scoring query failed, counting as zero");
            crate::metrics::increment_scoring_failures(category);
            T::default()
        }
        Err(_) => {
            tracing::warn!(category, household_id, ?timeout, "scoring query timed out, counting as zero");
            crate::metrics::increment_scoring_failures(category);
            T::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberStanding {
    pub member_id: Uuid,
    #[serde(flatten)]
    pub counts: CategoryCounts,
    pub title: Title,
    pub title_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiveStats {
    pub week: WeekKey,
    pub last_week: WeekKey,
    pub archive: ArchiveOutcome,
    pub members: Vec<MemberStanding>,
}

/// This week's standings for a household. Archives last week's champion first
/// if that has not happened yet.
pub async fn live_stats<S>(store: &S, household_id: i32, now: DateTime<Utc>, timeout: Duration) -> LiveStats
where
    S: FamilyStore + ?Sized,
{
    let windows = WeekWindows::resolve(now);
    let archive = archive_last_week(store, household_id, &windows, now, timeout).await;

    let members = count_members(store, household_id, &windows.this_week, now, timeout)
        .await
        .into_iter()
        .map(|m| {
            let title = assign_title(&m.counts);
            MemberStanding {
                member_id: m.member_id,
                counts: m.counts,
                title,
                title_label: title.label(),
            }
        })
        .collect();

    LiveStats {
        week: windows.this_week_key,
        last_week: windows.last_week_key,
        archive,
        members,
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemoryStore;
    use super::*;
    use chrono::TimeZone;

    const TIMEOUT: Duration = Duration::from_millis(200);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 21, 4, 0, 0).unwrap()
    }

    fn earlier_today() -> DateTime<Utc> {
        now() - chrono::Duration::hours(2)
    }

    #[tokio::test]
    async fn newcomer_with_care_outranks_idle_elder() {
        let store = MemoryStore::new(7);
        let a = store.add_member(Uuid::from_u128(1), now() - chrono::Duration::days(35));
        let b = store.add_member(Uuid::from_u128(2), now() - chrono::Duration::days(2));
        for _ in 0..3 {
            store.add_care(b, earlier_today());
        }

        let stats = live_stats(&store, 7, now(), TIMEOUT).await;
        assert_eq!(stats.week.to_string(), "2026-W43");
        assert_eq!(stats.archive, ArchiveOutcome::NoChampion);

        let by_id = |id: Uuid| stats.members.iter().find(|m| m.member_id == id).unwrap();
        assert_eq!(by_id(a).title, Title::Elder);
        assert_eq!(by_id(a).counts.tenure_days, 35);
        assert_eq!(by_id(b).title, Title::Guardian);
        assert_eq!(by_id(b).counts.care, 3);
    }

    #[tokio::test]
    async fn failed_category_counts_as_zero() {
        let store = MemoryStore::new(7);
        let a = store.add_member(Uuid::from_u128(1), now() - chrono::Duration::days(5));
        store.add_care(a, earlier_today());
        store.add_post(a, earlier_today());
        store.add_post(a, earlier_today());
        store.fail("posts");

        let windows = WeekWindows::resolve(now());
        let counts = count_members(&store, 7, &windows.this_week, now(), TIMEOUT).await;
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].counts.care, 1);
        assert_eq!(counts[0].counts.posts, 0);
    }

    #[tokio::test]
    async fn stalled_category_times_out_to_zero() {
        let store = MemoryStore::new(7);
        let a = store.add_member(Uuid::from_u128(1), now() - chrono::Duration::days(5));
        store.add_wishlist(a, earlier_today());
        store.add_reminder(a, None, "vet on friday", Some("note"), earlier_today());
        store.stall("wishlist");

        let windows = WeekWindows::resolve(now());
        let counts = count_members(&store, 7, &windows.this_week, now(), Duration::from_millis(20)).await;
        assert_eq!(counts[0].counts.wishlist, 0);
        assert_eq!(counts[0].counts.reminders, 1);
    }

    #[tokio::test]
    async fn public_posts_count_for_the_household() {
        let store = MemoryStore::new(7);
        let a = store.add_member(Uuid::from_u128(1), now() - chrono::Duration::days(5));
        store.add_scoped_post(a, None, earlier_today());
        store.add_scoped_post(a, Some(7), earlier_today());
        store.add_scoped_post(a, Some(8), earlier_today());

        let windows = WeekWindows::resolve(now());
        let counts = count_members(&store, 7, &windows.this_week, now(), TIMEOUT).await;
        assert_eq!(counts[0].counts.posts, 2);
    }

    #[tokio::test]
    async fn system_reminders_are_not_authored_activity() {
        let store = MemoryStore::new(7);
        let a = store.add_member(Uuid::from_u128(1), now() - chrono::Duration::days(5));
        let b = store.add_member(Uuid::from_u128(2), now() - chrono::Duration::days(5));
        store.add_reminder(a, Some(b), "🎫 coupon: one back rub", None, earlier_today());
        store.add_reminder(a, Some(b), "👋", Some("poke"), earlier_today());
        store.add_reminder(a, Some(b), "issued", Some("system"), earlier_today());

        let windows = WeekWindows::resolve(now());
        let counts = count_members(&store, 7, &windows.this_week, now(), TIMEOUT).await;
        assert_eq!(counts[0].counts.reminders, 1);
    }

    #[tokio::test]
    async fn missing_members_yield_empty_stats() {
        let store = MemoryStore::new(7);
        store.fail("members");
        let stats = live_stats(&store, 7, now(), TIMEOUT).await;
        assert!(stats.members.is_empty());
    }

    #[tokio::test]
    async fn graph_loads_full_history() {
        let store = MemoryStore::new(7);
        let a = store.add_member(Uuid::from_u128(1), now() - chrono::Duration::days(50));
        let b = store.add_member(Uuid::from_u128(2), now() - chrono::Duration::days(50));
        store.add_like(a, b);
        store.add_like(a, b);
        store.add_coupon(b, a, "void");
        store.add_reminder(b, Some(a), "👋 poked you", None, now() - chrono::Duration::days(40));

        let (members, graph) = load_graph(&store, 7, TIMEOUT).await;
        assert_eq!(members, vec![a, b]);
        assert_eq!(graph.raw_weight(a, b), 2);
        assert_eq!(graph.raw_weight(b, a), -1);
        assert_eq!(graph.edges().len(), 1);
    }

    #[tokio::test]
    async fn graph_survives_failed_sources() {
        let store = MemoryStore::new(7);
        let a = store.add_member(Uuid::from_u128(1), now());
        let b = store.add_member(Uuid::from_u128(2), now());
        store.add_like(a, b);
        store.add_coupon(a, b, "used");
        store.fail("coupons");

        let (_, graph) = load_graph(&store, 7, TIMEOUT).await;
        assert_eq!(graph.raw_weight(a, b), 1);
    }

    #[tokio::test]
    async fn graph_ignores_likes_on_other_households_posts() {
        let store = MemoryStore::new(7);
        let a = store.add_member(Uuid::from_u128(1), now());
        let b = store.add_member(Uuid::from_u128(2), now());
        store.add_scoped_like(a, b, Some(8));
        store.add_scoped_like(a, b, Some(8));
        store.add_scoped_like(a, b, None);

        let (_, graph) = load_graph(&store, 7, TIMEOUT).await;
        assert_eq!(graph.raw_weight(a, b), 1);
    }
}
