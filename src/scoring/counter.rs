use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::store::{FamilyStore, MemberRecord};
use super::window::TimeWindow;
use super::or_zero;
use crate::entities::reminder::ReminderKind;
use crate::time::local_date;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub care: u32,
    pub posts: u32,
    pub wishlist: u32,
    pub reminders: u32,
    pub tenure_days: u32,
}

impl CategoryCounts {
    /// Sum of the four windowed categories. Tenure is not activity.
    pub fn activity_total(&self) -> u32 {
        self.care + self.posts + self.wishlist + self.reminders
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberCounts {
    pub member_id: Uuid,
    #[serde(flatten)]
    pub counts: CategoryCounts,
}

/// Actor ids per windowed category, one entry per record.
#[derive(Debug, Clone, Default)]
pub struct Activity {
    pub care: Vec<Uuid>,
    pub posts: Vec<Uuid>,
    pub wishlist: Vec<Uuid>,
    pub reminders: Vec<Uuid>,
}

pub fn tenure_days(joined_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let days = (local_date(now) - local_date(joined_at)).num_days();
    days.max(1) as u32
}

/// Per-member counts in membership order. Actors that are not members are
/// dropped.
pub fn tally(members: &[MemberRecord], activity: &Activity, now: DateTime<Utc>) -> Vec<MemberCounts> {
    let mut by_member: HashMap<Uuid, CategoryCounts> = members
        .iter()
        .map(|m| {
            (
                m.member_id,
                CategoryCounts {
                    tenure_days: tenure_days(m.joined_at, now),
                    ..Default::default()
                },
            )
        })
        .collect();

    let mut bump = |actors: &[Uuid], add: fn(&mut CategoryCounts)| {
        for actor in actors {
            if let Some(counts) = by_member.get_mut(actor) {
                add(counts);
            }
        }
    };
    bump(&activity.care, |c| c.care += 1);
    bump(&activity.posts, |c| c.posts += 1);
    bump(&activity.wishlist, |c| c.wishlist += 1);
    bump(&activity.reminders, |c| c.reminders += 1);

    members
        .iter()
        .map(|m| MemberCounts {
            member_id: m.member_id,
            counts: by_member.get(&m.member_id).copied().unwrap_or_default(),
        })
        .collect()
}

/// Counts every member's contributions within `window`.
///
/// Each category is fetched under `timeout`; a failed or slow category counts as
/// zero for everyone instead of failing the whole computation.
#[tracing::instrument(skip(store, timeout), fields(window_start = %window.start))]
pub async fn count_members<S>(
    store: &S,
    household_id: i32,
    window: &TimeWindow,
    now: DateTime<Utc>,
    timeout: Duration,
) -> Vec<MemberCounts>
where
    S: FamilyStore + ?Sized,
{
    let members = or_zero("members", household_id, timeout, store.members(household_id)).await;
    if members.is_empty() {
        return Vec::new();
    }
    let member_ids: Vec<Uuid> = members.iter().map(|m| m.member_id).collect();

    let care = or_zero("care", household_id, timeout, store.care_actors(household_id, window)).await;
    let posts = or_zero(
        "posts",
        household_id,
        timeout,
        store.post_authors(household_id, &member_ids, window),
    )
    .await;
    let wishlist = or_zero(
        "wishlist",
        household_id,
        timeout,
        store.wishlist_creators(household_id, window),
    )
    .await;
    let reminders = or_zero(
        "reminders",
        household_id,
        timeout,
        store.reminders(household_id, Some(window)),
    )
    .await
    .into_iter()
    .filter(|r| {
        ReminderKind::classify(r.kind.as_deref(), &r.content, r.target_id.is_some()) != ReminderKind::System
    })
    .map(|r| r.sender_id)
    .collect();

    let activity = Activity {
        care,
        posts,
        wishlist,
        reminders,
    };

    tally(&members, &activity, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn member(n: u128, joined_at: DateTime<Utc>) -> MemberRecord {
        MemberRecord {
            member_id: Uuid::from_u128(n),
            joined_at,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 21, 4, 0, 0).unwrap()
    }

    #[test]
    fn every_member_appears_with_zero_counts() {
        let members = vec![member(1, now() - chrono::Duration::days(3)), member(2, now())];
        let out = tally(&members, &Activity::default(), now());

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].member_id, Uuid::from_u128(1));
        assert_eq!(out[0].counts.activity_total(), 0);
        assert_eq!(out[0].counts.tenure_days, 3);
        assert_eq!(out[1].counts.tenure_days, 1);
    }

    #[test]
    fn counts_each_category_independently() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let outsider = Uuid::from_u128(99);
        let members = vec![member(1, now()), member(2, now())];
        let activity = Activity {
            care: vec![a, a, b, outsider],
            posts: vec![b],
            wishlist: vec![a],
            reminders: vec![b, b, outsider],
        };

        let out = tally(&members, &activity, now());
        assert_eq!(
            out[0].counts,
            CategoryCounts {
                care: 2,
                posts: 0,
                wishlist: 1,
                reminders: 0,
                tenure_days: 1
            }
        );
        assert_eq!(
            out[1].counts,
            CategoryCounts {
                care: 1,
                posts: 1,
                wishlist: 0,
                reminders: 2,
                tenure_days: 1
            }
        );
    }

    #[test]
    fn tenure_uses_local_calendar_days() {
        // joined 23:30 local on the 19th, now is 12:00 local on the 21st
        let joined = Utc.with_ymd_and_hms(2026, 10, 19, 15, 30, 0).unwrap();
        assert_eq!(tenure_days(joined, now()), 2);
    }

    #[test]
    fn tenure_never_drops_below_one() {
        assert_eq!(tenure_days(now(), now()), 1);
        assert_eq!(tenure_days(now() + chrono::Duration::days(2), now()), 1);
    }
}
