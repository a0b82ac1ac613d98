//! In-memory `FamilyStore` for a single household.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use uuid::Uuid;

use super::store::{
    CouponRecord, FamilyStore, HonorWrite, LikeRecord, MemberRecord, NewHonor, ReminderRecord,
};
use super::window::TimeWindow;

#[derive(Default)]
pub struct MemoryStore {
    household_id: i32,
    members: Mutex<Vec<MemberRecord>>,
    care: Mutex<Vec<(Uuid, DateTime<Utc>)>>,
    posts: Mutex<Vec<(Uuid, Option<i32>, DateTime<Utc>)>>,
    wishlist: Mutex<Vec<(Uuid, DateTime<Utc>)>>,
    reminders: Mutex<Vec<(ReminderRecord, DateTime<Utc>)>>,
    likes: Mutex<Vec<(LikeRecord, Option<i32>)>>,
    coupons: Mutex<Vec<CouponRecord>>,
    honors: Mutex<Vec<NewHonor>>,
    failing: Mutex<HashSet<&'static str>>,
    stalled: Mutex<HashSet<&'static str>>,
    pub fail_all: AtomicBool,
    pub hide_existing_honors: AtomicBool,
    pub member_queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new(household_id: i32) -> Self {
        Self {
            household_id,
            ..Default::default()
        }
    }

    pub fn add_member(&self, id: Uuid, joined_at: DateTime<Utc>) -> Uuid {
        self.members.lock().unwrap().push(MemberRecord {
            member_id: id,
            joined_at,
        });
        id
    }

    pub fn add_care(&self, actor: Uuid, at: DateTime<Utc>) {
        self.care.lock().unwrap().push((actor, at));
    }

    pub fn add_post(&self, author: Uuid, at: DateTime<Utc>) {
        self.posts.lock().unwrap().push((author, Some(self.household_id), at));
    }

    pub fn add_scoped_post(&self, author: Uuid, scope: Option<i32>, at: DateTime<Utc>) {
        self.posts.lock().unwrap().push((author, scope, at));
    }

    pub fn add_wishlist(&self, creator: Uuid, at: DateTime<Utc>) {
        self.wishlist.lock().unwrap().push((creator, at));
    }

    pub fn add_reminder(
        &self,
        sender: Uuid,
        target: Option<Uuid>,
        content: &str,
        kind: Option<&str>,
        at: DateTime<Utc>,
    ) {
        self.reminders.lock().unwrap().push((
            ReminderRecord {
                sender_id: sender,
                target_id: target,
                content: content.to_string(),
                kind: kind.map(str::to_string),
            },
            at,
        ));
    }

    pub fn add_like(&self, liker: Uuid, author: Uuid) {
        self.add_scoped_like(liker, author, Some(self.household_id));
    }

    /// A like on a post whose `household_id` is `scope`.
    pub fn add_scoped_like(&self, liker: Uuid, author: Uuid, scope: Option<i32>) {
        self.likes.lock().unwrap().push((
            LikeRecord {
                liker_id: liker,
                author_id: author,
            },
            scope,
        ));
    }

    pub fn add_coupon(&self, issuer: Uuid, target: Uuid, status: &str) {
        self.coupons.lock().unwrap().push(CouponRecord {
            issuer_id: issuer,
            target_id: target,
            status: status.to_string(),
        });
    }

    pub fn fail(&self, source: &'static str) {
        self.failing.lock().unwrap().insert(source);
    }

    pub fn stall(&self, source: &'static str) {
        self.stalled.lock().unwrap().insert(source);
    }

    pub fn honors(&self) -> Vec<NewHonor> {
        self.honors.lock().unwrap().clone()
    }

    async fn enter(&self, source: &'static str, household_id: i32) -> Result<bool, DbErr> {
        let failing = self.fail_all.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(source);
        if failing {
            return Err(DbErr::Custom(format!("{} unavailable", source)));
        }
        let stalled = self.stalled.lock().unwrap().contains(source);
        if stalled {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        }
        Ok(household_id == self.household_id)
    }
}

fn in_window(at: DateTime<Utc>, window: Option<&TimeWindow>) -> bool {
    window.map_or(true, |w| w.contains(at))
}

#[async_trait]
impl FamilyStore for MemoryStore {
    async fn members(&self, household_id: i32) -> Result<Vec<MemberRecord>, DbErr> {
        self.member_queries.fetch_add(1, Ordering::SeqCst);
        if !self.enter("members", household_id).await? {
            return Ok(Vec::new());
        }
        Ok(self.members.lock().unwrap().clone())
    }

    async fn care_actors(&self, household_id: i32, window: &TimeWindow) -> Result<Vec<Uuid>, DbErr> {
        if !self.enter("care", household_id).await? {
            return Ok(Vec::new());
        }
        Ok(self
            .care
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, at)| window.contains(*at))
            .map(|(actor, _)| *actor)
            .collect())
    }

    async fn post_authors(
        &self,
        household_id: i32,
        member_ids: &[Uuid],
        window: &TimeWindow,
    ) -> Result<Vec<Uuid>, DbErr> {
        if !self.enter("posts", household_id).await? {
            return Ok(Vec::new());
        }
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|(author, scope, at)| {
                member_ids.contains(author)
                    && scope.map_or(true, |s| s == household_id)
                    && window.contains(*at)
            })
            .map(|(author, _, _)| *author)
            .collect())
    }

    async fn wishlist_creators(&self, household_id: i32, window: &TimeWindow) -> Result<Vec<Uuid>, DbErr> {
        if !self.enter("wishlist", household_id).await? {
            return Ok(Vec::new());
        }
        Ok(self
            .wishlist
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, at)| window.contains(*at))
            .map(|(creator, _)| *creator)
            .collect())
    }

    async fn reminders(
        &self,
        household_id: i32,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<ReminderRecord>, DbErr> {
        if !self.enter("reminders", household_id).await? {
            return Ok(Vec::new());
        }
        Ok(self
            .reminders
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, at)| in_window(*at, window))
            .map(|(r, _)| r.clone())
            .collect())
    }

    async fn post_likes(&self, household_id: i32, member_ids: &[Uuid]) -> Result<Vec<LikeRecord>, DbErr> {
        if !self.enter("likes", household_id).await? {
            return Ok(Vec::new());
        }
        Ok(self
            .likes
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, scope)| member_ids.contains(&l.author_id) && scope.map_or(true, |s| s == household_id))
            .map(|(l, _)| *l)
            .collect())
    }

    async fn coupons(&self, household_id: i32) -> Result<Vec<CouponRecord>, DbErr> {
        if !self.enter("coupons", household_id).await? {
            return Ok(Vec::new());
        }
        Ok(self.coupons.lock().unwrap().clone())
    }

    async fn honor_exists(&self, household_id: i32, week_key: &str) -> Result<bool, DbErr> {
        self.enter("honors", household_id).await?;
        // let concurrent callers interleave between check and insert
        tokio::task::yield_now().await;
        if self.hide_existing_honors.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self
            .honors
            .lock()
            .unwrap()
            .iter()
            .any(|h| h.household_id == household_id && h.week_key == week_key))
    }

    async fn insert_honor(&self, honor: NewHonor) -> Result<HonorWrite, DbErr> {
        self.enter("honors", honor.household_id).await?;
        let mut honors = self.honors.lock().unwrap();
        if honors
            .iter()
            .any(|h| h.household_id == honor.household_id && h.week_key == honor.week_key)
        {
            return Ok(HonorWrite::AlreadyPresent);
        }
        honors.push(honor);
        Ok(HonorWrite::Inserted)
    }
}
