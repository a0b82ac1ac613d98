//! Read access the scoring engine needs, plus the honor write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use super::window::TimeWindow;
use crate::entities::{
    care_event, coupon, household_member, pet, post, post_like, reminder, weekly_honor,
    wishlist_item, CareEvent, Coupon, HouseholdMember, Pet, Post, PostLike, Reminder,
    WeeklyHonor, WishlistItem,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub member_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRecord {
    pub sender_id: Uuid,
    pub target_id: Option<Uuid>,
    pub content: String,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeRecord {
    pub liker_id: Uuid,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponRecord {
    pub issuer_id: Uuid,
    pub target_id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHonor {
    pub household_id: i32,
    pub week_key: String,
    pub member_id: Uuid,
    pub title: String,
    pub score: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HonorWrite {
    Inserted,
    /// Another writer got there first; the unique index rejected this row.
    AlreadyPresent,
}

#[async_trait]
pub trait FamilyStore: Send + Sync {
    /// Members ordered by join time, then id.
    async fn members(&self, household_id: i32) -> Result<Vec<MemberRecord>, DbErr>;

    /// Actor of every care event on the household's pets within the window.
    async fn care_actors(&self, household_id: i32, window: &TimeWindow) -> Result<Vec<Uuid>, DbErr>;

    /// Authors of posts visible to the household within the window.
    async fn post_authors(
        &self,
        household_id: i32,
        member_ids: &[Uuid],
        window: &TimeWindow,
    ) -> Result<Vec<Uuid>, DbErr>;

    async fn wishlist_creators(&self, household_id: i32, window: &TimeWindow) -> Result<Vec<Uuid>, DbErr>;

    async fn reminders(
        &self,
        household_id: i32,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<ReminderRecord>, DbErr>;

    /// Every like on a household post authored by one of `member_ids`.
    async fn post_likes(&self, household_id: i32, member_ids: &[Uuid]) -> Result<Vec<LikeRecord>, DbErr>;

    async fn coupons(&self, household_id: i32) -> Result<Vec<CouponRecord>, DbErr>;

    async fn honor_exists(&self, household_id: i32, week_key: &str) -> Result<bool, DbErr>;

    async fn insert_honor(&self, honor: NewHonor) -> Result<HonorWrite, DbErr>;
}

fn within<E, C>(query: Select<E>, column: C, window: &TimeWindow) -> Select<E>
where
    E: EntityTrait,
    C: ColumnTrait,
{
    let query = query.filter(column.gte(window.start));
    match window.end {
        Some(end) => query.filter(column.lt(end)),
        None => query,
    }
}

/// Posts shared with the household, including unscoped ones.
fn household_posts(household_id: i32) -> Condition {
    Condition::any()
        .add(post::Column::HouseholdId.eq(household_id))
        .add(post::Column::HouseholdId.is_null())
}

/// (liker, author) pairs for likes on the household's posts.
fn likes_query(household_id: i32, member_ids: &[Uuid]) -> Select<PostLike> {
    PostLike::find()
        .select_only()
        .column(post_like::Column::UserId)
        .column(post::Column::UserId)
        .inner_join(Post)
        .filter(post::Column::UserId.is_in(member_ids.to_vec()))
        .filter(household_posts(household_id))
}

#[async_trait]
impl FamilyStore for DatabaseConnection {
    async fn members(&self, household_id: i32) -> Result<Vec<MemberRecord>, DbErr> {
        let rows = HouseholdMember::find()
            .filter(household_member::Column::HouseholdId.eq(household_id))
            .order_by_asc(household_member::Column::JoinedAt)
            .order_by_asc(household_member::Column::UserId)
            .all(self)
            .await?;

        Ok(rows
            .into_iter()
            .map(|m| MemberRecord {
                member_id: m.user_id,
                joined_at: m.joined_at.with_timezone(&Utc),
            })
            .collect())
    }

    async fn care_actors(&self, household_id: i32, window: &TimeWindow) -> Result<Vec<Uuid>, DbErr> {
        let pet_ids: Vec<i32> = Pet::find()
            .select_only()
            .column(pet::Column::Id)
            .filter(pet::Column::HouseholdId.eq(household_id))
            .into_tuple()
            .all(self)
            .await?;

        if pet_ids.is_empty() {
            return Ok(Vec::new());
        }

        within(
            CareEvent::find()
                .select_only()
                .column(care_event::Column::UserId)
                .filter(care_event::Column::PetId.is_in(pet_ids)),
            care_event::Column::CreatedAt,
            window,
        )
        .into_tuple()
        .all(self)
        .await
    }

    async fn post_authors(
        &self,
        household_id: i32,
        member_ids: &[Uuid],
        window: &TimeWindow,
    ) -> Result<Vec<Uuid>, DbErr> {
        if member_ids.is_empty() {
            return Ok(Vec::new());
        }

        within(
            Post::find()
                .select_only()
                .column(post::Column::UserId)
                .filter(post::Column::UserId.is_in(member_ids.to_vec()))
                .filter(household_posts(household_id)),
            post::Column::CreatedAt,
            window,
        )
        .into_tuple()
        .all(self)
        .await
    }

    async fn wishlist_creators(&self, household_id: i32, window: &TimeWindow) -> Result<Vec<Uuid>, DbErr> {
        within(
            WishlistItem::find()
                .select_only()
                .column(wishlist_item::Column::UserId)
                .filter(wishlist_item::Column::HouseholdId.eq(household_id)),
            wishlist_item::Column::CreatedAt,
            window,
        )
        .into_tuple()
        .all(self)
        .await
    }

    async fn reminders(
        &self,
        household_id: i32,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<ReminderRecord>, DbErr> {
        let query = Reminder::find().filter(reminder::Column::HouseholdId.eq(household_id));
        let query = match window {
            Some(window) => within(query, reminder::Column::CreatedAt, window),
            None => query,
        };

        Ok(query
            .all(self)
            .await?
            .into_iter()
            .map(|r| ReminderRecord {
                sender_id: r.sender_id,
                target_id: r.target_id,
                content: r.content,
                kind: r.kind,
            })
            .collect())
    }

    async fn post_likes(&self, household_id: i32, member_ids: &[Uuid]) -> Result<Vec<LikeRecord>, DbErr> {
        if member_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(Uuid, Uuid)> = likes_query(household_id, member_ids)
            .into_tuple()
            .all(self)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(liker_id, author_id)| LikeRecord { liker_id, author_id })
            .collect())
    }

    async fn coupons(&self, household_id: i32) -> Result<Vec<CouponRecord>, DbErr> {
        Ok(Coupon::find()
            .filter(coupon::Column::HouseholdId.eq(household_id))
            .all(self)
            .await?
            .into_iter()
            .map(|c| CouponRecord {
                issuer_id: c.issuer_id,
                target_id: c.target_id,
                status: c.status,
            })
            .collect())
    }

    async fn honor_exists(&self, household_id: i32, week_key: &str) -> Result<bool, DbErr> {
        let count = WeeklyHonor::find()
            .filter(weekly_honor::Column::HouseholdId.eq(household_id))
            .filter(weekly_honor::Column::WeekKey.eq(week_key))
            .count(self)
            .await?;
        Ok(count > 0)
    }

    async fn insert_honor(&self, honor: NewHonor) -> Result<HonorWrite, DbErr> {
        let row = weekly_honor::ActiveModel {
            household_id: Set(honor.household_id),
            week_key: Set(honor.week_key),
            member_id: Set(honor.member_id),
            title: Set(honor.title),
            score: Set(honor.score),
            created_at: Set(honor.created_at.fixed_offset()),
            ..Default::default()
        };

        let inserted = WeeklyHonor::insert(row)
            .on_conflict(
                OnConflict::columns([weekly_honor::Column::HouseholdId, weekly_honor::Column::WeekKey])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self)
            .await?;

        Ok(if inserted == 0 {
            HonorWrite::AlreadyPresent
        } else {
            HonorWrite::Inserted
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn likes_stay_inside_the_household() {
        let sql = likes_query(7, &[Uuid::from_u128(1)])
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""posts"."household_id" = 7"#), "{sql}");
        assert!(sql.contains(r#""posts"."household_id" IS NULL"#), "{sql}");
    }
}
