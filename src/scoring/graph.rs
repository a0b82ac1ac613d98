use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use super::store::{CouponRecord, FamilyStore, LikeRecord, ReminderRecord};
use super::{or_zero, COUPON_ACTIVE_WEIGHT, COUPON_USED_WEIGHT, COUPON_VOID_WEIGHT, LIKE_WEIGHT, POKE_WEIGHT};
use crate::entities::coupon::CouponStatus;
use crate::entities::reminder::ReminderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: Uuid,
    pub to: Uuid,
    pub weight: i64,
}

/// Directed closeness between household members over their whole history.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    totals: BTreeMap<(Uuid, Uuid), i64>,
}

impl InteractionGraph {
    pub fn build(
        members: &[Uuid],
        likes: &[LikeRecord],
        reminders: &[ReminderRecord],
        coupons: &[CouponRecord],
    ) -> Self {
        let members: HashSet<Uuid> = members.iter().copied().collect();
        let mut graph = Self::default();
        let mut add = |from: Uuid, to: Uuid, weight: i64| {
            if from != to && members.contains(&from) && members.contains(&to) {
                *graph.totals.entry((from, to)).or_insert(0) += weight;
            }
        };

        for like in likes {
            add(like.liker_id, like.author_id, LIKE_WEIGHT);
        }

        for r in reminders {
            let Some(target) = r.target_id else { continue };
            if ReminderKind::classify(r.kind.as_deref(), &r.content, true) == ReminderKind::Poke {
                add(r.sender_id, target, POKE_WEIGHT);
            }
        }

        for c in coupons {
            let weight = match CouponStatus::parse(&c.status) {
                Some(CouponStatus::Active) => COUPON_ACTIVE_WEIGHT,
                Some(CouponStatus::Used) => COUPON_USED_WEIGHT,
                Some(CouponStatus::Void) => COUPON_VOID_WEIGHT,
                None => continue,
            };
            add(c.issuer_id, c.target_id, weight);
        }

        graph
    }

    /// Signed accumulated weight, zero when the pair never interacted.
    pub fn raw_weight(&self, from: Uuid, to: Uuid) -> i64 {
        self.totals.get(&(from, to)).copied().unwrap_or(0)
    }

    /// Pairs with positive weight, heaviest first.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .totals
            .iter()
            .filter(|(_, weight)| **weight > 0)
            .map(|(&(from, to), &weight)| Edge { from, to, weight })
            .collect();
        edges.sort_by(|a, b| b.weight.cmp(&a.weight));
        edges
    }
}

/// Loads the household's members and full interaction history. Failed
/// sources contribute nothing.
#[tracing::instrument(skip(store, timeout))]
pub async fn load_graph<S>(store: &S, household_id: i32, timeout: Duration) -> (Vec<Uuid>, InteractionGraph)
where
    S: FamilyStore + ?Sized,
{
    let members: Vec<Uuid> = or_zero("members", household_id, timeout, store.members(household_id))
        .await
        .into_iter()
        .map(|m| m.member_id)
        .collect();
    if members.is_empty() {
        return (members, InteractionGraph::default());
    }

    let likes = or_zero("likes", household_id, timeout, store.post_likes(household_id, &members)).await;
    let reminders = or_zero("reminders", household_id, timeout, store.reminders(household_id, None)).await;
    let coupons = or_zero("coupons", household_id, timeout, store.coupons(household_id)).await;

    let graph = InteractionGraph::build(&members, &likes, &reminders, &coupons);
    (members, graph)
}
