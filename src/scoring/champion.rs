use serde::Serialize;
use uuid::Uuid;

use super::counter::MemberCounts;
use super::title::{activity_scores, dominant, Title};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Champion {
    pub member_id: Uuid,
    pub title: Title,
    pub score: u32,
}

/// The week's winner by unweighted activity total. Tenure is ignored, ties go
/// to the earlier member, and an all-zero week has no champion.
pub fn select_champion(members: &[MemberCounts]) -> Option<Champion> {
    let mut best: Option<&MemberCounts> = None;
    for m in members {
        let total = m.counts.activity_total();
        if total == 0 {
            continue;
        }
        match best {
            Some(b) if total <= b.counts.activity_total() => {}
            _ => best = Some(m),
        }
    }

    let winner = best?;
    let title = dominant(&activity_scores(&winner.counts))?;
    Some(Champion {
        member_id: winner.member_id,
        title,
        score: winner.counts.activity_total(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::counter::CategoryCounts;

    fn entry(n: u128, care: u32, posts: u32, wishlist: u32, reminders: u32, tenure_days: u32) -> MemberCounts {
        MemberCounts {
            member_id: Uuid::from_u128(n),
            counts: CategoryCounts {
                care,
                posts,
                wishlist,
                reminders,
                tenure_days,
            },
        }
    }

    #[test]
    fn highest_total_wins() {
        let members = vec![entry(1, 1, 1, 0, 0, 500), entry(2, 0, 1, 4, 0, 3)];
        let champ = select_champion(&members).unwrap();
        assert_eq!(champ.member_id, Uuid::from_u128(2));
        assert_eq!(champ.title, Title::Foodie);
        assert_eq!(champ.score, 5);
    }

    #[test]
    fn ties_go_to_first_member() {
        let members = vec![entry(1, 0, 2, 0, 0, 1), entry(2, 2, 0, 0, 0, 1)];
        let champ = select_champion(&members).unwrap();
        assert_eq!(champ.member_id, Uuid::from_u128(1));
        assert_eq!(champ.title, Title::Reporter);
    }

    #[test]
    fn tenure_alone_never_wins() {
        let members = vec![entry(1, 0, 0, 0, 0, 900), entry(2, 0, 0, 0, 0, 60)];
        assert_eq!(select_champion(&members), None);
    }

    #[test]
    fn empty_household_has_no_champion() {
        assert_eq!(select_champion(&[]), None);
    }

    #[test]
    fn zero_member_is_skipped_even_when_first() {
        let members = vec![entry(1, 0, 0, 0, 0, 10), entry(2, 0, 0, 0, 1, 1)];
        let champ = select_champion(&members).unwrap();
        assert_eq!(champ.member_id, Uuid::from_u128(2));
        assert_eq!(champ.title, Title::Butler);
        assert_eq!(champ.score, 1);
    }
}
