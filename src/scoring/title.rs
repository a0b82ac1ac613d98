use serde::Serialize;

use super::counter::CategoryCounts;
use super::TENURE_DAYS_PER_UNIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Title {
    Guardian,
    Reporter,
    Foodie,
    Butler,
    Elder,
    Inactive,
}

impl Title {
    pub fn as_str(&self) -> &'static str {
        match self {
            Title::Guardian => "guardian",
            Title::Reporter => "reporter",
            Title::Foodie => "foodie",
            Title::Butler => "butler",
            Title::Elder => "elder",
            Title::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [
            Title::Guardian,
            Title::Reporter,
            Title::Foodie,
            Title::Butler,
            Title::Elder,
            Title::Inactive,
        ]
        .into_iter()
        .find(|t| t.as_str() == s)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Title::Guardian => "Pet Guardian",
            Title::Reporter => "Family Reporter",
            Title::Foodie => "Foodie",
            Title::Butler => "Family Butler",
            Title::Elder => "Family Elder",
            Title::Inactive => "Resting This Week",
        }
    }
}

/// First entry with the strictly greatest score.
pub(crate) fn dominant(scores: &[(Title, f64)]) -> Option<Title> {
    let mut best: Option<(Title, f64)> = None;
    for &(title, score) in scores {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((title, score)),
        }
    }
    best.map(|(title, _)| title)
}

pub(crate) fn activity_scores(counts: &CategoryCounts) -> [(Title, f64); 4] {
    [
        (Title::Guardian, counts.care as f64),
        (Title::Reporter, counts.posts as f64),
        (Title::Foodie, counts.wishlist as f64),
        (Title::Butler, counts.reminders as f64),
    ]
}

/// Live title for the current week. Tenure competes at one unit per
/// `TENURE_DAYS_PER_UNIT` days, but cannot rescue a member with no activity
/// until it reaches a full unit.
pub fn assign_title(counts: &CategoryCounts) -> Title {
    let tenure_score = counts.tenure_days as f64 / TENURE_DAYS_PER_UNIT;
    if counts.activity_total() == 0 && tenure_score < 1.0 {
        return Title::Inactive;
    }

    let [care, posts, wishlist, reminders] = activity_scores(counts);
    dominant(&[care, posts, wishlist, reminders, (Title::Elder, tenure_score)]).unwrap_or(Title::Inactive)
}
