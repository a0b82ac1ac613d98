use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A note between members. `target_id = None` is a broadcast to the household.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "reminders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub household_id: i32,
    pub sender_id: Uuid,
    pub target_id: Option<Uuid>,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// `None` on rows written before the column existed.
    pub kind: Option<String>,
    pub is_read: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::household::Entity",
        from = "Column::HouseholdId",
        to = "super::household::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Household,
}

impl Related<super::household::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Household.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

const SYSTEM_MARKERS: [&str; 3] = ["🎫", "coupon", "券"];
const POKE_MARKERS: [&str; 3] = ["👋", "poked", "戳"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Note,
    Poke,
    System,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::Note => "note",
            ReminderKind::Poke => "poke",
            ReminderKind::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "note" => Some(ReminderKind::Note),
            "poke" => Some(ReminderKind::Poke),
            "system" => Some(ReminderKind::System),
            _ => None,
        }
    }

    /// Kind of a stored reminder. Rows without a recognised `kind` are
    /// classified from their text.
    pub fn classify(kind: Option<&str>, content: &str, targeted: bool) -> Self {
        if let Some(kind) = kind.and_then(Self::parse) {
            return kind;
        }

        let lowered = content.to_lowercase();
        if SYSTEM_MARKERS.iter().any(|m| lowered.contains(m)) {
            ReminderKind::System
        } else if targeted && POKE_MARKERS.iter().any(|m| lowered.contains(m)) {
            ReminderKind::Poke
        } else {
            ReminderKind::Note
        }
    }
}

impl Model {
    pub fn resolved_kind(&self) -> ReminderKind {
        ReminderKind::classify(self.kind.as_deref(), &self.content, self.target_id.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("poke"), "anything", false, ReminderKind::Poke)]
    #[case(Some("note"), "👋 hi", true, ReminderKind::Note)]
    #[case(None, "👋 poked you", true, ReminderKind::Poke)]
    #[case(None, "👋 everyone, dinner at 7", false, ReminderKind::Note)]
    #[case(None, "🎫 You received a coupon: dishes", true, ReminderKind::System)]
    #[case(None, "buy milk", true, ReminderKind::Note)]
    #[case(Some("bogus"), "戳了戳你", true, ReminderKind::Poke)]
    fn classifies_reminders(
        #[case] kind: Option<&str>,
        #[case] content: &str,
        #[case] targeted: bool,
        #[case] expected: ReminderKind,
    ) {
        assert_eq!(ReminderKind::classify(kind, content, targeted), expected);
    }
}
