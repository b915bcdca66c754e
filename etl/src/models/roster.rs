use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where a rostered player sits on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterSlot {
    Starting,
    Bench,
    InjuredReserve,
}

impl RosterSlot {
    /// `BN` is the bench, `IL`/`IL+`/`IR` are injured reserve, every other
    /// selected position is a starting slot.
    pub fn from_position(position: &str) -> Self {
        match position.trim().to_ascii_uppercase().as_str() {
            "BN" => RosterSlot::Bench,
            "IL" | "IL+" | "IR" => RosterSlot::InjuredReserve,
            _ => RosterSlot::Starting,
        }
    }
}

/// One player on one team's roster on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub team_key: String,
    pub player_key: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub selected_position: Option<String>,
    #[serde(default)]
    pub is_starting: bool,
    #[serde(default)]
    pub is_bench: bool,
    #[serde(default)]
    pub is_injured_reserve: bool,
    #[serde(default)]
    pub eligible_positions: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_keeper: bool,
    #[serde(default)]
    pub keeper_cost: Option<i64>,
    #[serde(default)]
    pub kept: Option<bool>,
}

impl RosterEntry {
    /// Set the three slot flags from a selected position.
    pub fn assign_slot(&mut self, position: Option<&str>) {
        let slot = position.map(RosterSlot::from_position);
        self.is_starting = slot == Some(RosterSlot::Starting);
        self.is_bench = slot == Some(RosterSlot::Bench);
        self.is_injured_reserve = slot == Some(RosterSlot::InjuredReserve);
    }

    /// The slot implied by the flags, if exactly one is set.
    pub fn slot(&self) -> Option<RosterSlot> {
        match (self.is_starting, self.is_bench, self.is_injured_reserve) {
            (true, false, false) => Some(RosterSlot::Starting),
            (false, true, false) => Some(RosterSlot::Bench),
            (false, false, true) => Some(RosterSlot::InjuredReserve),
            _ => None,
        }
    }

    pub fn uniqueness_key(&self) -> String {
        format!("{}:{}@{}", self.team_key, self.player_key, self.date)
    }
}

/// A team's full roster for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterDay {
    pub team_key: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub entries: Vec<RosterEntry>,
}

impl RosterDay {
    pub fn starters(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.iter().filter(|e| e.is_starting)
    }

    pub fn uniqueness_key(&self) -> String {
        format!("{}@{}", self.team_key, self.date)
    }
}
