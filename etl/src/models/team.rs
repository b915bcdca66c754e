use serde::{Deserialize, Serialize};

/// A person managing a fantasy team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manager {
    #[serde(default)]
    pub manager_id: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_commissioner: bool,
    #[serde(default)]
    pub is_current_login: bool,
}

/// A fantasy team inside one league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_key: String,
    #[serde(default)]
    pub team_id: Option<String>,
    /// Derived from `team_key`.
    #[serde(default)]
    pub league_key: Option<String>,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub waiver_priority: Option<u32>,
    #[serde(default)]
    pub faab_balance: Option<i64>,
    #[serde(default)]
    pub number_of_moves: Option<u32>,
    #[serde(default)]
    pub number_of_trades: Option<u32>,
    #[serde(default)]
    pub roster_adds: Option<u32>,
    #[serde(default)]
    pub clinched_playoffs: bool,
    #[serde(default)]
    pub managers: Vec<Manager>,
}

impl Team {
    pub fn commissioner(&self) -> Option<&Manager> {
        self.managers.iter().find(|m| m.is_commissioner)
    }
}
