use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::StatSnapshot;

/// One side of a weekly matchup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupTeam {
    pub team_key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub points_total: Option<f64>,
    #[serde(default)]
    pub projected_points: Option<f64>,
    #[serde(default)]
    pub stats: Option<StatSnapshot>,
}

/// Category winner. `winner_team_key` is absent on a tie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatWinner {
    pub stat_id: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub winner_team_key: Option<String>,
    #[serde(default)]
    pub is_tied: bool,
}

/// A head-to-head pairing for one scoring week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    #[serde(default)]
    pub league_key: Option<String>,
    pub week: u32,
    #[serde(default)]
    pub week_start: Option<NaiveDate>,
    #[serde(default)]
    pub week_end: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_playoffs: bool,
    #[serde(default)]
    pub is_consolation: bool,
    #[serde(default)]
    pub is_tied: bool,
    #[serde(default)]
    pub winner_team_key: Option<String>,
    pub teams: Vec<MatchupTeam>,
    #[serde(default)]
    pub stat_winners: Vec<StatWinner>,
}

impl Matchup {
    /// Week plus the sorted team keys.
    pub fn uniqueness_key(&self) -> String {
        let mut keys: Vec<&str> = self.teams.iter().map(|t| t.team_key.as_str()).collect();
        keys.sort_unstable();
        format!("w{}:{}", self.week, keys.join("|"))
    }

    pub fn team(&self, team_key: &str) -> Option<&MatchupTeam> {
        self.teams.iter().find(|t| t.team_key == team_key)
    }

    /// Categories won per team key.
    pub fn category_wins(&self, team_key: &str) -> usize {
        self.stat_winners
            .iter()
            .filter(|w| w.winner_team_key.as_deref() == Some(team_key))
            .count()
    }
}
