use serde::{Deserialize, Serialize};

/// One row of the league table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team_key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub playoff_seed: Option<u32>,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
    /// Win fraction in 0..=1 as reported.
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub games_back: Option<f64>,
    #[serde(default)]
    pub points_for: Option<f64>,
    #[serde(default)]
    pub points_against: Option<f64>,
}

impl TeamStanding {
    /// Widened so counters near `u32::MAX` cannot overflow.
    pub fn games_played(&self) -> u64 {
        u64::from(self.wins) + u64::from(self.losses) + u64::from(self.ties)
    }

    /// `(wins + ties / 2) / games`, absent before any game.
    pub fn computed_percentage(&self) -> Option<f64> {
        let games = self.games_played();
        if games == 0 {
            return None;
        }
        Some((self.wins as f64 + self.ties as f64 / 2.0) / games as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_computed_percentage() {
        let s = TeamStanding {
            team_key: "428.l.1.t.1".into(),
            name: None,
            rank: Some(1),
            playoff_seed: None,
            wins: 5,
            losses: 2,
            ties: 1,
            percentage: None,
            games_back: None,
            points_for: None,
            points_against: None,
        };
        assert_eq!(s.games_played(), 8);
        assert_eq!(s.computed_percentage(), Some(0.6875));
    }

    #[test]
    fn test_games_played_near_u32_max() {
        let s = TeamStanding {
            team_key: "428.l.1.t.1".into(),
            name: None,
            rank: None,
            playoff_seed: None,
            wins: u32::MAX,
            losses: u32::MAX,
            ties: 1,
            percentage: Some(0.5),
            games_back: None,
            points_for: None,
            points_against: None,
        };
        assert_eq!(s.games_played(), 2 * u64::from(u32::MAX) + 1);
        let pct = s.computed_percentage().unwrap();
        assert!((pct - 0.5).abs() < 1e-6);
    }
}
