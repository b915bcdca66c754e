//! Tunable validation thresholds and the key grammar.

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Granularity, OwnerKind};
use crate::stats::StatField;

// =============================================================================
// Keys
// =============================================================================

static GAME_KEY: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\d+$").ok());
static LEAGUE_KEY: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\d+\.l\.\d+$").ok());
static TEAM_KEY: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\d+\.l\.\d+\.t\.\d+$").ok());
static PLAYER_KEY: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\d+\.p\.\d+$").ok());
static TRANSACTION_KEY: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\d+\.l\.\d+\.tr\.\d+$").ok());

/// The upstream key families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Game,
    League,
    Team,
    Player,
    Transaction,
}

impl KeyKind {
    pub fn pattern(self) -> Option<&'static Regex> {
        let pattern: &'static Option<Regex> = match self {
            KeyKind::Game => &GAME_KEY,
            KeyKind::League => &LEAGUE_KEY,
            KeyKind::Team => &TEAM_KEY,
            KeyKind::Player => &PLAYER_KEY,
            KeyKind::Transaction => &TRANSACTION_KEY,
        };
        pattern.as_ref()
    }

    pub fn label(self) -> &'static str {
        match self {
            KeyKind::Game => "game",
            KeyKind::League => "league",
            KeyKind::Team => "team",
            KeyKind::Player => "player",
            KeyKind::Transaction => "transaction",
        }
    }

    pub fn matches(self, key: &str) -> bool {
        self.pattern().map_or(false, |re| re.is_match(key))
    }

    pub fn for_owner(owner: OwnerKind) -> Self {
        match owner {
            OwnerKind::Player => KeyKind::Player,
            OwnerKind::Team => KeyKind::Team,
        }
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Thresholds used by the validator. Everything here only moves warnings
/// around, except the key grammar above which is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    pub min_teams: u32,
    pub max_teams: u32,
    pub min_season: i32,
    /// Seasons up to `reference_year + max_season_lead` are plausible.
    pub max_season_lead: i32,
    /// Defaults to the current calendar year.
    pub reference_year: Option<i32>,
    /// Allowed gap, in percentage points, between a reported percentage and
    /// made / attempted.
    pub pct_tolerance: f64,
    /// Single-game upper bound per counting stat.
    pub stat_bounds: BTreeMap<StatField, f64>,
    pub games_per_week: u32,
    pub games_per_season: u32,
    /// Team lines aggregate a whole roster.
    pub team_multiplier: u32,
    pub max_trades: u32,
    pub max_managers: usize,
    pub valid_positions: Vec<String>,
    pub valid_scoring_types: Vec<String>,
    /// Columns filled in fewer than this share of a batch are reported.
    pub completeness_threshold: f64,
    /// Interquartile-range multiplier for batch stat outliers.
    pub outlier_iqr_factor: f64,
    /// Fewer populated values than this and no outliers are flagged.
    pub outlier_min_samples: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        use StatField::*;
        let stat_bounds = [
            (FieldGoalsMade, 40.0),
            (FieldGoalsAttempted, 80.0),
            (FreeThrowsMade, 30.0),
            (FreeThrowsAttempted, 40.0),
            (ThreePointersMade, 20.0),
            (Points, 100.0),
            (Rebounds, 30.0),
            (Assists, 30.0),
            (Steals, 15.0),
            (Blocks, 15.0),
            (Turnovers, 15.0),
        ]
        .into_iter()
        .collect();

        Self {
            min_teams: 4,
            max_teams: 20,
            min_season: 2000,
            max_season_lead: 1,
            reference_year: None,
            pct_tolerance: 1.0,
            stat_bounds,
            games_per_week: 4,
            games_per_season: 82,
            team_multiplier: 13,
            max_trades: 50,
            max_managers: 3,
            valid_positions: ["PG", "SG", "SF", "PF", "C", "G", "F", "Util", "BN", "IL", "IL+", "IR", "NA"]
                .into_iter()
                .map(String::from)
                .collect(),
            valid_scoring_types: ["head", "headpoint", "roto", "point"].into_iter().map(String::from).collect(),
            completeness_threshold: 0.95,
            outlier_iqr_factor: 1.5,
            outlier_min_samples: 3,
        }
    }
}

impl ValidationRules {
    pub fn reference_year(&self) -> i32 {
        self.reference_year.unwrap_or_else(|| Utc::now().year())
    }

    pub fn max_season(&self) -> i32 {
        self.reference_year().saturating_add(self.max_season_lead)
    }

    pub fn is_valid_position(&self, position: &str) -> bool {
        self.valid_positions.iter().any(|p| p.eq_ignore_ascii_case(position))
    }

    /// Upper bound for a counting stat on a line of this granularity and owner.
    pub fn bound_for(&self, field: StatField, granularity: Granularity, owner: OwnerKind) -> Option<f64> {
        let per_game = *self.stat_bounds.get(&field)?;
        let games = match granularity {
            Granularity::Daily => 1,
            Granularity::Weekly => self.games_per_week,
            Granularity::Season => self.games_per_season,
        };
        let owners = match owner {
            OwnerKind::Player => 1,
            OwnerKind::Team => self.team_multiplier,
        };
        Some(per_game * games as f64 * owners as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_grammar() {
        assert!(KeyKind::Game.matches("428"));
        assert!(KeyKind::League.matches("428.l.41083"));
        assert!(KeyKind::Team.matches("428.l.41083.t.3"));
        assert!(KeyKind::Player.matches("428.p.6014"));
        assert!(KeyKind::Transaction.matches("428.l.41083.tr.212"));

        assert!(!KeyKind::Team.matches("428.l.41083"));
        assert!(!KeyKind::Player.matches("nba.p.4612"));
        assert!(!KeyKind::League.matches("428.l.41083.t.3"));
    }

    #[test]
    fn test_bounds_scale_by_granularity_and_owner() {
        let rules = ValidationRules::default();
        assert_eq!(rules.bound_for(StatField::Points, Granularity::Daily, OwnerKind::Player), Some(100.0));
        assert_eq!(rules.bound_for(StatField::Points, Granularity::Weekly, OwnerKind::Player), Some(400.0));
        assert_eq!(rules.bound_for(StatField::Steals, Granularity::Season, OwnerKind::Player), Some(1230.0));
        assert_eq!(rules.bound_for(StatField::Rebounds, Granularity::Daily, OwnerKind::Team), Some(390.0));
        assert_eq!(rules.bound_for(StatField::FieldGoalPercentage, Granularity::Daily, OwnerKind::Player), None);
    }

    #[test]
    fn test_rules_deserialize_partially() {
        let rules: ValidationRules = serde_json::from_str(r#"{"reference_year": 2024, "max_teams": 16}"#).unwrap();
        assert_eq!(rules.max_season(), 2025);
        assert_eq!(rules.max_teams, 16);
        assert_eq!(rules.min_teams, 4);
        assert!(rules.is_valid_position("util"));
        assert!(!rules.is_valid_position("QB"));
    }
}
