//! Canonical domain records produced by the transformers.
//!
//! - [`League`] - league identity, schedule and optional settings
//! - [`Team`] - fantasy team with its managers
//! - [`Player`] - player identity, positions and status
//! - [`StatSnapshot`] - the canonical stat line at a time coordinate
//! - [`RosterDay`] / [`RosterEntry`] - one team's lineup on one date
//! - [`Transaction`] - add/drop/trade with its player lines
//! - [`Matchup`] - weekly head-to-head result
//! - [`TeamStanding`] - league table row
//!
//! Every record carries a natural key. Owned sub-keys (`league_key` of a
//! team, `game_key` of a player) are derived from that key, never read
//! from separate fields.

pub mod league;
pub mod matchup;
pub mod player;
pub mod roster;
pub mod snapshot;
pub mod standing;
pub mod team;
pub mod transaction;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use league::{League, LeagueSettings, ScoringType, StatCategory};
pub use matchup::{Matchup, MatchupTeam, StatWinner};
pub use player::{Player, PlayerStatus};
pub use roster::{RosterDay, RosterEntry, RosterSlot};
pub use snapshot::{Coordinate, OwnerKind, SnapshotOwner, StatSnapshot};
pub use standing::TeamStanding;
pub use team::{Manager, Team};
pub use transaction::{Transaction, TransactionPlayer, TransactionRole, TransactionStatus, TransactionType};

pub use crate::stats::{Granularity, StatLine};

// =============================================================================
// Entity Type
// =============================================================================

/// The kinds of record the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    League,
    Team,
    Player,
    StatSnapshot,
    RosterEntry,
    RosterDay,
    Transaction,
    Matchup,
    Standing,
}

impl EntityType {
    pub const ALL: [EntityType; 9] = [
        EntityType::League,
        EntityType::Team,
        EntityType::Player,
        EntityType::StatSnapshot,
        EntityType::RosterEntry,
        EntityType::RosterDay,
        EntityType::Transaction,
        EntityType::Matchup,
        EntityType::Standing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::League => "league",
            EntityType::Team => "team",
            EntityType::Player => "player",
            EntityType::StatSnapshot => "stat_snapshot",
            EntityType::RosterEntry => "roster_entry",
            EntityType::RosterDay => "roster_day",
            EntityType::Transaction => "transaction",
            EntityType::Matchup => "matchup",
            EntityType::Standing => "standing",
        }
    }

    /// Fields that must be present on a serialized record.
    ///
    /// Snapshot owners are checked separately since either `player_key` or
    /// `team_key` satisfies them.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            EntityType::League => &["league_key", "name", "season"],
            EntityType::Team => &["team_key", "name"],
            EntityType::Player => &["player_key", "full_name"],
            EntityType::StatSnapshot => &["granularity"],
            EntityType::RosterEntry => &["team_key", "player_key", "date"],
            EntityType::RosterDay => &["team_key", "date"],
            EntityType::Transaction => &["transaction_key", "type"],
            EntityType::Matchup => &["week", "teams"],
            EntityType::Standing => &["team_key"],
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        EntityType::ALL
            .into_iter()
            .find(|e| e.as_str() == wanted)
            .ok_or_else(|| format!("unknown entity type '{}'", s))
    }
}

// =============================================================================
// Key derivation
// =============================================================================

/// Prefix of `key` before `marker` (`"428.l.1.t.3"`, `".t."` → `"428.l.1"`).
pub fn key_prefix(key: &str, marker: &str) -> Option<String> {
    key.find(marker).map(|i| key[..i].to_string()).filter(|p| !p.is_empty())
}

/// Game key of a league, team, player or transaction key.
pub fn game_key_of(key: &str) -> Option<String> {
    key.split('.').next().filter(|g| !g.is_empty() && g.chars().all(|c| c.is_ascii_digit())).map(str::to_string)
}

/// League key owning a team or transaction key.
pub fn league_key_of(key: &str) -> Option<String> {
    key_prefix(key, ".t.").or_else(|| key_prefix(key, ".tr."))
}

/// Trailing numeric id of a key (`"428.p.6014"` → `"6014"`).
pub fn trailing_id(key: &str) -> Option<String> {
    key.rsplit('.').next().filter(|id| !id.is_empty() && *id != key).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_parse() {
        assert_eq!("league".parse::<EntityType>(), Ok(EntityType::League));
        assert_eq!("roster-day".parse::<EntityType>(), Ok(EntityType::RosterDay));
        assert_eq!("Stat_Snapshot".parse::<EntityType>(), Ok(EntityType::StatSnapshot));
        assert!("game".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_key_derivation() {
        assert_eq!(league_key_of("428.l.1234.t.5").as_deref(), Some("428.l.1234"));
        assert_eq!(league_key_of("428.l.1234.tr.88").as_deref(), Some("428.l.1234"));
        assert_eq!(league_key_of("428.p.1"), None);
        assert_eq!(game_key_of("428.p.6014").as_deref(), Some("428"));
        assert_eq!(game_key_of("nba.p.6014"), None);
        assert_eq!(trailing_id("428.p.6014").as_deref(), Some("6014"));
        assert_eq!(trailing_id("6014"), None);
    }
}
