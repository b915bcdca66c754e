//! Stat snapshots: a canonical [`StatLine`] pinned to an owner and a time
//! coordinate.
//!
//! The serialized form is flat and uses the granularity's column names, so a
//! season row carries `total_points` where a daily row carries `points`:
//!
//! ```text
//! {"granularity": "season", "owner_type": "player", "player_key": "428.p.6014",
//!  "season": "2024", "field_goals_made": 310, ..., "total_points": 1020}
//! ```

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::convert::TryFrom;

use crate::stats::{Granularity, StatField, StatLine};

/// Who a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Player,
    Team,
}

impl OwnerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OwnerKind::Player => "player",
            OwnerKind::Team => "team",
        }
    }

    /// Name of the natural-key field for this owner.
    pub fn key_field(self) -> &'static str {
        match self {
            OwnerKind::Player => "player_key",
            OwnerKind::Team => "team_key",
        }
    }

    /// Tail sub-object holding this owner's stats block.
    pub fn stats_field(self) -> &'static str {
        match self {
            OwnerKind::Player => "player_stats",
            OwnerKind::Team => "team_stats",
        }
    }

    pub fn points_field(self) -> &'static str {
        match self {
            OwnerKind::Player => "player_points",
            OwnerKind::Team => "team_points",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotOwner {
    pub kind: OwnerKind,
    pub key: String,
}

/// Time coordinate of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Coordinate {
    Daily { date: NaiveDate, season: Option<String> },
    Weekly { season: String, week: u32 },
    Season { season: String },
}

impl Coordinate {
    pub fn granularity(&self) -> Granularity {
        match self {
            Coordinate::Daily { .. } => Granularity::Daily,
            Coordinate::Weekly { .. } => Granularity::Weekly,
            Coordinate::Season { .. } => Granularity::Season,
        }
    }

    pub fn season(&self) -> Option<&str> {
        match self {
            Coordinate::Daily { season, .. } => season.as_deref(),
            Coordinate::Weekly { season, .. } | Coordinate::Season { season } => Some(season),
        }
    }

    /// Stable text form used in uniqueness keys.
    pub fn label(&self) -> String {
        match self {
            Coordinate::Daily { date, .. } => date.to_string(),
            Coordinate::Weekly { season, week } => format!("{}-w{}", season, week),
            Coordinate::Season { season } => season.clone(),
        }
    }
}

/// One owner's stats at one coordinate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "SnapshotWire")]
pub struct StatSnapshot {
    pub owner: SnapshotOwner,
    pub coordinate: Coordinate,
    pub stats: StatLine,
    /// Fantasy points for the period, when the league scores points.
    pub points_total: Option<f64>,
}

impl StatSnapshot {
    pub fn granularity(&self) -> Granularity {
        self.coordinate.granularity()
    }

    /// `(owner, coordinate)` identity. Later snapshots at the same key are
    /// corrections.
    pub fn uniqueness_key(&self) -> String {
        format!(
            "{}:{}@{}:{}",
            self.owner.kind.as_str(),
            self.owner.key,
            self.granularity().as_str(),
            self.coordinate.label()
        )
    }

    /// Column names in serialization order for this snapshot's granularity.
    pub fn columns(granularity: Granularity, kind: OwnerKind) -> Vec<&'static str> {
        let mut cols = vec!["granularity", "owner_type", kind.key_field()];
        match granularity {
            Granularity::Daily => cols.extend(["date", "season"]),
            Granularity::Weekly => cols.extend(["season", "week"]),
            Granularity::Season => cols.push("season"),
        }
        cols.extend(StatField::ALL.iter().map(|f| f.column(granularity)));
        cols.push("points_total");
        cols
    }
}

impl Serialize for StatSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let granularity = self.granularity();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("granularity", &granularity)?;
        map.serialize_entry("owner_type", &self.owner.kind)?;
        map.serialize_entry(self.owner.kind.key_field(), &self.owner.key)?;
        match &self.coordinate {
            Coordinate::Daily { date, season } => {
                map.serialize_entry("date", date)?;
                map.serialize_entry("season", season)?;
            }
            Coordinate::Weekly { season, week } => {
                map.serialize_entry("season", season)?;
                map.serialize_entry("week", week)?;
            }
            Coordinate::Season { season } => {
                map.serialize_entry("season", season)?;
            }
        }
        for field in StatField::ALL {
            let column = field.column(granularity);
            if field.is_percentage() {
                map.serialize_entry(column, &self.stats.get(field))?;
            } else {
                map.serialize_entry(column, &self.stats.get(field).map(|v| v as i64))?;
            }
        }
        map.serialize_entry("points_total", &self.points_total)?;
        map.end()
    }
}

#[derive(Deserialize)]
struct SnapshotWire {
    granularity: Granularity,
    #[serde(default)]
    owner_type: Option<OwnerKind>,
    #[serde(default)]
    player_key: Option<String>,
    #[serde(default)]
    team_key: Option<String>,
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    season: Option<String>,
    #[serde(default)]
    week: Option<u32>,
    #[serde(default)]
    points_total: Option<f64>,
    #[serde(flatten)]
    stats: StatLine,
}

impl TryFrom<SnapshotWire> for StatSnapshot {
    type Error = String;

    fn try_from(w: SnapshotWire) -> Result<Self, Self::Error> {
        let owner = match (w.owner_type, w.player_key, w.team_key) {
            (Some(OwnerKind::Player), Some(key), _) | (None, Some(key), _) => {
                SnapshotOwner { kind: OwnerKind::Player, key }
            }
            (Some(OwnerKind::Team), _, Some(key)) | (None, None, Some(key)) => {
                SnapshotOwner { kind: OwnerKind::Team, key }
            }
            (Some(kind), _, _) => return Err(format!("snapshot owner_type {} has no {}", kind.as_str(), kind.key_field())),
            (None, None, None) => return Err("snapshot requires player_key or team_key".to_string()),
        };
        let coordinate = match w.granularity {
            Granularity::Daily => Coordinate::Daily {
                date: w.date.ok_or("daily snapshot requires date")?,
                season: w.season,
            },
            Granularity::Weekly => Coordinate::Weekly {
                season: w.season.ok_or("weekly snapshot requires season")?,
                week: w.week.ok_or("weekly snapshot requires week")?,
            },
            Granularity::Season => Coordinate::Season {
                season: w.season.ok_or("season snapshot requires season")?,
            },
        };
        Ok(StatSnapshot { owner, coordinate, stats: w.stats, points_total: w.points_total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn season_snapshot() -> StatSnapshot {
        StatSnapshot {
            owner: SnapshotOwner { kind: OwnerKind::Player, key: "428.p.6014".into() },
            coordinate: Coordinate::Season { season: "2024".into() },
            stats: StatLine { points: Some(1020), field_goal_percentage: Some(51.2), ..StatLine::default() },
            points_total: None,
        }
    }

    #[test]
    fn test_season_uses_accumulator_columns() {
        let v = serde_json::to_value(season_snapshot()).unwrap();
        assert_eq!(v["total_points"], json!(1020));
        assert!(v.get("points").is_none());
        assert_eq!(v["field_goal_percentage"], json!(51.2));
        assert_eq!(v["player_key"], json!("428.p.6014"));
        assert_eq!(v["granularity"], json!("season"));
    }

    #[test]
    fn test_read_back_with_accumulator_names() {
        let snap = season_snapshot();
        let back: StatSnapshot = serde_json::from_value(serde_json::to_value(&snap).unwrap()).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn test_wire_requires_owner_and_coordinate() {
        let no_owner = json!({"granularity": "season", "season": "2024"});
        assert!(serde_json::from_value::<StatSnapshot>(no_owner).is_err());
        let no_week = json!({"granularity": "weekly", "team_key": "428.l.1.t.1", "season": "2024"});
        assert!(serde_json::from_value::<StatSnapshot>(no_week).is_err());
        let daily = json!({"granularity": "daily", "team_key": "428.l.1.t.1", "date": "2024-11-02", "points": 100});
        let snap: StatSnapshot = serde_json::from_value(daily).unwrap();
        assert_eq!(snap.owner.kind, OwnerKind::Team);
        assert_eq!(snap.stats.points, Some(100));
    }

    #[test]
    fn test_uniqueness_key_includes_coordinate() {
        let mut a = season_snapshot();
        let b = season_snapshot();
        assert_eq!(a.uniqueness_key(), b.uniqueness_key());
        a.coordinate = Coordinate::Weekly { season: "2024".into(), week: 3 };
        assert_ne!(a.uniqueness_key(), b.uniqueness_key());
        assert_eq!(a.uniqueness_key(), "player:428.p.6014@weekly:2024-w3");
    }

    #[test]
    fn test_columns_match_serialization() {
        let snap = season_snapshot();
        let v = serde_json::to_value(&snap).unwrap();
        let cols = StatSnapshot::columns(Granularity::Season, OwnerKind::Player);
        assert_eq!(cols.len(), v.as_object().unwrap().len());
        assert!(cols.iter().all(|c| v.get(*c).is_some()));
    }
}
