//! Stat code translation.
//!
//! Upstream stats are keyed by numeric identifiers and some values are
//! composites. A [`StatTable`] maps each identifier to a decoding strategy
//! and the canonical field(s) it fills on a [`StatLine`]:
//!
//! | id        | strategy       | canonical field(s)                           |
//! |-----------|----------------|----------------------------------------------|
//! | `9004003` | made/attempted | `field_goals_made`, `field_goals_attempted`  |
//! | `5`       | percentage     | `field_goal_percentage`                      |
//! | `9007006` | made/attempted | `free_throws_made`, `free_throws_attempted`  |
//! | `8`       | percentage     | `free_throw_percentage`                      |
//! | `10`      | count          | `three_pointers_made`                        |
//! | `12`..`19`| count          | points, rebounds, assists, steals, blocks, turnovers |
//!
//! The standard table is built once and shared; tests inject reduced tables.
//!
//! # Example
//!
//! ```rust
//! use fantasy_etl::stats::{StatTable, StatField};
//! use serde_json::json;
//!
//! let decoded = StatTable::standard().decode(&json!({"9004003": "7/10", "5": ".700", "12": "21"}));
//! assert_eq!(decoded.line.field_goals_made, Some(7));
//! assert_eq!(decoded.line.field_goal_percentage, Some(70.0));
//! assert_eq!(decoded.line.get(StatField::Points), Some(21.0));
//! ```

pub mod decode;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::extract::{coerce, indexed_items, Coerced};
use crate::result::Issue;

pub use decode::{decode_count, decode_made_attempted, decode_percentage, encode_made_attempted, round3};

// =============================================================================
// Canonical fields
// =============================================================================

/// Time granularity of a stat snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    Season,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Season => "season",
        }
    }
}

/// One canonical stat column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    FieldGoalsMade,
    FieldGoalsAttempted,
    FieldGoalPercentage,
    FreeThrowsMade,
    FreeThrowsAttempted,
    FreeThrowPercentage,
    ThreePointersMade,
    Points,
    Rebounds,
    Assists,
    Steals,
    Blocks,
    Turnovers,
}

impl StatField {
    pub const ALL: [StatField; 13] = [
        StatField::FieldGoalsMade,
        StatField::FieldGoalsAttempted,
        StatField::FieldGoalPercentage,
        StatField::FreeThrowsMade,
        StatField::FreeThrowsAttempted,
        StatField::FreeThrowPercentage,
        StatField::ThreePointersMade,
        StatField::Points,
        StatField::Rebounds,
        StatField::Assists,
        StatField::Steals,
        StatField::Blocks,
        StatField::Turnovers,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StatField::FieldGoalsMade => "field_goals_made",
            StatField::FieldGoalsAttempted => "field_goals_attempted",
            StatField::FieldGoalPercentage => "field_goal_percentage",
            StatField::FreeThrowsMade => "free_throws_made",
            StatField::FreeThrowsAttempted => "free_throws_attempted",
            StatField::FreeThrowPercentage => "free_throw_percentage",
            StatField::ThreePointersMade => "three_pointers_made",
            StatField::Points => "points",
            StatField::Rebounds => "rebounds",
            StatField::Assists => "assists",
            StatField::Steals => "steals",
            StatField::Blocks => "blocks",
            StatField::Turnovers => "turnovers",
        }
    }

    /// Column name for a granularity. Season rows use accumulator names.
    pub fn column(self, granularity: Granularity) -> &'static str {
        if granularity != Granularity::Season {
            return self.name();
        }
        match self {
            StatField::Points => "total_points",
            StatField::Rebounds => "total_rebounds",
            StatField::Assists => "total_assists",
            StatField::Steals => "total_steals",
            StatField::Blocks => "total_blocks",
            StatField::Turnovers => "total_turnovers",
            other => other.name(),
        }
    }

    /// Accepts both plain and accumulator column names.
    pub fn from_column(column: &str) -> Option<StatField> {
        let plain = column.strip_prefix("total_").unwrap_or(column);
        StatField::ALL.into_iter().find(|f| f.name() == plain || f.name() == column)
    }

    pub fn is_percentage(self) -> bool {
        matches!(self, StatField::FieldGoalPercentage | StatField::FreeThrowPercentage)
    }
}

impl fmt::Display for StatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Stat line
// =============================================================================

/// The canonical stat columns. Absent means "not reported".
///
/// Deserialization also accepts the season accumulator names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatLine {
    pub field_goals_made: Option<i64>,
    pub field_goals_attempted: Option<i64>,
    pub field_goal_percentage: Option<f64>,
    pub free_throws_made: Option<i64>,
    pub free_throws_attempted: Option<i64>,
    pub free_throw_percentage: Option<f64>,
    pub three_pointers_made: Option<i64>,
    #[serde(alias = "total_points")]
    pub points: Option<i64>,
    #[serde(alias = "total_rebounds")]
    pub rebounds: Option<i64>,
    #[serde(alias = "total_assists")]
    pub assists: Option<i64>,
    #[serde(alias = "total_steals")]
    pub steals: Option<i64>,
    #[serde(alias = "total_blocks")]
    pub blocks: Option<i64>,
    #[serde(alias = "total_turnovers")]
    pub turnovers: Option<i64>,
}

impl StatLine {
    fn count_slot(&mut self, field: StatField) -> Option<&mut Option<i64>> {
        Some(match field {
            StatField::FieldGoalsMade => &mut self.field_goals_made,
            StatField::FieldGoalsAttempted => &mut self.field_goals_attempted,
            StatField::FreeThrowsMade => &mut self.free_throws_made,
            StatField::FreeThrowsAttempted => &mut self.free_throws_attempted,
            StatField::ThreePointersMade => &mut self.three_pointers_made,
            StatField::Points => &mut self.points,
            StatField::Rebounds => &mut self.rebounds,
            StatField::Assists => &mut self.assists,
            StatField::Steals => &mut self.steals,
            StatField::Blocks => &mut self.blocks,
            StatField::Turnovers => &mut self.turnovers,
            StatField::FieldGoalPercentage | StatField::FreeThrowPercentage => return None,
        })
    }

    /// Read any column as a float.
    pub fn get(&self, field: StatField) -> Option<f64> {
        match field {
            StatField::FieldGoalsMade => self.field_goals_made.map(|v| v as f64),
            StatField::FieldGoalsAttempted => self.field_goals_attempted.map(|v| v as f64),
            StatField::FieldGoalPercentage => self.field_goal_percentage,
            StatField::FreeThrowsMade => self.free_throws_made.map(|v| v as f64),
            StatField::FreeThrowsAttempted => self.free_throws_attempted.map(|v| v as f64),
            StatField::FreeThrowPercentage => self.free_throw_percentage,
            StatField::ThreePointersMade => self.three_pointers_made.map(|v| v as f64),
            StatField::Points => self.points.map(|v| v as f64),
            StatField::Rebounds => self.rebounds.map(|v| v as f64),
            StatField::Assists => self.assists.map(|v| v as f64),
            StatField::Steals => self.steals.map(|v| v as f64),
            StatField::Blocks => self.blocks.map(|v| v as f64),
            StatField::Turnovers => self.turnovers.map(|v| v as f64),
        }
    }

    pub fn set_count(&mut self, field: StatField, value: i64) {
        if let Some(slot) = self.count_slot(field) {
            *slot = Some(value);
        }
    }

    pub fn set_percentage(&mut self, field: StatField, value: f64) {
        match field {
            StatField::FieldGoalPercentage => self.field_goal_percentage = Some(value),
            StatField::FreeThrowPercentage => self.free_throw_percentage = Some(value),
            _ => {}
        }
    }

    /// Set a column from a float, truncating for count columns.
    pub fn set(&mut self, field: StatField, value: f64) {
        if field.is_percentage() {
            self.set_percentage(field, value);
        } else {
            self.set_count(field, value.trunc() as i64);
        }
    }

    pub fn is_empty(&self) -> bool {
        StatField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// Number of populated columns.
    pub fn populated(&self) -> usize {
        StatField::ALL.iter().filter(|f| self.get(**f).is_some()).count()
    }
}

// =============================================================================
// Stat table
// =============================================================================

/// How a raw stat value is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    MadeAttempted { made: StatField, attempted: StatField },
    Percentage(StatField),
    Count(StatField),
}

impl Decoder {
    pub fn fields(&self) -> Vec<StatField> {
        match *self {
            Decoder::MadeAttempted { made, attempted } => vec![made, attempted],
            Decoder::Percentage(f) | Decoder::Count(f) => vec![f],
        }
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            Decoder::MadeAttempted { .. } => "made/attempted",
            Decoder::Percentage(_) => "percentage",
            Decoder::Count(_) => "count",
        }
    }
}

/// One entry of a [`StatTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatDefinition {
    pub stat_id: String,
    pub display_name: String,
    pub decoder: Decoder,
}

impl StatDefinition {
    pub fn new(stat_id: impl Into<String>, display_name: impl Into<String>, decoder: Decoder) -> Self {
        Self { stat_id: stat_id.into(), display_name: display_name.into(), decoder }
    }
}

static STANDARD: Lazy<Arc<StatTable>> = Lazy::new(|| {
    use StatField::*;
    Arc::new(StatTable::new(vec![
        StatDefinition::new(
            "9004003",
            "Field Goals Made/Attempted",
            Decoder::MadeAttempted { made: FieldGoalsMade, attempted: FieldGoalsAttempted },
        ),
        StatDefinition::new("5", "Field Goal Percentage", Decoder::Percentage(FieldGoalPercentage)),
        StatDefinition::new(
            "9007006",
            "Free Throws Made/Attempted",
            Decoder::MadeAttempted { made: FreeThrowsMade, attempted: FreeThrowsAttempted },
        ),
        StatDefinition::new("8", "Free Throw Percentage", Decoder::Percentage(FreeThrowPercentage)),
        StatDefinition::new("10", "3-Point Shots Made", Decoder::Count(ThreePointersMade)),
        StatDefinition::new("12", "Points Scored", Decoder::Count(Points)),
        StatDefinition::new("15", "Total Rebounds", Decoder::Count(Rebounds)),
        StatDefinition::new("16", "Assists", Decoder::Count(Assists)),
        StatDefinition::new("17", "Steals", Decoder::Count(Steals)),
        StatDefinition::new("18", "Blocked Shots", Decoder::Count(Blocks)),
        StatDefinition::new("19", "Turnovers", Decoder::Count(Turnovers)),
    ]))
});

/// Immutable identifier → decoder table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatTable {
    entries: BTreeMap<String, StatDefinition>,
}

/// Result of decoding one stats block.
#[derive(Debug, Clone, Default)]
pub struct DecodedStats {
    pub line: StatLine,
    /// Identifiers the table does not know, with their raw values.
    pub unmapped: BTreeMap<String, Value>,
    pub issues: Vec<Issue>,
}

impl StatTable {
    pub fn new(definitions: Vec<StatDefinition>) -> Self {
        let entries = definitions.into_iter().map(|d| (d.stat_id.clone(), d)).collect();
        Self { entries }
    }

    /// The shared basketball 9-category table.
    pub fn standard() -> Arc<StatTable> {
        Arc::clone(&STANDARD)
    }

    pub fn get(&self, stat_id: &str) -> Option<&StatDefinition> {
        self.entries.get(stat_id)
    }

    pub fn contains(&self, stat_id: &str) -> bool {
        self.entries.contains_key(stat_id)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &StatDefinition> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifier that fills `field`, if any.
    pub fn stat_id_for(&self, field: StatField) -> Option<&str> {
        self.entries
            .values()
            .find(|d| d.decoder.fields().contains(&field))
            .map(|d| d.stat_id.as_str())
    }

    /// Decode one identifier into `out`. Returns `false` if the id is unknown.
    pub fn decode_one(&self, stat_id: &str, raw: &Value, out: &mut DecodedStats) -> bool {
        let Some(def) = self.entries.get(stat_id) else {
            return false;
        };
        let invalid = match def.decoder {
            Decoder::MadeAttempted { made, attempted } => match decode_made_attempted(raw) {
                Coerced::Present((m, a)) => {
                    out.line.set_count(made, m);
                    out.line.set_count(attempted, a);
                    false
                }
                other => other.is_invalid(),
            },
            Decoder::Percentage(field) => match decode_percentage(raw) {
                Coerced::Present(p) => {
                    if !(0.0..=100.0).contains(&p) {
                        out.issues.push(
                            Issue::coercion(format!(
                                "stat {} ({}) = {} is outside 0..=100",
                                stat_id, def.display_name, p
                            ))
                            .on(field.name())
                            .with_value(raw.clone()),
                        );
                    }
                    out.line.set_percentage(field, p);
                    false
                }
                other => other.is_invalid(),
            },
            Decoder::Count(field) => match decode_count(raw) {
                Coerced::Present(c) => {
                    out.line.set_count(field, c);
                    false
                }
                other => other.is_invalid(),
            },
        };
        if invalid {
            let field = def.decoder.fields()[0];
            out.issues.push(
                Issue::coercion(format!(
                    "stat {} ({}) expects {}, got {}",
                    stat_id,
                    def.display_name,
                    def.decoder.strategy(),
                    raw
                ))
                .on(field.name())
                .with_value(raw.clone()),
            );
        }
        true
    }

    /// Decode a stats block.
    ///
    /// Accepts `{"<id>": value}` or the upstream list form
    /// `[{"stat": {"stat_id": "<id>", "value": v}}]` (also as an indexed
    /// container).
    pub fn decode(&self, stats: &Value) -> DecodedStats {
        let mut out = DecodedStats::default();
        for (stat_id, raw) in stat_pairs(stats, &mut out.issues) {
            if !self.decode_one(&stat_id, raw, &mut out) {
                out.unmapped.insert(stat_id, raw.clone());
            }
        }
        out
    }
}

/// Flatten either stats shape into `(id, value)` pairs.
fn stat_pairs<'a>(stats: &'a Value, issues: &mut Vec<Issue>) -> Vec<(String, &'a Value)> {
    match stats {
        Value::Null => Vec::new(),
        Value::Object(map) if map.contains_key("count") => list_pairs(indexed_items(stats, "stat"), issues),
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(_) => list_pairs(indexed_items(stats, "stat"), issues),
        other => {
            issues.push(Issue::coercion(format!("stats block is neither a map nor a list: {}", other)).on("stats"));
            Vec::new()
        }
    }
}

fn list_pairs<'a>(items: Vec<&'a Value>, issues: &mut Vec<Issue>) -> Vec<(String, &'a Value)> {
    static NULL: Value = Value::Null;
    let mut pairs = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match item.get("stat_id").map(coerce::to_text) {
            Some(Coerced::Present(id)) => pairs.push((id, item.get("value").unwrap_or(&NULL))),
            _ => issues.push(Issue::coercion(format!("stat entry {} has no stat_id", i)).on("stats")),
        }
    }
    pairs
}
