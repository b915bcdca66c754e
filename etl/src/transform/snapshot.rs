//! Player and team stat snapshots.
//!
//! The coordinate comes from the stats block's `coverage_type`:
//!
//! | coverage | coordinate | source of the fields                   |
//! |----------|------------|----------------------------------------|
//! | `date`   | daily      | `date` (block, then context), `season` |
//! | `week`   | weekly     | `week` and `season` (block, then context) |
//! | `season` | season     | `season` (block, then context)         |
//!
//! Without a `coverage_type` the context decides, preferring date, then
//! week, then season.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::{entity_parts, Transformer};
use crate::extract::FieldReader;
use crate::models::{Coordinate, EntityType, OwnerKind, SnapshotOwner, StatSnapshot};
use crate::result::{Issue, TransformResult};
use crate::stats::StatTable;

/// Coordinates supplied by the caller when the payload omits them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotContext {
    pub season: Option<String>,
    pub date: Option<NaiveDate>,
    pub week: Option<u32>,
}

impl SnapshotContext {
    pub fn season(season: impl Into<String>) -> Self {
        Self { season: Some(season.into()), ..Self::default() }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_week(mut self, week: u32) -> Self {
        self.week = Some(week);
        self
    }
}

/// Builds [`StatSnapshot`]s for one owner kind.
pub struct SnapshotTransformer {
    owner: OwnerKind,
    table: Arc<StatTable>,
    context: SnapshotContext,
}

impl SnapshotTransformer {
    pub fn new(owner: OwnerKind, table: Arc<StatTable>, context: SnapshotContext) -> Self {
        Self { owner, table, context }
    }

    pub fn players(context: SnapshotContext) -> Self {
        Self::new(OwnerKind::Player, StatTable::standard(), context)
    }

    pub fn teams(context: SnapshotContext) -> Self {
        Self::new(OwnerKind::Team, StatTable::standard(), context)
    }
}

impl Transformer for SnapshotTransformer {
    type Output = StatSnapshot;
    const ENTITY: EntityType = EntityType::StatSnapshot;

    fn item_key(&self) -> &'static str {
        self.owner.as_str()
    }

    fn transform(&self, raw: &Value) -> TransformResult<StatSnapshot> {
        let parts = match entity_parts(raw, self.item_key()) {
            Ok(parts) => parts,
            Err(issue) => return TransformResult::failed(issue),
        };
        let mut f = FieldReader::new(&parts);
        let key = f.natural_key(self.owner.key_field());
        let block = f.group(self.owner.stats_field());
        let points = f.group(self.owner.points_field());
        let mut result = TransformResult::from_issues(None, f.finish());

        let Some(key) = key else {
            return result;
        };
        // A flat record may carry `stats` directly instead of a stats block.
        let block = match block {
            Some(block) => block,
            None if parts.get("stats").is_some() => parts.head.clone(),
            None => {
                result.push(Issue::structural(format!("no '{}' block", self.owner.stats_field())));
                return result;
            }
        };

        let owner = SnapshotOwner { kind: self.owner, key };
        let built = build_snapshot(&self.table, owner, &block, points.as_ref(), &self.context);
        if let Some(snapshot) = result.merge(built) {
            result.set_data(snapshot);
        }
        result
    }
}

/// Decode one stats block into a snapshot for `owner`.
pub(crate) fn build_snapshot(
    table: &StatTable,
    owner: SnapshotOwner,
    block: &Map<String, Value>,
    points: Option<&Map<String, Value>>,
    context: &SnapshotContext,
) -> TransformResult<StatSnapshot> {
    let mut f = FieldReader::over(block).scoped(owner.kind.stats_field());
    let coordinate = resolve_coordinate(&mut f, context);
    let mut issues = f.finish();

    let points_total = points.and_then(|p| {
        let mut pf = FieldReader::over(p).scoped(owner.kind.points_field());
        let total = pf.float("total");
        issues.extend(pf.finish());
        total
    });

    let decoded = block.get("stats").map(|stats| table.decode(stats)).unwrap_or_default();
    issues.extend(decoded.issues);

    let snapshot = coordinate.map(|coordinate| StatSnapshot { owner, coordinate, stats: decoded.line, points_total });
    let mut result = TransformResult::from_issues(snapshot, issues);
    if !decoded.unmapped.is_empty() {
        let unmapped: Map<String, Value> = decoded.unmapped.into_iter().collect();
        result.insert_metadata("unmapped_stats", Value::Object(unmapped));
    }
    result
}

fn resolve_coordinate(f: &mut FieldReader<'_>, context: &SnapshotContext) -> Option<Coordinate> {
    let coverage = f.text("coverage_type").map(|c| c.to_ascii_lowercase());
    let season = f.text("season").or_else(|| context.season.clone());

    let coverage = match coverage {
        Some(c) => c,
        None if context.date.is_some() => "date".to_string(),
        None if context.week.is_some() => "week".to_string(),
        None if season.is_some() => "season".to_string(),
        None => {
            f.push(Issue::structural("no coverage_type and no coordinate in context").on("coverage_type"));
            return None;
        }
    };

    match coverage.as_str() {
        "date" => match f.date("date").or(context.date) {
            Some(date) => Some(Coordinate::Daily { date, season }),
            None => {
                f.push(Issue::structural("daily stats without a date").on("date"));
                None
            }
        },
        "week" => {
            let week = f.int_as::<u32>("week").or(context.week);
            match (season, week) {
                (Some(season), Some(week)) => Some(Coordinate::Weekly { season, week }),
                (None, _) => {
                    f.push(Issue::structural("weekly stats without a season").on("season"));
                    None
                }
                (_, None) => {
                    f.push(Issue::structural("weekly stats without a week").on("week"));
                    None
                }
            }
        }
        "season" => match season {
            Some(season) => Some(Coordinate::Season { season }),
            None => {
                f.push(Issue::structural("season stats without a season").on("season"));
                None
            }
        },
        other => {
            f.push(Issue::structural(format!("unsupported coverage_type '{}'", other)).on("coverage_type"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Decoder, StatDefinition, StatField};
    use serde_json::json;

    fn raw_player_stats(coverage: Value) -> Value {
        json!({"player": [
            [{"player_key": "428.p.6014"}, {"name": {"full": "Stephen Curry"}}],
            {"player_stats": coverage, "player_points": {"coverage_type": "date", "total": "41.5"}}
        ]})
    }

    #[test]
    fn test_daily_snapshot_from_block() {
        let raw = raw_player_stats(json!({
            "coverage_type": "date",
            "date": "2024-11-02",
            "stats": [
                {"stat": {"stat_id": "9004003", "value": "11/20"}},
                {"stat": {"stat_id": "5", "value": ".550"}},
                {"stat": {"stat_id": "12", "value": "32"}},
                {"stat": {"stat_id": "99", "value": "1"}}
            ]
        }));
        let r = SnapshotTransformer::players(SnapshotContext::season("2024")).transform(&raw);
        assert!(r.success(), "{:?}", r.errors());
        let s = r.data().unwrap();
        assert_eq!(s.owner.key, "428.p.6014");
        assert_eq!(
            s.coordinate,
            Coordinate::Daily { date: NaiveDate::from_ymd_opt(2024, 11, 2).unwrap(), season: Some("2024".into()) }
        );
        assert_eq!(s.stats.field_goals_made, Some(11));
        assert_eq!(s.stats.field_goal_percentage, Some(55.0));
        assert_eq!(s.stats.points, Some(32));
        assert_eq!(s.points_total, Some(41.5));
        assert_eq!(r.metadata()["unmapped_stats"], json!({"99": "1"}));
    }

    #[test]
    fn test_season_snapshot_uses_block_season() {
        let raw = raw_player_stats(json!({"coverage_type": "season", "season": "2023", "stats": {"15": "700"}}));
        let r = SnapshotTransformer::players(SnapshotContext::default()).transform(&raw);
        let s = r.data().unwrap();
        assert_eq!(s.coordinate, Coordinate::Season { season: "2023".into() });
        assert_eq!(s.stats.rebounds, Some(700));
    }

    #[test]
    fn test_weekly_without_season_fails() {
        let raw = json!({"team": [[{"team_key": "428.l.1.t.1"}], {"team_stats": {"coverage_type": "week", "week": "3", "stats": []}}]});
        let r = SnapshotTransformer::teams(SnapshotContext::default()).transform(&raw);
        assert!(!r.success());
        assert!(r.errors().iter().any(|e| e.is_on("team_stats.season")));

        let r = SnapshotTransformer::teams(SnapshotContext::season("2024")).transform(&raw);
        assert_eq!(r.data().unwrap().coordinate, Coordinate::Weekly { season: "2024".into(), week: 3 });
    }

    #[test]
    fn test_unsupported_coverage_and_missing_block() {
        let raw = raw_player_stats(json!({"coverage_type": "lastmonth", "stats": []}));
        let r = SnapshotTransformer::players(SnapshotContext::season("2024")).transform(&raw);
        assert!(!r.success());

        let r = SnapshotTransformer::players(SnapshotContext::season("2024"))
            .transform(&json!({"player": [[{"player_key": "428.p.1"}]]}));
        assert!(!r.success());
    }

    #[test]
    fn test_context_date_without_coverage() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        let raw = json!({"player_key": "428.p.1", "stats": {"17": "3"}});
        let r = SnapshotTransformer::players(SnapshotContext::default().with_date(date)).transform(&raw);
        let s = r.data().unwrap();
        assert_eq!(s.coordinate, Coordinate::Daily { date, season: None });
        assert_eq!(s.stats.steals, Some(3));
    }

    #[test]
    fn test_reduced_table_is_injectable() {
        let table = Arc::new(StatTable::new(vec![StatDefinition::new("12", "PTS", Decoder::Count(StatField::Points))]));
        let t = SnapshotTransformer::new(OwnerKind::Player, table, SnapshotContext::season("2024"));
        let raw = raw_player_stats(json!({"coverage_type": "season", "stats": {"12": "10", "15": "4"}}));
        let r = t.transform(&raw);
        let s = r.data().unwrap();
        assert_eq!(s.stats.points, Some(10));
        assert_eq!(s.stats.rebounds, None);
    }

    #[test]
    fn test_missing_owner_key() {
        let raw = json!({"player": [[{"player_id": "1"}], {"player_stats": {"coverage_type": "season", "stats": []}}]});
        let r = SnapshotTransformer::players(SnapshotContext::season("2024")).transform(&raw);
        assert!(!r.success());
        assert!(r.data().is_none());
    }
}
