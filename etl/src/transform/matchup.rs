use serde_json::Value;
use std::sync::Arc;

use super::snapshot::build_snapshot;
use super::{entity_parts, SnapshotContext, Transformer};
use crate::extract::{indexed_items, split_head_tail, FieldReader};
use crate::models::{league_key_of, EntityType, Matchup, MatchupTeam, OwnerKind, SnapshotOwner, StatWinner};
use crate::result::{Issue, Severity, TransformResult};
use crate::stats::StatTable;

/// Weekly head-to-head pairings from a scoreboard.
///
/// Team stat lines are decoded into weekly snapshots, which need a season.
/// Without one the pairing is still produced and the lines are left out.
pub struct MatchupTransformer {
    table: Arc<StatTable>,
    season: Option<String>,
    league_key: Option<String>,
}

impl MatchupTransformer {
    pub fn new(table: Arc<StatTable>) -> Self {
        Self { table, season: None, league_key: None }
    }

    pub fn with_season(mut self, season: impl Into<String>) -> Self {
        self.season = Some(season.into());
        self
    }

    pub fn with_league_key(mut self, league_key: impl Into<String>) -> Self {
        self.league_key = Some(league_key.into());
        self
    }
}

impl Default for MatchupTransformer {
    fn default() -> Self {
        Self::new(StatTable::standard())
    }
}

impl Transformer for MatchupTransformer {
    type Output = Matchup;
    const ENTITY: EntityType = EntityType::Matchup;

    fn item_key(&self) -> &'static str {
        "matchup"
    }

    fn transform(&self, raw: &Value) -> TransformResult<Matchup> {
        let parts = match entity_parts(raw, self.item_key()) {
            Ok(parts) => parts,
            Err(issue) => return TransformResult::failed(issue),
        };
        let mut f = FieldReader::new(&parts);

        let Some(week) = f.int_as::<u32>("week") else {
            f.push(Issue::structural("matchup has no usable week").on("week"));
            return TransformResult::from_issues(None, f.finish());
        };

        let stat_winners = match f.raw("stat_winners") {
            Some(container) => self.read_stat_winners(container, &mut f),
            None => Vec::new(),
        };

        let mut teams = Vec::new();
        let container = parts.get("0").and_then(|zero| zero.get("teams")).or_else(|| f.raw("teams"));
        match container {
            Some(container) => {
                for (i, item) in indexed_items(container, "team").into_iter().enumerate() {
                    if let Some(team) = self.read_team(item, week, i, &mut f) {
                        teams.push(team);
                    }
                }
            }
            None => f.push(Issue::structural("matchup has no teams container").on("teams")),
        }

        let league_key = self
            .league_key
            .clone()
            .or_else(|| teams.first().and_then(|t| league_key_of(&t.team_key)));

        let matchup = Matchup {
            league_key,
            week,
            week_start: f.date("week_start"),
            week_end: f.date("week_end"),
            status: f.text("status"),
            is_playoffs: f.bool_or("is_playoffs", false),
            is_consolation: f.bool_or("is_consolation", false),
            is_tied: f.bool_or("is_tied", false),
            winner_team_key: f.text("winner_team_key"),
            teams,
            stat_winners,
        };
        TransformResult::from_issues(Some(matchup), f.finish())
    }
}

impl MatchupTransformer {
    fn read_stat_winners(&self, container: &Value, f: &mut FieldReader<'_>) -> Vec<StatWinner> {
        let mut winners = Vec::new();
        for (i, item) in indexed_items(container, "stat_winner").into_iter().enumerate() {
            let Some(map) = item.as_object() else {
                f.push(Issue::coercion("stat winner is not an object").on(format!("stat_winners[{}]", i)));
                continue;
            };
            let mut wf = FieldReader::over(map).scoped(format!("stat_winners[{}]", i));
            if let Some(stat_id) = wf.text("stat_id") {
                let field = self
                    .table
                    .get(&stat_id)
                    .and_then(|d| d.decoder.fields().first().map(|field| field.name().to_string()));
                winners.push(StatWinner {
                    field,
                    winner_team_key: wf.text("winner_team_key"),
                    is_tied: wf.bool_or("is_tied", false),
                    stat_id,
                });
            } else {
                wf.warn("stat_id", "stat winner without stat_id skipped");
            }
            f.absorb(wf.finish());
        }
        winners
    }

    fn read_team(&self, item: &Value, week: u32, index: usize, f: &mut FieldReader<'_>) -> Option<MatchupTeam> {
        let scope = format!("teams[{}]", index);
        let parts = split_head_tail(item);
        let mut tf = FieldReader::new(&parts).scoped(scope.clone());

        let Some(team_key) = tf.natural_key("team_key") else {
            // A side without a key cannot be paired; keep the matchup, drop the side.
            f.absorb(tf.finish().into_iter().map(demote).collect());
            return None;
        };
        let points = tf.group("team_points");
        let projected = tf.group("team_projected_points");
        let block = tf.group("team_stats");

        let points_total = points.as_ref().and_then(|p| {
            let mut pf = FieldReader::over(p).scoped(format!("{}.team_points", scope));
            let total = pf.float("total");
            f.absorb(pf.finish());
            total
        });
        let projected_points = projected.as_ref().and_then(|p| {
            let mut pf = FieldReader::over(p).scoped(format!("{}.team_projected_points", scope));
            let total = pf.float("total");
            f.absorb(pf.finish());
            total
        });

        let stats = match (block, &self.season) {
            (None, _) => None,
            (Some(_), None) => {
                tf.warn("team_stats", "no season supplied; weekly team stats dropped");
                None
            }
            (Some(block), Some(season)) => {
                let context = SnapshotContext::season(season.clone()).with_week(week);
                let owner = SnapshotOwner { kind: OwnerKind::Team, key: team_key.clone() };
                let built = build_snapshot(&self.table, owner, &block, points.as_ref(), &context);
                // A bad stat line never sinks the pairing.
                for issue in built.errors().iter().chain(built.warnings()) {
                    tf.push(demote(issue.clone()));
                }
                built.into_data()
            }
        };

        let team = MatchupTeam { name: tf.text("name"), points_total, projected_points, stats, team_key };
        f.absorb(tf.finish());
        Some(team)
    }
}

fn demote(mut issue: Issue) -> Issue {
    if issue.severity.is_blocking() {
        issue.severity = Severity::Warning;
    }
    issue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use serde_json::json;

    fn side(key: &str, name: &str, points: &str, pts: &str) -> Value {
        json!({"team": [
            [{"team_key": key}, {"team_id": "1"}, {"name": name}],
            {
                "team_stats": {"coverage_type": "week", "week": "3", "stats": [
                    {"stat": {"stat_id": "12", "value": pts}},
                    {"stat": {"stat_id": "9004003", "value": "120/250"}}
                ]},
                "team_points": {"coverage_type": "week", "week": "3", "total": points},
                "team_projected_points": {"coverage_type": "week", "week": "3", "total": "6.1"}
            }
        ]})
    }

    fn raw_matchup() -> Value {
        json!({"matchup": {
            "week": "3",
            "week_start": "2024-11-04",
            "week_end": "2024-11-10",
            "status": "postevent",
            "is_playoffs": "0",
            "is_consolation": "0",
            "is_tied": 0,
            "winner_team_key": "428.l.41083.t.3",
            "stat_winners": [
                {"stat_winner": {"stat_id": "5", "winner_team_key": "428.l.41083.t.3"}},
                {"stat_winner": {"stat_id": "12", "winner_team_key": "428.l.41083.t.3"}},
                {"stat_winner": {"stat_id": "19", "is_tied": "1"}}
            ],
            "0": {"teams": {
                "count": 2,
                "0": side("428.l.41083.t.3", "Splash Bros", "6", "540"),
                "1": side("428.l.41083.t.8", "Lob City", "3", "488")
            }}
        }})
    }

    #[test]
    fn test_transform_matchup_with_season() {
        let r = MatchupTransformer::default().with_season("2024").transform(&raw_matchup());
        assert!(r.success(), "{:?}", r.errors());
        let m = r.data().unwrap();
        assert_eq!(m.week, 3);
        assert_eq!(m.league_key.as_deref(), Some("428.l.41083"));
        assert_eq!(m.teams.len(), 2);
        assert_eq!(m.teams[0].points_total, Some(6.0));
        assert_eq!(m.teams[0].projected_points, Some(6.1));
        let stats = m.teams[0].stats.as_ref().unwrap();
        assert_eq!(stats.coordinate, Coordinate::Weekly { season: "2024".into(), week: 3 });
        assert_eq!(stats.stats.points, Some(540));
        assert_eq!(stats.stats.field_goals_attempted, Some(250));
        assert_eq!(m.stat_winners[0].field.as_deref(), Some("field_goal_percentage"));
        assert!(m.stat_winners[2].is_tied);
        assert_eq!(m.category_wins("428.l.41083.t.3"), 2);
        assert_eq!(m.uniqueness_key(), "w3:428.l.41083.t.3|428.l.41083.t.8");
    }

    #[test]
    fn test_without_season_stats_are_dropped_with_warning() {
        let r = MatchupTransformer::default().transform(&raw_matchup());
        assert!(r.success());
        let m = r.data().unwrap();
        assert!(m.teams.iter().all(|t| t.stats.is_none()));
        assert!(r.warnings().iter().any(|w| w.is_on("teams[1].team_stats")));
    }

    #[test]
    fn test_missing_week_fails() {
        let r = MatchupTransformer::default().transform(&json!({"matchup": {"week": "soon", "teams": []}}));
        assert!(!r.success());
        assert!(r.errors().iter().any(|e| e.is_on("week")));
    }

    #[test]
    fn test_keyless_side_is_dropped_not_fatal() {
        let raw = json!({"week": 1, "teams": [
            {"team": [[{"name": "Ghost"}]]},
            {"team": [[{"team_key": "428.l.1.t.2"}]]}
        ]});
        let r = MatchupTransformer::default().with_league_key("428.l.1").transform(&raw);
        assert!(r.success());
        let m = r.data().unwrap();
        assert_eq!(m.teams.len(), 1);
        assert_eq!(m.league_key.as_deref(), Some("428.l.1"));
        assert!(r.warnings().iter().any(|w| w.is_on("teams[0].team_key")));
    }
}
