use chrono::NaiveDate;
use serde_json::Value;

use super::{collect_positions, entity_parts, parse_name, Transformer};
use crate::extract::coerce::{to_bool, to_int};
use crate::extract::{get_path, indexed_items, resolve_grouping, split_head_tail, Coerced, EntityParts, FieldReader};
use crate::models::player::push_unique_positions;
use crate::models::{EntityType, RosterDay, RosterEntry};
use crate::result::{Issue, IssueKind, Severity, TransformResult};

/// Team and date to fall back on when the roster payload omits them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterContext {
    pub team_key: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Turns a team's roster response into a [`RosterDay`].
///
/// Input is either a team entity with a `roster` tail or the bare roster
/// object.
#[derive(Debug, Clone, Default)]
pub struct RosterTransformer {
    context: RosterContext,
}

impl RosterTransformer {
    pub fn new(context: RosterContext) -> Self {
        Self { context }
    }
}

impl Transformer for RosterTransformer {
    type Output = RosterDay;
    const ENTITY: EntityType = EntityType::RosterDay;

    fn item_key(&self) -> &'static str {
        "team"
    }

    fn transform(&self, raw: &Value) -> TransformResult<RosterDay> {
        let parts = match entity_parts(raw, self.item_key()) {
            Ok(parts) => parts,
            Err(issue) => return TransformResult::failed(issue),
        };
        let mut f = FieldReader::new(&parts);

        let team_key = match f.text("team_key").or_else(|| self.context.team_key.clone()) {
            Some(key) => key,
            None => {
                f.push(Issue::structural("missing natural key 'team_key'").on("team_key"));
                return TransformResult::from_issues(None, f.finish());
            }
        };

        // Either `{"roster": {...}}` in the tail or the roster object itself.
        let roster = f.group("roster").unwrap_or_else(|| parts.head.clone());
        let mut rf = FieldReader::over(&roster).scoped("roster");
        let date = rf.date("date").or(self.context.date);
        f.absorb(rf.finish());
        let Some(date) = date else {
            f.push(Issue::structural("roster has no date and none was supplied").on("roster.date"));
            return TransformResult::from_issues(None, f.finish());
        };

        let roster_value = Value::Object(roster);
        let players = get_path(&roster_value, &["0", "players"]).or_else(|| roster_value.get("players"));
        let mut entries = Vec::new();
        if let Some(players) = players {
            for (i, item) in indexed_items(players, "player").into_iter().enumerate() {
                let player_parts = split_head_tail(item);
                let (entry, issues) = read_entry(&player_parts, &team_key, date, i);
                f.absorb(issues);
                entries.extend(entry);
            }
        } else {
            f.warn("roster", "roster has no players container");
        }

        TransformResult::from_issues(Some(RosterDay { team_key, date, entries }), f.finish())
    }
}

fn read_entry(
    parts: &EntityParts,
    team_key: &str,
    date: NaiveDate,
    index: usize,
) -> (Option<RosterEntry>, Vec<Issue>) {
    let scope = format!("players[{}]", index);
    let mut f = FieldReader::new(parts).scoped(scope.clone());

    let Some(player_key) = f.text("player_key") else {
        let mut issues = f.finish();
        issues.push(
            Issue::new(Severity::Warning, IssueKind::Structural, "roster player without player_key skipped")
                .on(scope),
        );
        return (None, issues);
    };

    let selected_position = match f.raw("selected_position") {
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(other) => resolve_grouping(other)
            .get("position")
            .and_then(Value::as_str)
            .map(str::to_string),
        None => None,
    };

    let mut eligible_positions = Vec::new();
    if let Some(eligible) = f.raw("eligible_positions") {
        push_unique_positions(&mut eligible_positions, collect_positions(eligible));
    }

    let mut entry = RosterEntry {
        team_key: team_key.to_string(),
        player_key,
        date,
        player_name: f.raw("name").map(parse_name).and_then(|n| n.full),
        selected_position: selected_position.clone(),
        is_starting: false,
        is_bench: false,
        is_injured_reserve: false,
        eligible_positions,
        status: f.text("status"),
        is_keeper: false,
        keeper_cost: None,
        kept: None,
    };
    entry.assign_slot(selected_position.as_deref());
    if selected_position.is_none() {
        f.warn("selected_position", "no selected position; slot unknown");
    }

    if let Some(keeper) = f.raw("is_keeper") {
        read_keeper(keeper, &mut entry, &mut f);
    }

    (Some(entry), f.finish())
}

/// `is_keeper` is either a flag or `{"status", "cost", "kept"}` where
/// `false` stands for "none".
fn read_keeper(keeper: &Value, entry: &mut RosterEntry, f: &mut FieldReader<'_>) {
    match keeper {
        Value::Object(map) => {
            entry.is_keeper = map.get("status").map(to_bool).and_then(Coerced::present).unwrap_or(false);
            entry.kept = map.get("kept").map(to_bool).and_then(Coerced::present);
            entry.keeper_cost = match map.get("cost") {
                None | Some(Value::Bool(_)) => None,
                Some(cost) => match to_int(cost) {
                    Coerced::Present(c) => Some(c),
                    Coerced::Missing => None,
                    Coerced::Invalid => {
                        f.warn("is_keeper.cost", format!("expected an integer, got {}", cost));
                        None
                    }
                },
            };
        }
        other => match to_bool(other) {
            Coerced::Present(flag) => entry.is_keeper = flag,
            Coerced::Missing => {}
            Coerced::Invalid => f.warn("is_keeper", format!("expected a boolean, got {}", other)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roster_player(key: &str, name: &str, position: &str) -> Value {
        json!({"player": [
            [{"player_key": key}, {"name": {"full": name}}, {"eligible_positions": [{"position": "PG"}, {"position": "G"}]}],
            {"selected_position": [{"coverage_type": "date", "date": "2024-11-02"}, {"position": position}]},
            {"is_keeper": {"status": false, "cost": false, "kept": false}}
        ]})
    }

    fn raw_roster() -> Value {
        json!({"team": [
            [{"team_key": "428.l.41083.t.3"}, {"name": "Splash Bros"}],
            {"roster": {
                "coverage_type": "date",
                "date": "2024-11-02",
                "0": {"players": {
                    "count": 4,
                    "0": roster_player("428.p.6014", "Stephen Curry", "PG"),
                    "1": roster_player("428.p.5007", "Jimmy Butler", "BN"),
                    "2": roster_player("428.p.4563", "Kawhi Leonard", "IL+"),
                    "3": {"player": [[{"name": {"full": "Ghost"}}], {"selected_position": [{"position": "C"}]}]}
                }}
            }}
        ]})
    }

    #[test]
    fn test_transform_roster_day() {
        let r = RosterTransformer::default().transform(&raw_roster());
        assert!(r.success(), "{:?}", r.errors());
        let day = r.data().unwrap();
        assert_eq!(day.team_key, "428.l.41083.t.3");
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 11, 2).unwrap());
        assert_eq!(day.entries.len(), 3);

        let curry = &day.entries[0];
        assert!(curry.is_starting && !curry.is_bench && !curry.is_injured_reserve);
        assert_eq!(curry.player_name.as_deref(), Some("Stephen Curry"));
        assert_eq!(curry.eligible_positions, vec!["PG", "G"]);
        assert!(!curry.is_keeper);
        assert_eq!(curry.keeper_cost, None);
        assert_eq!(curry.kept, Some(false));

        assert!(day.entries[1].is_bench);
        assert!(day.entries[2].is_injured_reserve);

        assert!(r.warnings().iter().any(|w| w.is_on("players[3]") && w.kind == IssueKind::Structural));
    }

    #[test]
    fn test_missing_date_is_structural_unless_supplied() {
        let raw = json!({"team": [[{"team_key": "428.l.1.t.1"}], {"roster": {"0": {"players": {"count": 0}}}}]});
        let r = RosterTransformer::default().transform(&raw);
        assert!(!r.success());
        assert!(r.errors().iter().any(|e| e.is_on("roster.date")));

        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let r = RosterTransformer::new(RosterContext { team_key: None, date: Some(date) }).transform(&raw);
        assert!(r.success());
        assert_eq!(r.data().unwrap().date, date);
        assert!(r.data().unwrap().entries.is_empty());
    }

    #[test]
    fn test_bare_roster_with_context_team() {
        let raw = json!({"date": "2024-11-03", "players": [roster_player("428.p.1", "A", "Util")]});
        let ctx = RosterContext { team_key: Some("428.l.1.t.9".into()), date: None };
        let r = RosterTransformer::new(ctx).transform(&raw);
        let day = r.data().unwrap();
        assert_eq!(day.team_key, "428.l.1.t.9");
        assert_eq!(day.entries[0].selected_position.as_deref(), Some("Util"));
        assert!(day.entries[0].is_starting);
    }

    #[test]
    fn test_keeper_object_with_cost() {
        let raw = json!({"team_key": "428.l.1.t.1", "date": "2024-11-03", "players": [
            {"player": [[{"player_key": "428.p.1"}], {"selected_position": "BN", "is_keeper": {"status": "1", "cost": "12", "kept": true}}]}
        ]});
        let r = RosterTransformer::default().transform(&raw);
        let e = &r.data().unwrap().entries[0];
        assert!(e.is_keeper);
        assert_eq!(e.keeper_cost, Some(12));
        assert_eq!(e.kept, Some(true));
        assert!(e.is_bench);
    }
}
