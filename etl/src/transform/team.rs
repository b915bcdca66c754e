use serde_json::{Map, Value};

use super::{entity_parts, Transformer};
use crate::extract::{indexed_items, resolve_grouping, FieldReader};
use crate::models::{league_key_of, EntityType, Manager, Team};
use crate::result::TransformResult;

/// Team identity, counters and managers.
#[derive(Debug, Default, Clone, Copy)]
pub struct TeamTransformer;

impl Transformer for TeamTransformer {
    type Output = Team;
    const ENTITY: EntityType = EntityType::Team;

    fn item_key(&self) -> &'static str {
        "team"
    }

    fn transform(&self, raw: &Value) -> TransformResult<Team> {
        let parts = match entity_parts(raw, self.item_key()) {
            Ok(parts) => parts,
            Err(issue) => return TransformResult::failed(issue),
        };
        let mut f = FieldReader::new(&parts);

        let Some(team_key) = f.natural_key("team_key") else {
            return TransformResult::from_issues(None, f.finish());
        };
        let name = f.text("name");
        if name.is_none() {
            f.warn("name", "team has no name");
        }

        let managers = match f.raw("managers") {
            Some(container) => read_managers(container, &mut f),
            None => Vec::new(),
        };

        let team = Team {
            league_key: league_key_of(&team_key),
            team_id: f.text("team_id"),
            name: name.unwrap_or_default(),
            url: f.text("url"),
            logo_url: f.raw("team_logos").and_then(first_logo_url),
            waiver_priority: f.int_as("waiver_priority"),
            faab_balance: f.int("faab_balance"),
            number_of_moves: f.int_as("number_of_moves"),
            number_of_trades: f.int_as("number_of_trades"),
            roster_adds: read_roster_adds(&mut f),
            clinched_playoffs: f.bool_or("clinched_playoffs", false),
            managers,
            team_key,
        };
        TransformResult::from_issues(Some(team), f.finish())
    }
}

fn read_managers(container: &Value, f: &mut FieldReader<'_>) -> Vec<Manager> {
    indexed_items(container, "manager")
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let map: Map<String, Value> = resolve_grouping(item);
            let mut mf = FieldReader::over(&map).scoped(format!("managers[{}]", i));
            let manager = Manager {
                manager_id: mf.text("manager_id"),
                nickname: mf.text("nickname"),
                guid: mf.text("guid"),
                image_url: mf.text("image_url"),
                is_commissioner: mf.bool_or("is_commissioner", false),
                is_current_login: mf.bool_or("is_current_login", false),
            };
            f.absorb(mf.finish());
            manager
        })
        .collect()
}

/// `team_logos: [{"team_logo": {"size": "large", "url": ...}}]`
fn first_logo_url(logos: &Value) -> Option<String> {
    indexed_items(logos, "team_logo")
        .into_iter()
        .find_map(|logo| logo.get("url").and_then(Value::as_str).map(str::to_string))
}

/// `roster_adds` is either a count or `{"coverage_type", "coverage_value", "value"}`.
fn read_roster_adds(f: &mut FieldReader<'_>) -> Option<u32> {
    match f.raw("roster_adds") {
        Some(Value::Object(map)) => {
            let mut rf = FieldReader::over(map).scoped("roster_adds");
            let adds = rf.int_as("value");
            f.absorb(rf.finish());
            adds
        }
        Some(_) => f.int_as("roster_adds"),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_team() -> Value {
        json!({"team": [[
            {"team_key": "428.l.41083.t.3"},
            {"team_id": "3"},
            {"name": "Splash Bros"},
            [],
            {"url": "https://basketball.fantasysports.yahoo.com/nba/41083/3"},
            {"team_logos": [{"team_logo": {"size": "large", "url": "https://img/logo.png"}}]},
            [],
            {"waiver_priority": 4},
            {"faab_balance": "87"},
            {"number_of_moves": "11"},
            {"number_of_trades": 1},
            {"roster_adds": {"coverage_type": "week", "coverage_value": "3", "value": "2"}},
            {"clinched_playoffs": 1},
            {"managers": [
                {"manager": {"manager_id": "3", "nickname": "Steph", "guid": "ABC", "is_commissioner": "1"}},
                {"manager": {"manager_id": "7", "nickname": "Klay", "guid": "DEF", "is_current_login": "1"}}
            ]}
        ]]})
    }

    #[test]
    fn test_transform_team() {
        let r = TeamTransformer.transform(&raw_team());
        assert!(r.success(), "{:?}", r.errors());
        let team = r.data().unwrap();
        assert_eq!(team.team_key, "428.l.41083.t.3");
        assert_eq!(team.league_key.as_deref(), Some("428.l.41083"));
        assert_eq!(team.name, "Splash Bros");
        assert_eq!(team.logo_url.as_deref(), Some("https://img/logo.png"));
        assert_eq!(team.faab_balance, Some(87));
        assert_eq!(team.number_of_moves, Some(11));
        assert_eq!(team.roster_adds, Some(2));
        assert!(team.clinched_playoffs);
        assert_eq!(team.managers.len(), 2);
        assert_eq!(team.commissioner().and_then(|m| m.nickname.as_deref()), Some("Steph"));
        assert!(team.managers[1].is_current_login);
        assert!(r.warnings().is_empty());
    }

    #[test]
    fn test_team_without_key_fails() {
        let r = TeamTransformer.transform(&json!({"team": [[{"name": "Nameless"}]]}));
        assert!(!r.success());
        assert!(r.data().is_none());
    }

    #[test]
    fn test_garbage_manager_flag_is_scoped_warning() {
        let r = TeamTransformer.transform(&json!({
            "team_key": "428.l.1.t.1",
            "name": "T",
            "managers": [{"manager": {"manager_id": "1", "is_commissioner": "sometimes"}}]
        }));
        assert!(r.success());
        assert!(r.warnings().iter().any(|w| w.is_on("managers[0].is_commissioner")));
        assert!(!r.data().unwrap().managers[0].is_commissioner);
    }
}
