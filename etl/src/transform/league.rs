use serde_json::{Map, Value};
use std::sync::Arc;

use super::{entity_parts, Transformer};
use crate::extract::{indexed_items, resolve_grouping, FieldReader};
use crate::models::{game_key_of, EntityType, League, LeagueSettings, ScoringType, StatCategory};
use crate::result::{Issue, TransformResult};
use crate::stats::StatTable;

/// League metadata, plus settings when the response includes them.
pub struct LeagueTransformer {
    table: Arc<StatTable>,
}

impl LeagueTransformer {
    pub fn new(table: Arc<StatTable>) -> Self {
        Self { table }
    }
}

impl Default for LeagueTransformer {
    fn default() -> Self {
        Self::new(StatTable::standard())
    }
}

impl Transformer for LeagueTransformer {
    type Output = League;
    const ENTITY: EntityType = EntityType::League;

    fn item_key(&self) -> &'static str {
        "league"
    }

    fn transform(&self, raw: &Value) -> TransformResult<League> {
        let parts = match entity_parts(raw, self.item_key()) {
            Ok(parts) => parts,
            Err(issue) => return TransformResult::failed(issue),
        };
        let mut f = FieldReader::new(&parts);

        let league_key = f.natural_key("league_key");
        let name = f.text("name");
        if name.is_none() {
            f.warn("name", "league has no name");
        }
        let season = f.text("season");
        if season.is_none() {
            f.warn("season", "league has no season");
        }

        let settings = f.group("settings").map(|map| {
            let mut sf = FieldReader::over(&map).scoped("settings");
            let settings = self.read_settings(&mut sf);
            let issues = sf.finish();
            f.absorb(issues);
            settings
        });

        let league = league_key.map(|league_key| League {
            game_key: game_key_of(&league_key),
            league_id: f.text("league_id"),
            name: name.unwrap_or_default(),
            url: f.text("url"),
            num_teams: f.int_as("num_teams"),
            scoring_type: f.text("scoring_type").map(ScoringType::from),
            league_type: f.text("league_type"),
            draft_status: f.text("draft_status"),
            season: season.unwrap_or_default(),
            game_code: f.text("game_code"),
            start_date: f.date("start_date"),
            end_date: f.date("end_date"),
            current_week: f.int_as("current_week"),
            start_week: f.int_as("start_week"),
            end_week: f.int_as("end_week"),
            is_finished: f.bool_or("is_finished", false),
            is_pro_league: f.bool_or("is_pro_league", false),
            is_cash_league: f.bool_or("is_cash_league", false),
            settings,
            league_key,
        });

        TransformResult::from_issues(league, f.finish())
    }
}

impl LeagueTransformer {
    fn read_settings(&self, f: &mut FieldReader<'_>) -> LeagueSettings {
        let mut settings = LeagueSettings {
            draft_type: f.text("draft_type"),
            is_auction_draft: f.opt_bool("is_auction_draft"),
            uses_playoff: f.opt_bool("uses_playoff"),
            playoff_start_week: f.int_as("playoff_start_week"),
            num_playoff_teams: f.int_as("num_playoff_teams"),
            waiver_type: f.text("waiver_type"),
            waiver_rule: f.text("waiver_rule"),
            uses_faab: f.opt_bool("uses_faab"),
            max_teams: f.int_as("max_teams"),
            trade_end_date: f.date("trade_end_date"),
            stat_categories: Vec::new(),
        };

        let stats = f.raw("stat_categories").and_then(|c| c.get("stats"));
        if let Some(stats) = stats {
            for (i, item) in indexed_items(stats, "stat").into_iter().enumerate() {
                let map = resolve_grouping(item);
                let (category, issues) = self.read_category(&map, i);
                f.absorb(issues);
                settings.stat_categories.extend(category);
            }
        }
        settings
    }

    fn read_category(&self, map: &Map<String, Value>, index: usize) -> (Option<StatCategory>, Vec<Issue>) {
        let scope = format!("settings.stat_categories[{}]", index);
        let mut cf = FieldReader::over(map).scoped(scope.clone());
        let Some(stat_id) = cf.text("stat_id") else {
            let mut issues = cf.finish();
            issues.push(Issue::coercion("stat category without stat_id skipped").on(scope));
            return (None, issues);
        };
        let category = StatCategory {
            mapped: self.table.contains(&stat_id),
            name: cf.text("name"),
            display_name: cf.text("display_name"),
            enabled: cf.bool_or("enabled", true),
            sort_order: cf.int("sort_order"),
            position_type: cf.text("position_type"),
            is_only_display_stat: cf.bool_or("is_only_display_stat", false),
            stat_id,
        };
        (Some(category), cf.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_league() -> Value {
        json!({"league": [
            {
                "league_key": "428.l.41083",
                "league_id": "41083",
                "name": "Hoops Dynasty",
                "url": "https://basketball.fantasysports.yahoo.com/nba/41083",
                "draft_status": "postdraft",
                "num_teams": 12,
                "scoring_type": "head",
                "league_type": "private",
                "current_week": "3",
                "start_week": "1",
                "start_date": "2024-10-22",
                "end_week": "21",
                "end_date": "2025-03-23",
                "is_finished": "0",
                "game_code": "nba",
                "season": "2024"
            },
            {"settings": [{
                "draft_type": "live",
                "uses_playoff": "1",
                "playoff_start_week": "19",
                "num_playoff_teams": "6",
                "waiver_type": "R",
                "uses_faab": "0",
                "stat_categories": {"stats": [
                    {"stat": {"stat_id": 5, "enabled": "1", "name": "Field Goal Percentage", "display_name": "FG%", "sort_order": "1"}},
                    {"stat": {"stat_id": 9004003, "enabled": "1", "is_only_display_stat": "1"}},
                    {"stat": {"stat_id": 27, "enabled": "1", "name": "Double-Doubles"}},
                    {"stat": {"name": "broken"}}
                ]}
            }]}
        ]})
    }

    #[test]
    fn test_transform_league() {
        let r = LeagueTransformer::default().transform(&raw_league());
        assert!(r.success(), "{:?}", r.errors());
        let league = r.data().unwrap();
        assert_eq!(league.league_key, "428.l.41083");
        assert_eq!(league.game_key.as_deref(), Some("428"));
        assert_eq!(league.num_teams, Some(12));
        assert_eq!(league.scoring_type, Some(ScoringType::Head));
        assert_eq!(league.current_week, Some(3));
        assert_eq!(league.start_date.map(|d| d.to_string()).as_deref(), Some("2024-10-22"));
        assert!(!league.is_finished);

        let settings = league.settings.as_ref().unwrap();
        assert_eq!(settings.uses_playoff, Some(true));
        assert_eq!(settings.num_playoff_teams, Some(6));
        assert_eq!(settings.stat_categories.len(), 3);
        assert!(settings.stat_categories[0].mapped);
        assert!(settings.stat_categories[1].is_only_display_stat);
        assert!(!settings.stat_categories[2].mapped);
        assert_eq!(r.warnings().len(), 1);
    }

    #[test]
    fn test_missing_league_key_fails() {
        let r = LeagueTransformer::default().transform(&json!({"league": [{"name": "No Key", "season": "2024"}]}));
        assert!(!r.success());
        assert!(r.data().is_none());
        assert!(r.errors()[0].is_on("league_key"));
    }

    #[test]
    fn test_garbage_num_teams_is_warning() {
        let r = LeagueTransformer::default().transform(&json!({
            "league_key": "428.l.1", "name": "L", "season": "2024", "num_teams": "twelve"
        }));
        assert!(r.success());
        assert_eq!(r.data().unwrap().num_teams, None);
        assert!(r.warnings().iter().any(|w| w.is_on("num_teams")));
        assert!(r.data().unwrap().settings.is_none());
    }
}
