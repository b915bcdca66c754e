use serde_json::Value;

use super::{collect_positions, entity_parts, parse_name, Transformer};
use crate::extract::FieldReader;
use crate::models::player::push_unique_positions;
use crate::models::{game_key_of, EntityType, Player, PlayerStatus};
use crate::result::TransformResult;

/// Player identity, eligibility and availability.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlayerTransformer;

impl Transformer for PlayerTransformer {
    type Output = Player;
    const ENTITY: EntityType = EntityType::Player;

    fn item_key(&self) -> &'static str {
        "player"
    }

    fn transform(&self, raw: &Value) -> TransformResult<Player> {
        let parts = match entity_parts(raw, self.item_key()) {
            Ok(parts) => parts,
            Err(issue) => return TransformResult::failed(issue),
        };
        let mut f = FieldReader::new(&parts);

        let Some(player_key) = f.natural_key("player_key") else {
            return TransformResult::from_issues(None, f.finish());
        };

        let name = f.raw("name").map(parse_name).unwrap_or_default();
        if name.full.is_none() {
            f.warn("name", "player has no full name");
        }

        let display_position = f.text("display_position");
        let mut positions = Vec::new();
        if let Some(eligible) = f.raw("eligible_positions") {
            push_unique_positions(&mut positions, collect_positions(eligible));
        }
        if positions.is_empty() {
            if let Some(display) = &display_position {
                push_unique_positions(&mut positions, display.split(','));
            }
        }

        let headshot_url = f
            .raw("headshot")
            .and_then(|h| h.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| f.text("image_url"));

        let owner_team_key = f
            .group("ownership")
            .and_then(|o| o.get("owner_team_key").and_then(Value::as_str).map(str::to_string));

        let player = Player {
            game_key: game_key_of(&player_key),
            player_id: f.text("player_id"),
            editorial_player_key: f.text("editorial_player_key"),
            full_name: name.full.unwrap_or_default(),
            first_name: name.first,
            last_name: name.last,
            current_team_key: f.text("editorial_team_key"),
            current_team_name: f.text("editorial_team_full_name"),
            current_team_abbr: f.text("editorial_team_abbr"),
            uniform_number: f.text("uniform_number"),
            display_position,
            primary_position: f.text("primary_position"),
            position_type: f.text("position_type"),
            positions,
            status: f.text("status").map(|s| PlayerStatus::from_code(&s)).unwrap_or_default(),
            status_full: f.text("status_full"),
            injury_note: f.text("injury_note"),
            is_undroppable: f.bool_or("is_undroppable", false),
            headshot_url,
            owner_team_key,
            player_key,
        };
        TransformResult::from_issues(Some(player), f.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_player() -> Value {
        json!({"player": [[
            {"player_key": "428.p.6014"},
            {"player_id": "6014"},
            {"name": {"full": "Stephen Curry", "first": "Stephen", "last": "Curry", "ascii_first": "Stephen"}},
            {"editorial_player_key": "nba.p.4612"},
            {"editorial_team_key": "nba.t.9"},
            {"editorial_team_full_name": "Golden State Warriors"},
            {"editorial_team_abbr": "GSW"},
            {"uniform_number": "30"},
            {"display_position": "PG,SG"},
            {"headshot": {"url": "https://img/curry.png", "size": "small"}},
            {"is_undroppable": "1"},
            {"position_type": "P"},
            {"primary_position": "PG"},
            {"eligible_positions": [{"position": "PG"}, {"position": "SG"}, {"position": "G"}, {"position": "PG"}, {"position": "Util"}]},
            {"status": "GTD"},
            {"status_full": "Game Time Decision"},
            {"injury_note": "Ankle"}
        ], {"ownership": {"ownership_type": "team", "owner_team_key": "428.l.41083.t.3"}}]})
    }

    #[test]
    fn test_transform_player() {
        let r = PlayerTransformer.transform(&raw_player());
        assert!(r.success(), "{:?}", r.errors());
        let p = r.data().unwrap();
        assert_eq!(p.player_key, "428.p.6014");
        assert_eq!(p.game_key.as_deref(), Some("428"));
        assert_eq!(p.full_name, "Stephen Curry");
        assert_eq!(p.last_name.as_deref(), Some("Curry"));
        assert_eq!(p.current_team_abbr.as_deref(), Some("GSW"));
        assert_eq!(p.positions, vec!["PG", "SG", "G", "Util"]);
        assert_eq!(p.status, PlayerStatus::DayToDay);
        assert!(p.is_undroppable);
        assert_eq!(p.headshot_url.as_deref(), Some("https://img/curry.png"));
        assert_eq!(p.owner_team_key.as_deref(), Some("428.l.41083.t.3"));
        assert!(p.is_eligible("util"));
    }

    #[test]
    fn test_bare_string_name_is_full_only() {
        let r = PlayerTransformer.transform(&json!({"player_key": "428.p.1", "name": "Nikola Jokic"}));
        let p = r.data().unwrap();
        assert_eq!(p.full_name, "Nikola Jokic");
        assert!(p.first_name.is_none());
        assert!(p.last_name.is_none());
        assert_eq!(p.status, PlayerStatus::Active);
    }

    #[test]
    fn test_positions_fall_back_to_display_position() {
        let r = PlayerTransformer.transform(&json!({"player_key": "428.p.2", "name": "X", "display_position": "SF,PF"}));
        assert_eq!(r.data().unwrap().positions, vec!["SF", "PF"]);
    }

    #[test]
    fn test_missing_player_key() {
        let r = PlayerTransformer.transform(&json!({"player": [[{"player_id": "9"}]]}));
        assert!(!r.success());
        assert!(r.errors().iter().any(|e| e.is_on("player_key")));
    }
}
