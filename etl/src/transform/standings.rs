use serde_json::Value;

use super::{entity_parts, Transformer};
use crate::extract::FieldReader;
use crate::models::{EntityType, TeamStanding};
use crate::result::TransformResult;

/// One team's row from a league standings response.
///
/// Standings teams carry three parts: the identity head, `team_points`
/// and `team_standings`. Record counts live under
/// `team_standings.outcome_totals`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandingsTransformer;

impl Transformer for StandingsTransformer {
    type Output = TeamStanding;
    const ENTITY: EntityType = EntityType::Standing;

    fn item_key(&self) -> &'static str {
        "team"
    }

    fn transform(&self, raw: &Value) -> TransformResult<TeamStanding> {
        let parts = match entity_parts(raw, self.item_key()) {
            Ok(parts) => parts,
            Err(issue) => return TransformResult::failed(issue),
        };
        let mut f = FieldReader::new(&parts);

        let Some(team_key) = f.natural_key("team_key") else {
            return TransformResult::from_issues(None, f.finish());
        };
        let name = f.text("name");

        let standings = f.group("team_standings").unwrap_or_default();
        let mut sf = FieldReader::over(&standings).scoped("team_standings");
        let totals = sf.group("outcome_totals").unwrap_or_default();
        let mut of = FieldReader::over(&totals).scoped("team_standings.outcome_totals");

        let points_for = sf.float("points_for").or_else(|| {
            let points = f.group("team_points")?;
            let mut pf = FieldReader::over(&points).scoped("team_points");
            let total = pf.float("total");
            f.absorb(pf.finish());
            total
        });

        let standing = TeamStanding {
            rank: sf.int_as("rank"),
            playoff_seed: sf.int_as("playoff_seed"),
            wins: of.int_as("wins").unwrap_or(0),
            losses: of.int_as("losses").unwrap_or(0),
            ties: of.int_as("ties").unwrap_or(0),
            percentage: of.float("percentage"),
            games_back: sf.float("games_back"),
            points_for,
            points_against: sf.float("points_against"),
            name,
            team_key,
        };
        if standings.is_empty() {
            f.warn("team_standings", "team has no standings block");
        }
        f.absorb(sf.finish());
        f.absorb(of.finish());
        TransformResult::from_issues(Some(standing), f.finish())
    }
}
