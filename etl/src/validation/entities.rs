//! [`Validate`] implementations for every canonical record.

use std::collections::HashSet;

use super::rules::{KeyKind, ValidationRules};
use super::{check_key, check_range, note_missing, require_text, scoped_check, Validate};
use crate::models::{
    Coordinate, EntityType, Granularity, League, Matchup, OwnerKind, Player, RosterDay, RosterEntry, RosterSlot,
    ScoringType, StatLine, StatSnapshot, Team, TeamStanding, Transaction, TransactionRole, TransactionStatus,
    TransactionType,
};
use crate::result::{Issue, ValidationResult};
use crate::stats::StatField;

/// Season text must be a four-digit year; plausibility is a warning.
fn check_season(rules: &ValidationRules, out: &mut ValidationResult, field: &str, season: &str) {
    let text = season.trim();
    let four_digits = text.len() == 4 && text.bytes().all(|b| b.is_ascii_digit());
    match text.parse::<i32>().ok().filter(|_| four_digits) {
        Some(year) => check_range(out, field, year as f64, rules.min_season as f64, rules.max_season() as f64),
        None => out.push(
            Issue::rule_error(format!("season '{}' is not a four-digit year", season))
                .on(field)
                .with_value(serde_json::Value::String(season.to_string())),
        ),
    }
}

fn check_positions<'a>(
    rules: &ValidationRules,
    out: &mut ValidationResult,
    field: &str,
    positions: impl IntoIterator<Item = &'a String>,
) {
    for position in positions {
        if !rules.is_valid_position(position) {
            out.push(Issue::rule_warning(format!("unknown position code '{}'", position)).on(field));
        }
    }
}

// =============================================================================
// Stat lines
// =============================================================================

/// Range, consistency and made/attempted checks on one stat line.
pub fn check_stat_line(
    rules: &ValidationRules,
    out: &mut ValidationResult,
    line: &StatLine,
    granularity: Granularity,
    owner: OwnerKind,
) {
    for field in StatField::ALL {
        let Some(value) = line.get(field) else { continue };
        if field.is_percentage() {
            check_range(out, field.name(), value, 0.0, 100.0);
        } else if let Some(max) = rules.bound_for(field, granularity, owner) {
            check_range(out, field.name(), value, 0.0, max);
        }
    }

    let pairs = [
        (StatField::FieldGoalsMade, StatField::FieldGoalsAttempted, StatField::FieldGoalPercentage),
        (StatField::FreeThrowsMade, StatField::FreeThrowsAttempted, StatField::FreeThrowPercentage),
    ];
    for (made_field, attempted_field, pct_field) in pairs {
        let (Some(made), Some(attempted)) = (line.get(made_field), line.get(attempted_field)) else {
            continue;
        };
        if made > attempted {
            out.push(
                Issue::rule_error(format!("{} made exceeds {} attempted", made, attempted)).on(made_field.name()),
            );
            continue;
        }
        if let Some(reported) = line.get(pct_field) {
            if attempted > 0.0 {
                let computed = made / attempted * 100.0;
                if (reported - computed).abs() > rules.pct_tolerance {
                    out.push(
                        Issue::rule_warning(format!(
                            "reported {:.1} differs from computed {:.1} by more than {}",
                            reported, computed, rules.pct_tolerance
                        ))
                        .on(pct_field.name()),
                    );
                }
            }
        }
    }
}

// =============================================================================
// League, team, player
// =============================================================================

impl Validate for League {
    const ENTITY: EntityType = EntityType::League;

    fn uniqueness_key(&self) -> String {
        self.league_key.clone()
    }

    fn check(&self, rules: &ValidationRules, out: &mut ValidationResult) {
        if require_text(out, "league_key", &self.league_key) {
            check_key(out, "league_key", &self.league_key, KeyKind::League);
        }
        require_text(out, "name", &self.name);
        if require_text(out, "season", &self.season) {
            check_season(rules, out, "season", &self.season);
        }
        if let Some(game_key) = &self.game_key {
            check_key(out, "game_key", game_key, KeyKind::Game);
        }

        match self.num_teams {
            Some(n) => check_range(out, "num_teams", n as f64, rules.min_teams as f64, rules.max_teams as f64),
            None => note_missing(out, "num_teams", &self.num_teams),
        }
        if let Some(scoring) = &self.scoring_type {
            if matches!(scoring, ScoringType::Other(_))
                || !rules.valid_scoring_types.iter().any(|s| s == scoring.as_str())
            {
                out.push(
                    Issue::rule_warning(format!("unknown scoring type '{}'", scoring.as_str())).on("scoring_type"),
                );
            }
        } else {
            note_missing(out, "scoring_type", &self.scoring_type);
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                out.push(Issue::rule_warning("start_date is after end_date").on("start_date"));
            }
        }
        if let (Some(start), Some(end)) = (self.start_week, self.end_week) {
            if start > end {
                out.push(Issue::rule_warning("start_week is after end_week").on("start_week"));
            }
            if let Some(current) = self.current_week {
                check_range(out, "current_week", current as f64, start as f64, end as f64);
            }
        }
        note_missing(out, "start_date", &self.start_date);
        note_missing(out, "end_date", &self.end_date);

        if let Some(settings) = &self.settings {
            if let (Some(max), Some(n)) = (settings.max_teams, self.num_teams) {
                if n > max {
                    out.push(Issue::rule_warning(format!("{} teams exceed max_teams {}", n, max)).on("num_teams"));
                }
            }
            let mut seen = HashSet::new();
            for (i, category) in settings.stat_categories.iter().enumerate() {
                if !seen.insert(category.stat_id.as_str()) {
                    out.push(
                        Issue::duplicate(format!("stat category {} listed twice", category.stat_id))
                            .on(format!("settings.stat_categories[{}]", i)),
                    );
                }
            }
        }
    }
}

impl Validate for Team {
    const ENTITY: EntityType = EntityType::Team;

    fn uniqueness_key(&self) -> String {
        self.team_key.clone()
    }

    fn check(&self, rules: &ValidationRules, out: &mut ValidationResult) {
        if require_text(out, "team_key", &self.team_key) {
            check_key(out, "team_key", &self.team_key, KeyKind::Team);
            if let Some(league_key) = &self.league_key {
                if !self.team_key.starts_with(&format!("{}.t.", league_key)) {
                    out.push(
                        Issue::rule_warning(format!("team key is not scoped under league {}", league_key))
                            .on("league_key"),
                    );
                }
            }
        }
        require_text(out, "name", &self.name);

        if self.managers.is_empty() {
            out.push(Issue::rule_error("team has no managers").on("managers"));
        } else if self.managers.len() > rules.max_managers {
            out.push(
                Issue::rule_warning(format!("{} managers exceed {}", self.managers.len(), rules.max_managers))
                    .on("managers"),
            );
        }
        for (i, manager) in self.managers.iter().enumerate() {
            if manager.guid.is_none() {
                out.push(Issue::missing_optional(format!("managers[{}].guid", i)));
            }
        }

        if let Some(trades) = self.number_of_trades {
            check_range(out, "number_of_trades", trades as f64, 0.0, rules.max_trades as f64);
        }
        if let Some(faab) = self.faab_balance {
            if faab < 0 {
                out.push(Issue::rule_warning(format!("negative FAAB balance {}", faab)).on("faab_balance"));
            }
        }
        note_missing(out, "url", &self.url);
    }
}

impl Validate for Player {
    const ENTITY: EntityType = EntityType::Player;

    fn uniqueness_key(&self) -> String {
        self.player_key.clone()
    }

    fn check(&self, rules: &ValidationRules, out: &mut ValidationResult) {
        if require_text(out, "player_key", &self.player_key) {
            check_key(out, "player_key", &self.player_key, KeyKind::Player);
        }
        require_text(out, "full_name", &self.full_name);
        if let Some(game_key) = &self.game_key {
            check_key(out, "game_key", game_key, KeyKind::Game);
        }
        check_positions(rules, out, "positions", &self.positions);
        if self.positions.is_empty() {
            out.push(Issue::rule_warning("player has no eligible positions").on("positions"));
        }
        note_missing(out, "current_team_key", &self.current_team_key);
        note_missing(out, "display_position", &self.display_position);
    }
}

// =============================================================================
// Snapshots and rosters
// =============================================================================

impl Validate for StatSnapshot {
    const ENTITY: EntityType = EntityType::StatSnapshot;

    fn uniqueness_key(&self) -> String {
        StatSnapshot::uniqueness_key(self)
    }

    fn record_key(&self) -> Option<String> {
        Some(self.owner.key.clone())
    }

    fn stat_line(&self) -> Option<(Granularity, &StatLine)> {
        Some((self.granularity(), &self.stats))
    }

    fn check(&self, rules: &ValidationRules, out: &mut ValidationResult) {
        let key_field = self.owner.kind.key_field();
        if require_text(out, key_field, &self.owner.key) {
            check_key(out, key_field, &self.owner.key, KeyKind::for_owner(self.owner.kind));
        }

        match &self.coordinate {
            Coordinate::Daily { season, .. } => {
                if let Some(season) = season {
                    check_season(rules, out, "season", season);
                }
            }
            Coordinate::Weekly { season, week } => {
                if require_text(out, "season", season) {
                    check_season(rules, out, "season", season);
                }
                if *week == 0 {
                    out.push(Issue::rule_warning("week numbers start at 1").on("week"));
                }
            }
            Coordinate::Season { season } => {
                if require_text(out, "season", season) {
                    check_season(rules, out, "season", season);
                }
            }
        }

        if self.stats.is_empty() {
            out.push(Issue::missing_optional("stats"));
        }
        check_stat_line(rules, out, &self.stats, self.granularity(), self.owner.kind);
    }
}

impl Validate for RosterEntry {
    const ENTITY: EntityType = EntityType::RosterEntry;

    fn uniqueness_key(&self) -> String {
        RosterEntry::uniqueness_key(self)
    }

    fn check(&self, rules: &ValidationRules, out: &mut ValidationResult) {
        if require_text(out, "team_key", &self.team_key) {
            check_key(out, "team_key", &self.team_key, KeyKind::Team);
        }
        if require_text(out, "player_key", &self.player_key) {
            check_key(out, "player_key", &self.player_key, KeyKind::Player);
        }

        match &self.selected_position {
            Some(position) => {
                if !rules.is_valid_position(position) {
                    out.push(
                        Issue::rule_warning(format!("unknown position code '{}'", position)).on("selected_position"),
                    );
                }
                let expected = RosterSlot::from_position(position);
                if self.slot() != Some(expected) {
                    out.push(
                        Issue::rule_error(format!("slot flags disagree with selected position '{}'", position))
                            .on("is_starting"),
                    );
                }
            }
            None => {
                if self.is_starting || self.is_bench || self.is_injured_reserve {
                    out.push(Issue::rule_error("slot flag set without a selected position").on("is_starting"));
                }
                note_missing(out, "selected_position", &self.selected_position);
            }
        }
        check_positions(rules, out, "eligible_positions", &self.eligible_positions);

        if let Some(cost) = self.keeper_cost {
            if cost < 0 {
                out.push(Issue::rule_warning(format!("negative keeper cost {}", cost)).on("keeper_cost"));
            }
            if !self.is_keeper {
                out.push(Issue::rule_warning("keeper cost on a non-keeper").on("keeper_cost"));
            }
        }
    }
}

impl Validate for RosterDay {
    const ENTITY: EntityType = EntityType::RosterDay;

    fn uniqueness_key(&self) -> String {
        RosterDay::uniqueness_key(self)
    }

    fn check(&self, rules: &ValidationRules, out: &mut ValidationResult) {
        if require_text(out, "team_key", &self.team_key) {
            check_key(out, "team_key", &self.team_key, KeyKind::Team);
        }
        if self.entries.is_empty() {
            out.push(Issue::missing_optional("entries"));
        }

        let mut players = HashSet::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let scope = format!("entries[{}]", i);
            scoped_check(out, &scope, |inner| {
                entry.check(rules, inner);
                if entry.team_key != self.team_key {
                    inner.push(Issue::rule_error("entry belongs to another team").on("team_key"));
                }
                if entry.date != self.date {
                    inner.push(Issue::rule_error("entry is dated differently from its roster").on("date"));
                }
            });
            if !players.insert(entry.player_key.as_str()) {
                out.push(
                    Issue::duplicate(format!("player {} appears twice on the roster", entry.player_key))
                        .on(format!("{}.player_key", scope)),
                );
            }
        }
    }
}

// =============================================================================
// Transactions, matchups, standings
// =============================================================================

impl Validate for Transaction {
    const ENTITY: EntityType = EntityType::Transaction;

    fn uniqueness_key(&self) -> String {
        self.transaction_key.clone()
    }

    fn check(&self, _rules: &ValidationRules, out: &mut ValidationResult) {
        if require_text(out, "transaction_key", &self.transaction_key) {
            check_key(out, "transaction_key", &self.transaction_key, KeyKind::Transaction);
        }
        if let TransactionType::Other(kind) = &self.kind {
            out.push(Issue::rule_warning(format!("unknown transaction type '{}'", kind)).on("type"));
        }
        if let TransactionStatus::Other(status) = &self.status {
            out.push(Issue::rule_warning(format!("unknown transaction status '{}'", status)).on("status"));
        }
        note_missing(out, "timestamp", &self.timestamp);

        if let Some(bid) = self.faab_bid {
            if bid < 0 {
                out.push(Issue::rule_warning(format!("negative FAAB bid {}", bid)).on("faab_bid"));
            }
        }
        if self.kind == TransactionType::Trade {
            if self.trader_team_key.is_none() || self.tradee_team_key.is_none() {
                out.push(Issue::rule_warning("trade without both trading teams").on("trader_team_key"));
            }
            for (field, key) in [("trader_team_key", &self.trader_team_key), ("tradee_team_key", &self.tradee_team_key)]
            {
                if let Some(key) = key {
                    check_key(out, field, key, KeyKind::Team);
                }
            }
        }

        if self.players.is_empty() {
            out.push(Issue::rule_warning("transaction moves no players").on("players"));
        }
        for (i, player) in self.players.iter().enumerate() {
            let scope = format!("players[{}]", i);
            scoped_check(out, &scope, |inner| {
                check_key(inner, "player_key", &player.player_key, KeyKind::Player);
                for (field, key) in [
                    ("source_team_key", &player.source_team_key),
                    ("destination_team_key", &player.destination_team_key),
                ] {
                    if let Some(key) = key {
                        check_key(inner, field, key, KeyKind::Team);
                    }
                }
                if let TransactionRole::Other(role) = &player.role {
                    inner.push(Issue::rule_warning(format!("unknown player role '{}'", role)).on("role"));
                }
            });
        }
    }
}

impl Validate for Matchup {
    const ENTITY: EntityType = EntityType::Matchup;

    fn uniqueness_key(&self) -> String {
        Matchup::uniqueness_key(self)
    }

    fn check(&self, rules: &ValidationRules, out: &mut ValidationResult) {
        if self.week == 0 {
            out.push(Issue::rule_warning("week numbers start at 1").on("week"));
        }
        if self.teams.len() != 2 {
            out.push(Issue::rule_error(format!("matchup has {} teams, expected 2", self.teams.len())).on("teams"));
        }
        if let (Some(start), Some(end)) = (self.week_start, self.week_end) {
            if start > end {
                out.push(Issue::rule_warning("week_start is after week_end").on("week_start"));
            }
        }

        let keys: HashSet<&str> = self.teams.iter().map(|t| t.team_key.as_str()).collect();
        if keys.len() < self.teams.len() {
            out.push(Issue::rule_error("a team is paired with itself").on("teams"));
        }
        if let Some(winner) = &self.winner_team_key {
            if !keys.contains(winner.as_str()) {
                out.push(Issue::rule_warning(format!("winner {} is not in the matchup", winner)).on("winner_team_key"));
            }
            if self.is_tied {
                out.push(Issue::rule_warning("tied matchup names a winner").on("winner_team_key"));
            }
        }

        for (i, team) in self.teams.iter().enumerate() {
            let scope = format!("teams[{}]", i);
            scoped_check(out, &scope, |inner| {
                check_key(inner, "team_key", &team.team_key, KeyKind::Team);
                if let Some(points) = team.points_total {
                    if points < 0.0 {
                        inner.push(Issue::rule_warning(format!("negative points {}", points)).on("points_total"));
                    }
                }
                if let Some(stats) = &team.stats {
                    scoped_check(inner, "stats", |s| {
                        check_stat_line(rules, s, &stats.stats, stats.granularity(), stats.owner.kind);
                    });
                }
            });
        }

        for (i, winner) in self.stat_winners.iter().enumerate() {
            if let Some(key) = &winner.winner_team_key {
                if !keys.contains(key.as_str()) {
                    out.push(
                        Issue::rule_warning(format!("category winner {} is not in the matchup", key))
                            .on(format!("stat_winners[{}].winner_team_key", i)),
                    );
                }
            }
        }
    }
}

impl Validate for TeamStanding {
    const ENTITY: EntityType = EntityType::Standing;

    fn uniqueness_key(&self) -> String {
        self.team_key.clone()
    }

    fn check(&self, rules: &ValidationRules, out: &mut ValidationResult) {
        if require_text(out, "team_key", &self.team_key) {
            check_key(out, "team_key", &self.team_key, KeyKind::Team);
        }
        if self.rank == Some(0) {
            out.push(Issue::rule_warning("ranks start at 1").on("rank"));
        }
        if let Some(back) = self.games_back {
            if back < 0.0 {
                out.push(Issue::rule_warning(format!("negative games back {}", back)).on("games_back"));
            }
        }
        if let Some(pct) = self.percentage {
            check_range(out, "percentage", pct, 0.0, 1.0);
            if let Some(computed) = self.computed_percentage() {
                if (pct - computed).abs() * 100.0 > rules.pct_tolerance {
                    out.push(
                        Issue::rule_warning(format!("reported {:.3} differs from record {:.3}", pct, computed))
                            .on("percentage"),
                    );
                }
            }
        } else {
            note_missing(out, "percentage", &self.percentage);
        }
    }
}
