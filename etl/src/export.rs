//! CSV export of accepted records.
//!
//! Each record type knows its column layout. Records that expand to several
//! rows (a roster day, a transaction's player lines, a matchup's two sides)
//! repeat the parent columns on every row.
//!
//! ```text
//! transaction_key,type,status,...,player_key,role,...
//! 428.l.41083.tr.212,add/drop,successful,...,428.p.6512,add,...
//! 428.l.41083.tr.212,add/drop,successful,...,428.p.5161,drop,...
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{ExportError, ExportResult};
use crate::models::{League, Matchup, Player, RosterDay, RosterEntry, StatSnapshot, Team, TeamStanding, Transaction};

/// A record that can be written as CSV rows.
pub trait CsvRow {
    fn csv_headers(&self) -> Vec<&'static str>;
    fn csv_rows(&self) -> Vec<Vec<String>>;
}

/// Render one JSON value as a CSV cell. Lists of scalars are `|`-joined.
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) if items.iter().all(|i| !i.is_object() && !i.is_array()) => {
            items.iter().map(|i| cell(Some(i))).collect::<Vec<_>>().join("|")
        }
        Some(other) => other.to_string(),
    }
}

fn as_map(record: &impl Serialize) -> Map<String, Value> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn row(map: &Map<String, Value>, headers: &[&str]) -> Vec<String> {
    headers.iter().map(|h| cell(map.get(*h))).collect()
}

// =============================================================================
// Layouts
// =============================================================================

const LEAGUE_COLUMNS: &[&str] = &[
    "league_key",
    "league_id",
    "game_key",
    "name",
    "season",
    "num_teams",
    "scoring_type",
    "league_type",
    "draft_status",
    "start_date",
    "end_date",
    "current_week",
    "start_week",
    "end_week",
    "is_finished",
    "url",
];

const TEAM_COLUMNS: &[&str] = &[
    "team_key",
    "team_id",
    "league_key",
    "name",
    "waiver_priority",
    "faab_balance",
    "number_of_moves",
    "number_of_trades",
    "roster_adds",
    "clinched_playoffs",
    "managers",
    "url",
    "logo_url",
];

const PLAYER_COLUMNS: &[&str] = &[
    "player_key",
    "player_id",
    "game_key",
    "full_name",
    "first_name",
    "last_name",
    "current_team_key",
    "current_team_abbr",
    "display_position",
    "positions",
    "status",
    "injury_note",
    "is_undroppable",
    "owner_team_key",
];

const ROSTER_COLUMNS: &[&str] = &[
    "team_key",
    "player_key",
    "date",
    "player_name",
    "selected_position",
    "is_starting",
    "is_bench",
    "is_injured_reserve",
    "eligible_positions",
    "status",
    "is_keeper",
    "keeper_cost",
    "kept",
];

const TRANSACTION_COLUMNS: &[&str] = &[
    "transaction_key",
    "type",
    "status",
    "timestamp",
    "faab_bid",
    "trader_team_key",
    "tradee_team_key",
    "player_key",
    "player_name",
    "role",
    "source_type",
    "source_team_key",
    "destination_type",
    "destination_team_key",
];

const MATCHUP_COLUMNS: &[&str] = &[
    "league_key",
    "week",
    "week_start",
    "week_end",
    "status",
    "is_playoffs",
    "is_consolation",
    "is_tied",
    "winner_team_key",
    "team_key",
    "name",
    "points_total",
    "projected_points",
    "category_wins",
];

const STANDING_COLUMNS: &[&str] = &[
    "team_key",
    "name",
    "rank",
    "playoff_seed",
    "wins",
    "losses",
    "ties",
    "percentage",
    "games_back",
    "points_for",
    "points_against",
];

macro_rules! flat_csv_row {
    ($ty:ty, $columns:expr) => {
        impl CsvRow for $ty {
            fn csv_headers(&self) -> Vec<&'static str> {
                $columns.to_vec()
            }

            fn csv_rows(&self) -> Vec<Vec<String>> {
                vec![row(&as_map(self), $columns)]
            }
        }
    };
}

flat_csv_row!(League, LEAGUE_COLUMNS);
flat_csv_row!(Player, PLAYER_COLUMNS);
flat_csv_row!(RosterEntry, ROSTER_COLUMNS);
flat_csv_row!(TeamStanding, STANDING_COLUMNS);

impl CsvRow for Team {
    fn csv_headers(&self) -> Vec<&'static str> {
        TEAM_COLUMNS.to_vec()
    }

    fn csv_rows(&self) -> Vec<Vec<String>> {
        let mut map = as_map(self);
        let nicknames: Vec<Value> =
            self.managers.iter().filter_map(|m| m.nickname.clone()).map(Value::String).collect();
        map.insert("managers".into(), Value::Array(nicknames));
        vec![row(&map, TEAM_COLUMNS)]
    }
}

impl CsvRow for StatSnapshot {
    fn csv_headers(&self) -> Vec<&'static str> {
        StatSnapshot::columns(self.granularity(), self.owner.kind)
    }

    fn csv_rows(&self) -> Vec<Vec<String>> {
        vec![row(&as_map(self), &self.csv_headers())]
    }
}

impl CsvRow for RosterDay {
    fn csv_headers(&self) -> Vec<&'static str> {
        ROSTER_COLUMNS.to_vec()
    }

    fn csv_rows(&self) -> Vec<Vec<String>> {
        self.entries.iter().flat_map(|e| e.csv_rows()).collect()
    }
}

impl CsvRow for Transaction {
    fn csv_headers(&self) -> Vec<&'static str> {
        TRANSACTION_COLUMNS.to_vec()
    }

    fn csv_rows(&self) -> Vec<Vec<String>> {
        let parent = as_map(self);
        if self.players.is_empty() {
            return vec![row(&parent, TRANSACTION_COLUMNS)];
        }
        self.players
            .iter()
            .map(|player| {
                let mut map = parent.clone();
                map.extend(as_map(player));
                row(&map, TRANSACTION_COLUMNS)
            })
            .collect()
    }
}

impl CsvRow for Matchup {
    fn csv_headers(&self) -> Vec<&'static str> {
        MATCHUP_COLUMNS.to_vec()
    }

    fn csv_rows(&self) -> Vec<Vec<String>> {
        let mut parent = as_map(self);
        parent.remove("teams");
        self.teams
            .iter()
            .map(|team| {
                let mut map = parent.clone();
                map.extend(as_map(team));
                map.insert("category_wins".into(), Value::from(self.category_wins(&team.team_key)));
                row(&map, MATCHUP_COLUMNS)
            })
            .collect()
    }
}

// =============================================================================
// Writers
// =============================================================================

/// Write `records` with a single header line. Returns the number of data rows.
///
/// All records must share one layout; a snapshot batch mixing granularities
/// is rejected with [`ExportError::HeaderMismatch`].
pub fn write_csv<R: CsvRow, W: Write>(records: &[R], writer: W) -> ExportResult<usize> {
    let Some(first) = records.first() else {
        return Ok(0);
    };
    let headers = first.csv_headers();
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&headers)?;

    let mut rows = 0;
    for (index, record) in records.iter().enumerate() {
        let found = record.csv_headers();
        if found != headers {
            return Err(ExportError::HeaderMismatch {
                index,
                expected: headers.join(","),
                found: found.join(","),
            });
        }
        for cells in record.csv_rows() {
            out.write_record(&cells)?;
            rows += 1;
        }
    }
    out.flush()?;
    Ok(rows)
}

pub fn to_csv_string<R: CsvRow>(records: &[R]) -> ExportResult<String> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| ExportError::Finish(e.to_string()))
}

pub fn write_csv_file<R: CsvRow>(records: &[R], path: &Path) -> ExportResult<usize> {
    let file = File::create(path)?;
    write_csv(records, file)
}
