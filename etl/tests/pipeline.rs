//! End-to-end runs over recorded API responses.

use fantasy_etl::{
    to_csv_string, Coordinate, EntityType, EtlConfig, MatchupTransformer, MemorySink, OwnerKind, Pipeline,
    PipelineError, RejectPolicy, SnapshotContext, SnapshotTransformer, Stage, StandingsTransformer, StatSnapshot,
    StatTable, TransactionRole, TransactionTransformer, Validator, LOG_BROADCASTER,
};
use serde_json::{json, Value};
use std::path::PathBuf;

fn fixture(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    let content = std::fs::read_to_string(&path).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn config() -> EtlConfig {
    EtlConfig::from_json_str(r#"{"rules": {"reference_year": 2024}}"#).unwrap()
}

fn daily_players() -> SnapshotTransformer {
    SnapshotTransformer::new(OwnerKind::Player, StatTable::standard(), SnapshotContext::season("2024"))
}

#[test]
fn test_daily_player_stats_end_to_end() {
    LOG_BROADCASTER.set_echo(false);
    let pipeline = Pipeline::new(&config());
    let report = pipeline.run_envelope(&daily_players(), &fixture("player_stats_daily.json")).unwrap();

    assert_eq!(report.entity, EntityType::StatSnapshot);
    assert_eq!(report.total(), 4);
    assert_eq!(report.accepted.len(), 2);

    let rejected: Vec<(usize, Stage)> = report.rejected.iter().map(|r| (r.index, r.stage)).collect();
    assert_eq!(rejected, vec![(1, Stage::Validation), (2, Stage::Transform)]);
    assert!(report.rejected[0].errors.iter().any(|e| e.is_on("field_goals_made")));
    assert_eq!(report.rejected[0].key.as_deref(), Some("428.p.5161"));

    let curry = &report.accepted[0];
    assert_eq!(curry.owner.key, "428.p.6014");
    assert!(matches!(curry.coordinate, Coordinate::Daily { .. }));
    assert_eq!(curry.stats.field_goals_made, Some(11));
    assert_eq!(curry.stats.field_goal_percentage, Some(55.0));
    assert_eq!(curry.stats.free_throw_percentage, Some(100.0));
    assert_eq!(curry.stats.points, Some(32));
    assert_eq!(curry.points_total, Some(48.5));
    assert_eq!(report.validation_summary.duplicates, 1);

    let quality = report.quality.as_ref().unwrap();
    assert_eq!(quality.total, 3);
    assert_eq!(quality.duplicates, 1);
    assert!(quality.accuracy_score < 100.0);
    assert!(quality.overall_score > 0.0);

    // The later snapshot for the same player and day is a correction
    let mut sink: MemorySink<StatSnapshot> = MemorySink::new();
    assert_eq!(pipeline.persist(&report, &mut sink).unwrap(), 2);
    assert_eq!(sink.replaced(), 1);
    let stored = sink.into_records();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].stats.points, Some(34));
}

#[test]
fn test_block_batch_from_config() {
    let config = EtlConfig::from_json_str(r#"{"rules": {"reference_year": 2024}, "pipeline": {"policy": "block_batch"}}"#)
        .unwrap();
    assert_eq!(config.pipeline.policy, RejectPolicy::BlockBatch);

    let pipeline = Pipeline::new(&config);
    let report = pipeline.run_envelope(&daily_players(), &fixture("player_stats_daily.json")).unwrap();
    assert!(report.blocked);
    assert_eq!(report.accepted.len(), 2);

    let mut sink: MemorySink<StatSnapshot> = MemorySink::new();
    let err = pipeline.persist(&report, &mut sink).unwrap_err();
    assert!(matches!(err, PipelineError::Blocked { rejected: 2, total: 4 }));
    assert!(sink.is_empty());
}

#[test]
fn test_transactions_to_csv() {
    let report = Pipeline::new(&config()).run_envelope(&TransactionTransformer, &fixture("transactions.json")).unwrap();
    assert_eq!(report.total(), 2);
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.rejected[0].index, 1);
    assert!(report.rejected[0].errors.iter().any(|e| e.is_on("type")));

    let tx = &report.accepted[0];
    assert_eq!(tx.league_key.as_deref(), Some("428.l.41083"));
    assert_eq!(tx.players_with_role(&TransactionRole::Added).count(), 1);
    assert_eq!(tx.players_with_role(&TransactionRole::Dropped).count(), 1);

    let csv = to_csv_string(&report.accepted).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains("428.p.6512"));
    assert!(lines[2].contains("waivers"));
}

#[test]
fn test_scoreboard_matchups() {
    let transformer = MatchupTransformer::default().with_season("2024");
    let report = Pipeline::new(&config()).run_envelope(&transformer, &fixture("scoreboard.json")).unwrap();
    assert!(report.rejected.is_empty(), "{:?}", report.rejected);
    assert_eq!(report.accepted.len(), 1);

    let matchup = &report.accepted[0];
    assert_eq!(matchup.week, 3);
    assert_eq!(matchup.teams.len(), 2);
    assert_eq!(matchup.category_wins("428.l.41083.t.3"), 2);
    assert_eq!(matchup.category_wins("428.l.41083.t.8"), 1);
    let stats = matchup.teams[1].stats.as_ref().unwrap();
    assert_eq!(stats.coordinate, Coordinate::Weekly { season: "2024".into(), week: 3 });
    assert_eq!(stats.stats.rebounds, Some(181));

    let csv = to_csv_string(&report.accepted).unwrap();
    assert_eq!(csv.lines().count(), 3);
}

#[test]
fn test_matchups_without_season_keep_pairing() {
    let report = Pipeline::new(&config())
        .run_envelope(&MatchupTransformer::default(), &fixture("scoreboard.json"))
        .unwrap();
    assert_eq!(report.accepted.len(), 1);
    assert!(report.accepted[0].teams.iter().all(|t| t.stats.is_none()));
    assert!(report.transform_summary.warning_count >= 2);
}

#[test]
fn test_accepted_records_validate_after_reload() {
    let report = Pipeline::new(&config()).run_envelope(&daily_players(), &fixture("player_stats_daily.json")).unwrap();
    let json = serde_json::to_value(&report.accepted).unwrap();
    let Value::Array(values) = json else { panic!("expected an array") };

    let validator = Validator::new(config().rules);
    let results = validator.validate_values(&values, EntityType::StatSnapshot);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.is_valid()), "{:?}", results);
    assert!(!results[0].duplicate);
    assert!(results[1].duplicate);
}

fn standing(key: &str, wins: &str, losses: &str, pct: &str) -> Value {
    json!({"team": [
        [{"team_key": key}, {"name": format!("Team {}", key)}],
        {"team_standings": {
            "rank": 1,
            "outcome_totals": {"wins": wins, "losses": losses, "ties": 0, "percentage": pct}
        }}
    ]})
}

#[test]
fn test_extreme_standings_do_not_sink_siblings() {
    let good = standing("428.l.41083.t.3", "50", "29", ".633");
    let huge = standing("428.l.41083.t.4", "4000000000", "4000000000", ".500");
    let keyless = json!({"team": [[{"name": "Ghost"}]]});

    let report = Pipeline::new(&config()).run_batch(&StandingsTransformer, &[&good, &huge, &keyless]);
    assert_eq!(report.total(), 3);
    assert_eq!(report.accepted.len(), 2);
    assert_eq!(report.accepted[1].wins, 4_000_000_000);
    assert_eq!(report.accepted[1].games_played(), 8_000_000_000);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!((report.rejected[0].index, report.rejected[0].stage), (2, Stage::Transform));
    assert_eq!(report.quality.as_ref().unwrap().accuracy_score, 100.0);
}

#[test]
fn test_raw_standing_at_u32_max_validates() {
    let value = json!({"team_key": "428.l.1.t.1", "wins": u32::MAX, "losses": 1, "ties": 0, "percentage": 0.5});
    let result = Validator::new(config().rules).validate_value(&value, EntityType::Standing);
    assert!(result.is_valid(), "{:?}", result.errors());
}

#[test]
fn test_corrupt_container_count_is_bounded() {
    let mut envelope = fixture("transactions.json");
    envelope["fantasy_content"]["league"][1]["transactions"]["count"] = json!("100000000000");

    let report = Pipeline::new(&config()).run_envelope(&TransactionTransformer, &envelope).unwrap();
    assert_eq!(report.total(), 2);
    assert_eq!(report.accepted.len(), 1);
}
