//! Fantasy ETL CLI - normalize and validate Yahoo Fantasy Basketball JSON
//!
//! # Main Commands
//!
//! ```bash
//! fantasy-etl transform player-stats stats.json --season 2024 --date 2024-11-02
//! fantasy-etl transform transactions tx.json --csv tx.csv
//! fantasy-etl validate player players.json
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! fantasy-etl stat-codes             # Show the stat code table
//! fantasy-etl decode-stat 9004003 7/10
//! ```
//!
//! Records go to stdout (or `-o`); progress and rejects go to stderr.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use fantasy_etl::export::CsvRow;
use fantasy_etl::extract::coerce::parse_date;
use fantasy_etl::logs::{log_error, log_info, log_success, log_warning, log_warning_indent};
use fantasy_etl::{
    EntityType, EtlConfig, LeagueTransformer, MatchupTransformer, MemorySink, OwnerKind, Pipeline,
    PlayerTransformer, RejectPolicy, RosterContext, RosterTransformer, SnapshotContext, SnapshotTransformer,
    StandingsTransformer, StatTable, TeamTransformer, TransactionTransformer, Transformer, Validate, Validator,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fantasy-etl")]
#[command(about = "Normalize and validate Yahoo Fantasy Basketball API responses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a raw API response into canonical records
    Transform {
        /// Kind of entity in the response
        entity: EntityArg,

        /// Input JSON file (decoded API response)
        input: PathBuf,

        /// Output file for accepted records (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write accepted records as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Season to use when the response omits it
        #[arg(long)]
        season: Option<String>,

        /// Date to use when the response omits it (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        /// Week to use for weekly snapshots
        #[arg(long)]
        week: Option<u32>,

        /// Configuration file (default: FANTASY_ETL_CONFIG)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Refuse the whole batch if any item is rejected
        #[arg(long)]
        block_batch: bool,
    },

    /// Validate canonical records read back from JSON
    Validate {
        /// Kind of record in the file
        entity: RecordArg,

        /// Input JSON file (array of records, or a single record)
        input: PathBuf,

        /// Configuration file (default: FANTASY_ETL_CONFIG)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show the stat code table
    StatCodes,

    /// Decode one raw stat value
    DecodeStat {
        /// Stat identifier (e.g. 9004003)
        id: String,

        /// Raw value (e.g. 7/10, .700, 21)
        value: String,
    },
}

/// Response kinds accepted by `transform`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum EntityArg {
    League,
    Teams,
    Players,
    PlayerStats,
    TeamStats,
    Roster,
    Transactions,
    Matchups,
    Standings,
}

/// Record kinds accepted by `validate`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum RecordArg {
    League,
    Team,
    Player,
    StatSnapshot,
    RosterEntry,
    RosterDay,
    Transaction,
    Matchup,
    Standing,
}

impl From<RecordArg> for EntityType {
    fn from(arg: RecordArg) -> Self {
        match arg {
            RecordArg::League => EntityType::League,
            RecordArg::Team => EntityType::Team,
            RecordArg::Player => EntityType::Player,
            RecordArg::StatSnapshot => EntityType::StatSnapshot,
            RecordArg::RosterEntry => EntityType::RosterEntry,
            RecordArg::RosterDay => EntityType::RosterDay,
            RecordArg::Transaction => EntityType::Transaction,
            RecordArg::Matchup => EntityType::Matchup,
            RecordArg::Standing => EntityType::Standing,
        }
    }
}

/// Where `transform` writes its results.
struct Outputs<'a> {
    json: Option<&'a Path>,
    csv: Option<&'a Path>,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Transform { entity, input, output, csv, season, date, week, config, block_batch } => {
            let context = SnapshotContext { season, date, week };
            let outputs = Outputs { json: output.as_deref(), csv: csv.as_deref() };
            cmd_transform(entity, &input, context, config.as_deref(), block_batch, outputs)
        }

        Commands::Validate { entity, input, config } => cmd_validate(entity.into(), &input, config.as_deref()),

        Commands::StatCodes => cmd_stat_codes(),

        Commands::DecodeStat { id, value } => cmd_decode_stat(&id, &value),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("'{}' is not a date (expected YYYY-MM-DD)", s))
}

fn load_config(path: Option<&Path>) -> Result<EtlConfig, Box<dyn std::error::Error>> {
    let config = EtlConfig::load(path)?;
    if let Some(path) = path {
        log_info(format!("Config: {}", path.display()));
    }
    Ok(config)
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn cmd_transform(
    entity: EntityArg,
    input: &Path,
    context: SnapshotContext,
    config_path: Option<&Path>,
    block_batch: bool,
    outputs: Outputs<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    log_info(format!("Processing: {}", input.display()));

    let mut config = load_config(config_path)?;
    if block_batch {
        config.pipeline.policy = RejectPolicy::BlockBatch;
    }
    let pipeline = Pipeline::new(&config);
    let envelope = read_json(input)?;

    match entity {
        EntityArg::League => run(&pipeline, &LeagueTransformer::default(), &envelope, outputs),
        EntityArg::Teams => run(&pipeline, &TeamTransformer, &envelope, outputs),
        EntityArg::Players => run(&pipeline, &PlayerTransformer, &envelope, outputs),
        EntityArg::PlayerStats => {
            let transformer = SnapshotTransformer::new(OwnerKind::Player, StatTable::standard(), context);
            run(&pipeline, &transformer, &envelope, outputs)
        }
        EntityArg::TeamStats => {
            let transformer = SnapshotTransformer::new(OwnerKind::Team, StatTable::standard(), context);
            run(&pipeline, &transformer, &envelope, outputs)
        }
        EntityArg::Roster => {
            let transformer = RosterTransformer::new(RosterContext { team_key: None, date: context.date });
            run(&pipeline, &transformer, &envelope, outputs)
        }
        EntityArg::Transactions => run(&pipeline, &TransactionTransformer, &envelope, outputs),
        EntityArg::Matchups => {
            let mut transformer = MatchupTransformer::default();
            if let Some(season) = context.season {
                transformer = transformer.with_season(season);
            }
            run(&pipeline, &transformer, &envelope, outputs)
        }
        EntityArg::Standings => run(&pipeline, &StandingsTransformer, &envelope, outputs),
    }
}

fn run<X>(
    pipeline: &Pipeline,
    transformer: &X,
    envelope: &Value,
    outputs: Outputs<'_>,
) -> Result<(), Box<dyn std::error::Error>>
where
    X: Transformer,
    X::Output: Validate + Serialize + CsvRow + Clone,
{
    let report = pipeline.run_envelope(transformer, envelope)?;

    for rejected in report.rejected.iter().take(10) {
        let key = rejected.key.as_deref().unwrap_or("<no key>");
        log_warning(format!("Item {} ({}) rejected at {:?}:", rejected.index, key, rejected.stage));
        for issue in rejected.errors.iter().take(3) {
            log_warning_indent(issue.to_string(), 1);
        }
    }
    if report.rejected.len() > 10 {
        log_warning(format!("... and {} more rejected", report.rejected.len() - 10));
    }

    if let Some(quality) = &report.quality {
        for outlier in quality.outliers.iter().take(5) {
            let key = outlier.key.as_deref().unwrap_or("<no key>");
            log_warning(format!(
                "Item {} ({}) {} = {} outside {:.1}..={:.1} for this batch",
                outlier.index, key, outlier.field, outlier.value, outlier.lower, outlier.upper
            ));
        }
        for field in quality.incomplete_fields.iter().take(5) {
            log_warning_indent(format!("{} filled in {:.0}% of records", field.field, field.ratio * 100.0), 1);
        }
    }

    // Distinct count after later records overwrite earlier ones
    let mut sink: MemorySink<X::Output> = MemorySink::new();
    pipeline.persist(&report, &mut sink)?;
    log_info(format!("{} distinct record(s)", sink.len()));

    if let Some(csv_path) = outputs.csv {
        let rows = fantasy_etl::write_csv_file(&report.accepted, csv_path)?;
        log_success(format!("CSV: {} row(s) written to {}", rows, csv_path.display()));
    }

    let json = serde_json::to_string_pretty(&report.accepted)?;
    write_output(&json, outputs.json)?;

    Ok(())
}

fn cmd_validate(entity: EntityType, input: &Path, config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    log_info(format!("Validating {}: {}", entity, input.display()));

    let config = load_config(config_path)?;
    let validator = Validator::new(config.rules);

    let records = match read_json(input)? {
        Value::Array(items) => items,
        single => vec![single],
    };
    let results = validator.validate_values(&records, entity);

    let mut invalid = 0;
    for (i, result) in results.iter().enumerate() {
        if result.is_valid() {
            continue;
        }
        invalid += 1;
        if invalid <= 5 {
            let key = result.record_key.as_deref().unwrap_or("<no key>");
            log_warning(format!("Record {} ({}) invalid:", i, key));
            for issue in result.errors().iter().take(3) {
                log_warning_indent(issue.to_string(), 1);
            }
        }
    }

    let summary = fantasy_etl::BatchSummary::from_validations(&results);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if invalid > 0 {
        log_error(format!("Results: {}", summary.summary()));
        std::process::exit(1);
    }

    log_success(format!("Results: {}", summary.summary()));
    Ok(())
}

fn cmd_stat_codes() -> Result<(), Box<dyn std::error::Error>> {
    let table = StatTable::standard();
    let rows: Vec<Value> = table
        .definitions()
        .map(|def| {
            json!({
                "stat_id": def.stat_id,
                "display_name": def.display_name,
                "strategy": def.decoder.strategy(),
                "fields": def.decoder.fields().iter().map(|f| f.name()).collect::<Vec<_>>(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn cmd_decode_stat(id: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let table = StatTable::standard();
    if !table.contains(id) {
        log_warning(format!("Stat id {} is not in the table", id));
    }
    let mut stats = serde_json::Map::new();
    stats.insert(id.to_string(), Value::from(value));
    let decoded = table.decode(&Value::Object(stats));
    for issue in &decoded.issues {
        log_warning(issue.to_string());
    }
    println!("{}", serde_json::to_string_pretty(&decoded.line)?);
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            log_success(format!("Saved to: {}", p.display()));
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
