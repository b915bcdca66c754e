//! # Fantasy ETL - Yahoo Fantasy Basketball normalization and validation
//!
//! Turns decoded Yahoo Fantasy API responses (leagues, teams, players, stat
//! snapshots, rosters, transactions, matchups, standings) into flat canonical
//! records, then checks those records against structural and domain rules.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Yahoo JSON │────▶│   Extract   │────▶│  Transform  │────▶│  Validate   │
//! │  (decoded)  │     │ (shape/key) │     │  (records)  │     │  (rules)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                                    │
//!                                          ┌─────────────┐     ┌─────▼───────┐
//!                                          │  CSV / JSON │◀────│  Pipeline   │
//!                                          │   export    │     │ (sink/policy)│
//!                                          └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fantasy_etl::{EtlConfig, Pipeline, PlayerTransformer};
//!
//! let response: serde_json::Value = serde_json::from_str(&body)?;
//! let pipeline = Pipeline::new(&EtlConfig::load(None)?);
//! let report = pipeline.run_envelope(&PlayerTransformer, &response)?;
//! println!("{}", report.summary());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types for config, export, sinks and pipeline runs
//! - [`result`] - Issues and per-record result envelopes
//! - [`extract`] - Navigation of the upstream JSON shapes and coercion
//! - [`stats`] - Stat code table and composite value decoding
//! - [`models`] - Canonical record types
//! - [`transform`] - One transformer per entity kind
//! - [`validation`] - Rule checks for transformed or raw records
//! - [`pipeline`] - Batch runs, reject policy, persistence hand-off
//! - [`export`] - CSV output
//! - [`config`] - Rule and pipeline configuration
//! - [`logs`] - Progress log broadcasting

// Core modules
pub mod error;
pub mod result;

// Upstream shapes
pub mod extract;
pub mod stats;

// Records
pub mod models;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Orchestration
pub mod config;
pub mod logs;
pub mod pipeline;
pub mod sink;

// Output
pub mod export;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    ConfigResult,
    ExportError,
    ExportResult,
    PipelineError,
    PipelineResult,
    SinkError,
    SinkResult,
};

// =============================================================================
// Re-exports - Results
// =============================================================================

pub use result::{BatchSummary, Issue, IssueKind, Severity, TransformResult, ValidationResult};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Coordinate,
    EntityType,
    League,
    LeagueSettings,
    Manager,
    Matchup,
    MatchupTeam,
    OwnerKind,
    Player,
    PlayerStatus,
    RosterDay,
    RosterEntry,
    RosterSlot,
    ScoringType,
    SnapshotOwner,
    StatSnapshot,
    Team,
    TeamStanding,
    Transaction,
    TransactionPlayer,
    TransactionRole,
    TransactionStatus,
    TransactionType,
};

// =============================================================================
// Re-exports - Stats
// =============================================================================

pub use stats::{Decoder, Granularity, StatDefinition, StatField, StatLine, StatTable};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    LeagueTransformer,
    MatchupTransformer,
    PlayerTransformer,
    RosterContext,
    RosterTransformer,
    SnapshotContext,
    SnapshotTransformer,
    StandingsTransformer,
    TeamTransformer,
    TransactionTransformer,
    Transformer,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    FieldCompleteness,
    KeyKind,
    QualityLevel,
    QualityReport,
    StatOutlier,
    Validate,
    ValidationRules,
    Validator,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use config::EtlConfig;
pub use export::{to_csv_string, write_csv, write_csv_file, CsvRow};
pub use logs::{LogEntry, LogLevel, LOG_BROADCASTER};
pub use pipeline::{locate_items, Pipeline, PipelineOptions, PipelineReport, Rejected, RejectPolicy, Stage};
pub use sink::{MemorySink, RecordSink, Upsert};
