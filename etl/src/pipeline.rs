//! Batch pipeline: locate → transform → validate → accept or reject.
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌───────────┐    ┌──────────┐    ┌────────┐
//! │ envelope │───▶│  locate   │───▶│ transform │───▶│ validate │───▶│  sink  │
//! │  (JSON)  │    │ container │    │  (batch)  │    │ (batch)  │    │ upsert │
//! └──────────┘    └───────────┘    └───────────┘    └──────────┘    └────────┘
//!                                        │                │
//!                                        └──── rejected ◀─┘
//! ```
//!
//! Per-item failures never abort the batch. Under
//! [`RejectPolicy::BlockBatch`] a single rejection marks the whole report as
//! blocked and [`Pipeline::persist`] refuses it.
//!
//! # Example
//!
//! ```rust,ignore
//! use fantasy_etl::{Pipeline, EtlConfig, PlayerTransformer, MemorySink};
//!
//! let pipeline = Pipeline::new(&EtlConfig::default());
//! let report = pipeline.run_envelope(&PlayerTransformer, &response)?;
//! let mut sink = MemorySink::new();
//! pipeline.persist(&report, &mut sink)?;
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

use crate::config::EtlConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::extract::{count_mismatch, find_key, indexed_items};
use crate::logs::{log_error, log_info, log_success, log_warning, log_warning_indent};
use crate::models::EntityType;
use crate::result::{BatchSummary, Issue};
use crate::sink::{RecordSink, Upsert};
use crate::transform::Transformer;
use crate::validation::{QualityReport, Validate, Validator};

// =============================================================================
// Options
// =============================================================================

/// What a rejected item means for the rest of its batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectPolicy {
    /// Keep good records, report bad ones.
    #[default]
    DropInvalid,
    /// Refuse the whole batch when any item is rejected.
    BlockBatch,
}

impl FromStr for RejectPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "drop_invalid" | "drop" => Ok(RejectPolicy::DropInvalid),
            "block_batch" | "block" => Ok(RejectPolicy::BlockBatch),
            other => Err(format!("unknown reject policy '{}'", other)),
        }
    }
}

/// Options for a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub policy: RejectPolicy,

    /// Accept every successfully transformed record without validating it.
    pub skip_validation: bool,
}

// =============================================================================
// Report
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Transform,
    Validation,
}

/// An input item that did not make it into the accepted set.
#[derive(Debug, Clone, Serialize)]
pub struct Rejected {
    /// Position in the input batch.
    pub index: usize,
    pub stage: Stage,
    pub key: Option<String>,
    pub errors: Vec<Issue>,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport<T> {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub entity: EntityType,
    /// Accepted records in input order.
    pub accepted: Vec<T>,
    pub rejected: Vec<Rejected>,
    pub transform_summary: BatchSummary,
    pub validation_summary: BatchSummary,
    /// Batch quality over every transformed record, absent when validation
    /// was skipped.
    pub quality: Option<QualityReport>,
    pub blocked: bool,
}

impl<T> PipelineReport<T> {
    pub fn total(&self) -> usize {
        self.transform_summary.total
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "{}: {} accepted, {} rejected of {} ({} warnings){}",
            self.entity,
            self.accepted.len(),
            self.rejected.len(),
            self.total(),
            self.transform_summary.warning_count + self.validation_summary.warning_count,
            if self.blocked { ", batch blocked" } else { "" }
        )
    }
}

// =============================================================================
// Locating items
// =============================================================================

/// Plural container name for an item key (`player` → `players`).
pub fn container_for(item_key: &str) -> String {
    format!("{}s", item_key)
}

/// Find the entities to transform inside an upstream envelope.
///
/// - a top-level array is taken as the items themselves
/// - otherwise the first `container` found depth-first is expanded
/// - otherwise the first `item_key` found is a single item
pub fn locate_items<'a>(envelope: &'a Value, item_key: &str) -> PipelineResult<Vec<&'a Value>> {
    if envelope.is_array() {
        return Ok(indexed_items(envelope, item_key));
    }
    let container = container_for(item_key);
    if let Some(found) = find_key(envelope, &container) {
        if let Some((declared, present)) = count_mismatch(found) {
            log_warning(format!("'{}' declares count {} but holds {} entries", container, declared, present));
        }
        return Ok(indexed_items(found, item_key));
    }
    if let Some(single) = find_key(envelope, item_key) {
        return Ok(vec![single]);
    }
    Err(PipelineError::ContainerNotFound { container, item: item_key.to_string() })
}

// =============================================================================
// Pipeline
// =============================================================================

/// Runs transformer batches through validation under a reject policy.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    validator: Validator,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(config: &EtlConfig) -> Self {
        Self { validator: Validator::new(config.rules.clone()), options: config.pipeline.clone() }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Locate the items in `envelope` and run them.
    pub fn run_envelope<X>(&self, transformer: &X, envelope: &Value) -> PipelineResult<PipelineReport<X::Output>>
    where
        X: Transformer,
        X::Output: Validate + Serialize,
    {
        let items = locate_items(envelope, transformer.item_key())?;
        Ok(self.run_batch(transformer, &items))
    }

    pub fn run_batch<X>(&self, transformer: &X, items: &[&Value]) -> PipelineReport<X::Output>
    where
        X: Transformer,
        X::Output: Validate + Serialize,
    {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        log_info(format!("Run {}: {} {} item(s)", run_id, items.len(), X::ENTITY));

        let results = transformer.transform_batch(items.iter().copied());
        let transform_summary = BatchSummary::from_transforms(&results);

        let mut rejected = Vec::new();
        let mut transformed = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            if !result.success() {
                log_warning_indent(format!("item {} rejected: {}", index, first_message(result.errors())), 1);
                rejected.push(Rejected { index, stage: Stage::Transform, key: None, errors: result.errors().to_vec() });
                continue;
            }
            if let Some(record) = result.into_data() {
                transformed.push((index, record));
            }
        }

        let mut validation_summary = BatchSummary::default();
        let mut quality = None;
        let accepted = if self.options.skip_validation {
            transformed.into_iter().map(|(_, record)| record).collect()
        } else {
            let validations = self.validator.validate_batch(transformed.iter().map(|(_, record)| record));
            validation_summary = BatchSummary::from_validations(&validations);
            let assessed = QualityReport::assess(
                transformed.iter().zip(&validations).map(|((index, record), validation)| (*index, record, validation)),
                self.validator.rules(),
            );
            log_info(assessed.summary());
            quality = Some(assessed);
            let mut accepted = Vec::new();
            for ((index, record), validation) in transformed.into_iter().zip(validations) {
                if validation.is_valid() {
                    accepted.push(record);
                } else {
                    log_warning_indent(
                        format!("item {} invalid: {}", index, first_message(validation.errors())),
                        1,
                    );
                    rejected.push(Rejected {
                        index,
                        stage: Stage::Validation,
                        key: validation.record_key.clone(),
                        errors: validation.errors().to_vec(),
                    });
                }
            }
            accepted
        };
        rejected.sort_by_key(|r| r.index);

        let blocked = self.options.policy == RejectPolicy::BlockBatch && !rejected.is_empty();
        let report = PipelineReport {
            run_id,
            started_at,
            entity: X::ENTITY,
            accepted,
            rejected,
            transform_summary,
            validation_summary,
            quality,
            blocked,
        };
        if report.blocked {
            log_error(report.summary());
        } else if report.rejected.is_empty() {
            log_success(report.summary());
        } else {
            log_warning(report.summary());
        }
        report
    }

    /// Upsert the accepted records of a report. Returns how many were written.
    pub fn persist<T, S>(&self, report: &PipelineReport<T>, sink: &mut S) -> PipelineResult<usize>
    where
        T: Validate + Clone,
        S: RecordSink<T>,
    {
        if report.blocked {
            return Err(PipelineError::Blocked { rejected: report.rejected.len(), total: report.total() });
        }
        let mut replaced = 0;
        for record in &report.accepted {
            if sink.upsert(&record.uniqueness_key(), record.clone())? == Upsert::Replaced {
                replaced += 1;
            }
        }
        log_success(format!(
            "Persisted {} {} record(s), {} correction(s)",
            report.accepted.len(),
            report.entity,
            replaced
        ));
        Ok(report.accepted.len())
    }
}

fn first_message(issues: &[Issue]) -> String {
    issues.first().map(|i| i.to_string()).unwrap_or_default()
}
