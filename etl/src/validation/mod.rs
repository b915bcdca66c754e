//! Rule-based validation of canonical records.
//!
//! Validation never fails: every record yields a [`ValidationResult`] whose
//! errors block persistence and whose warnings and info notes do not.
//!
//! | rule                         | severity |
//! |------------------------------|----------|
//! | required field missing       | error    |
//! | malformed natural key        | error    |
//! | made > attempted             | error    |
//! | value outside plausible range| warning  |
//! | percentage vs made/attempted | warning  |
//! | unknown position code        | warning  |
//! | duplicate within a batch     | warning  |
//! | optional field absent        | info     |
//!
//! # Example
//!
//! ```rust,ignore
//! use fantasy_etl::{Validator, ValidationRules, EntityType};
//!
//! let validator = Validator::new(ValidationRules::default());
//! let result = validator.validate_value(&record_json, EntityType::Team);
//! assert!(result.is_valid());
//! ```

pub mod entities;
pub mod quality;
pub mod rules;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use crate::models::{
    EntityType, Granularity, League, Matchup, Player, RosterDay, RosterEntry, StatLine, StatSnapshot, Team,
    TeamStanding, Transaction,
};
use crate::result::{panic_message, Issue, ValidationResult};

pub use entities::check_stat_line;
pub use quality::{FieldCompleteness, QualityLevel, QualityReport, StatOutlier};
pub use rules::{KeyKind, ValidationRules};

/// A record the validator knows how to check.
pub trait Validate {
    const ENTITY: EntityType;

    /// Identity used for duplicate detection within a batch.
    fn uniqueness_key(&self) -> String;

    /// Natural key reported alongside the result.
    fn record_key(&self) -> Option<String> {
        Some(self.uniqueness_key())
    }

    fn check(&self, rules: &ValidationRules, out: &mut ValidationResult);

    /// Stat line compared across a batch for outliers, with its granularity.
    fn stat_line(&self) -> Option<(Granularity, &StatLine)> {
        None
    }
}

/// Applies [`ValidationRules`] to records and batches.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    rules: ValidationRules,
}

impl Validator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    pub fn validate<R: Validate>(&self, record: &R) -> ValidationResult {
        let mut out = ValidationResult::new(R::ENTITY, record.record_key());
        record.check(&self.rules, &mut out);
        out
    }

    /// Validate in order. Every occurrence of a uniqueness key after the
    /// first is flagged as a duplicate.
    ///
    /// A record whose checks panic gets an error result at its position; the
    /// rest of the batch is still validated.
    pub fn validate_batch<'a, R, I>(&self, records: I) -> Vec<ValidationResult>
    where
        R: Validate + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let mut seen = DuplicateTracker::default();
        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let checked = panic::catch_unwind(AssertUnwindSafe(|| {
                    (self.validate(record), record.uniqueness_key())
                }));
                match checked {
                    Ok((mut out, key)) => {
                        seen.observe(index, key, &mut out);
                        out
                    }
                    Err(payload) => aborted(R::ENTITY, index, payload.as_ref()),
                }
            })
            .collect()
    }

    /// Validate a serialized record of the given entity type.
    ///
    /// Required fields are checked on the raw JSON first so a missing field
    /// is reported by name rather than as a shape mismatch.
    pub fn validate_value(&self, value: &Value, entity: EntityType) -> ValidationResult {
        self.isolated_value(value, entity, 0).0
    }

    /// [`Validator::validate_value`] over a batch, with duplicate detection.
    pub fn validate_values(&self, values: &[Value], entity: EntityType) -> Vec<ValidationResult> {
        let mut seen = DuplicateTracker::default();
        values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let (mut out, key) = self.isolated_value(value, entity, index);
                if let Some(key) = key {
                    seen.observe(index, key, &mut out);
                }
                out
            })
            .collect()
    }

    fn isolated_value(&self, value: &Value, entity: EntityType, index: usize) -> (ValidationResult, Option<String>) {
        match panic::catch_unwind(AssertUnwindSafe(|| self.check_value(value, entity))) {
            Ok(checked) => checked,
            Err(payload) => (aborted(entity, index, payload.as_ref()), None),
        }
    }

    fn check_value(&self, value: &Value, entity: EntityType) -> (ValidationResult, Option<String>) {
        let missing = missing_required(value, entity);
        if !missing.is_empty() {
            let key = entity.required_fields().first().and_then(|f| value.get(*f)).and_then(scalar_text);
            let mut out = ValidationResult::new(entity, key);
            out.extend(missing);
            return (out, None);
        }
        match entity {
            EntityType::League => self.typed::<League>(value),
            EntityType::Team => self.typed::<Team>(value),
            EntityType::Player => self.typed::<Player>(value),
            EntityType::StatSnapshot => self.typed::<StatSnapshot>(value),
            EntityType::RosterEntry => self.typed::<RosterEntry>(value),
            EntityType::RosterDay => self.typed::<RosterDay>(value),
            EntityType::Transaction => self.typed::<Transaction>(value),
            EntityType::Matchup => self.typed::<Matchup>(value),
            EntityType::Standing => self.typed::<TeamStanding>(value),
        }
    }

    fn typed<R: Validate + DeserializeOwned>(&self, value: &Value) -> (ValidationResult, Option<String>) {
        match serde_json::from_value::<R>(value.clone()) {
            Ok(record) => (self.validate(&record), Some(record.uniqueness_key())),
            Err(e) => {
                let mut out = ValidationResult::new(R::ENTITY, None);
                out.push(Issue::structural(format!("record is not a valid {}: {}", R::ENTITY, e)));
                (out, None)
            }
        }
    }
}

fn aborted(entity: EntityType, index: usize, payload: &(dyn std::any::Any + Send)) -> ValidationResult {
    let mut out = ValidationResult::new(entity, None);
    out.push(Issue::structural(format!("validator aborted on record {}: {}", index, panic_message(payload))));
    out
}

#[derive(Default)]
struct DuplicateTracker {
    first_seen: HashMap<String, usize>,
}

impl DuplicateTracker {
    fn observe(&mut self, index: usize, key: String, out: &mut ValidationResult) {
        match self.first_seen.get(&key) {
            Some(first) => {
                out.duplicate = true;
                out.push(Issue::duplicate(format!("duplicate of record {} ({})", first, key)));
            }
            None => {
                self.first_seen.insert(key, index);
            }
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn missing_required(value: &Value, entity: EntityType) -> Vec<Issue> {
    let Some(map) = value.as_object() else {
        return vec![Issue::structural(format!("{} record is not an object", entity))];
    };
    let mut issues: Vec<Issue> = entity
        .required_fields()
        .iter()
        .filter(|field| match map.get(**field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            _ => false,
        })
        .map(|field| Issue::structural(format!("required field '{}' is missing", field)).on(*field))
        .collect();
    if entity == EntityType::StatSnapshot && !map.contains_key("player_key") && !map.contains_key("team_key") {
        issues.push(Issue::structural("snapshot has no owner key").on("player_key"));
    }
    issues
}

// =============================================================================
// Rule helpers
// =============================================================================

/// Blank text in a required field is an error.
pub(crate) fn require_text(out: &mut ValidationResult, field: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        out.push(Issue::structural(format!("required field '{}' is empty", field)).on(field));
        false
    } else {
        true
    }
}

pub(crate) fn check_key(out: &mut ValidationResult, field: &str, key: &str, kind: KeyKind) {
    if !key.trim().is_empty() && !kind.matches(key) {
        out.push(
            Issue::rule_error(format!("'{}' is not a valid {} key", key, kind.label()))
                .on(field)
                .with_value(Value::String(key.to_string())),
        );
    }
}

/// Warn when `value` falls outside `min..=max`.
pub(crate) fn check_range(out: &mut ValidationResult, field: &str, value: f64, min: f64, max: f64) {
    if value < min || value > max {
        out.push(Issue::rule_warning(format!("{} = {} is outside {}..={}", field, value, min, max)).on(field));
    }
}

pub(crate) fn note_missing<T>(out: &mut ValidationResult, field: &str, value: &Option<T>) {
    if value.is_none() {
        out.push(Issue::missing_optional(field));
    }
}

/// Run `check` against a scratch result and fold its issues in under `scope`.
pub(crate) fn scoped_check(
    out: &mut ValidationResult,
    scope: &str,
    check: impl FnOnce(&mut ValidationResult),
) {
    let mut inner = ValidationResult::new(out.entity, None);
    check(&mut inner);
    out.extend(inner.issues().cloned().map(|issue| issue.scoped(scope)));
}
