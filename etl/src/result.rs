//! Result envelopes shared by transformers, the validator and the pipeline.
//!
//! ```text
//!   raw JSON ──▶ Transformer ──▶ TransformResult<T> ──▶ Validator ──▶ ValidationResult
//!                                      │                                   │
//!                                      └──────────── BatchSummary ◀────────┘
//! ```
//!
//! Both envelopes follow one rule: a result is successful (or valid) exactly
//! when its error list is empty. Warnings and info notes never change that.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;

use crate::models::EntityType;

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// =============================================================================
// Issues
// =============================================================================

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn is_blocking(self) -> bool {
        matches!(self, Severity::Error | Severity::Critical)
    }
}

/// Which stage of the engine produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Input shape was unusable (missing key, unknown coverage, wrong container).
    Structural,
    /// A scalar could not be coerced to its target type.
    Coercion,
    /// Range, format or cross-field rule.
    BusinessRule,
    /// Natural key already seen earlier in the batch.
    Duplicate,
    /// Optional data absent.
    Completeness,
}

/// One diagnostic attached to a field (or to the record as a whole).
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub struct Issue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    pub severity: Severity,
    pub kind: IssueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Issue {
    pub fn new(severity: Severity, kind: IssueKind, message: impl Into<String>) -> Self {
        Self { field: None, message: message.into(), severity, kind, value: None }
    }

    /// Blocking structural problem.
    pub fn structural(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, IssueKind::Structural, message)
    }

    /// Value was garbage and has been replaced by "absent".
    pub fn coercion(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, IssueKind::Coercion, message)
    }

    pub fn rule_error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, IssueKind::BusinessRule, message)
    }

    pub fn rule_warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, IssueKind::BusinessRule, message)
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, IssueKind::Duplicate, message)
    }

    pub fn missing_optional(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(Severity::Info, IssueKind::Completeness, format!("optional field '{}' is absent", field))
            .on(field)
    }

    /// Attach the field name this issue refers to.
    pub fn on(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attach the offending raw value.
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Promote to a blocking error, keeping kind and message.
    pub fn escalate(mut self) -> Self {
        if !self.severity.is_blocking() {
            self.severity = Severity::Error;
        }
        self
    }

    /// Prefix the field with a parent scope (`managers[0]` + `nickname`).
    pub fn scoped(mut self, scope: &str) -> Self {
        self.field = Some(match self.field.take() {
            Some(f) => format!("{}.{}", scope, f),
            None => scope.to_string(),
        });
        self
    }

    pub fn is_on(&self, field: &str) -> bool {
        self.field.as_deref() == Some(field)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "[{:?}] {}: {}", self.severity, field, self.message),
            None => write!(f, "[{:?}] {}", self.severity, self.message),
        }
    }
}

// =============================================================================
// Transform Result
// =============================================================================

/// Outcome of transforming one raw entity.
///
/// `data` is only reachable while the error list is empty, so a caller can
/// never persist a record that failed to transform.
#[derive(Debug, Clone)]
pub struct TransformResult<T> {
    data: Option<T>,
    errors: Vec<Issue>,
    warnings: Vec<Issue>,
    metadata: Map<String, Value>,
}

impl<T> Default for TransformResult<T> {
    fn default() -> Self {
        Self { data: None, errors: Vec::new(), warnings: Vec::new(), metadata: Map::new() }
    }
}

impl<T> TransformResult<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful result carrying `data`.
    pub fn ok(data: T) -> Self {
        Self { data: Some(data), ..Self::default() }
    }

    /// Unsuccessful result with a single blocking issue.
    pub fn failed(issue: Issue) -> Self {
        let mut result = Self::default();
        result.push(issue.escalate());
        result
    }

    /// Build from collected issues, routing each by severity.
    pub fn from_issues(data: Option<T>, issues: Vec<Issue>) -> Self {
        let mut result = Self { data, ..Self::default() };
        result.extend(issues);
        result
    }

    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn data(&self) -> Option<&T> {
        if self.success() {
            self.data.as_ref()
        } else {
            None
        }
    }

    pub fn into_data(self) -> Option<T> {
        if self.success() {
            self.data
        } else {
            None
        }
    }

    pub fn errors(&self) -> &[Issue] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Issue] {
        &self.warnings
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn set_data(&mut self, data: T) {
        self.data = Some(data);
    }

    /// Append an issue. Info notes are kept with the warnings.
    pub fn push(&mut self, issue: Issue) {
        if issue.severity.is_blocking() {
            self.errors.push(issue);
        } else {
            self.warnings.push(issue);
        }
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Absorb another result's diagnostics and metadata, returning its data.
    ///
    /// Metadata already present on `self` is kept.
    pub fn merge<U>(&mut self, other: TransformResult<U>) -> Option<U> {
        let TransformResult { data, errors, warnings, metadata } = other;
        let ok = errors.is_empty();
        self.errors.extend(errors);
        self.warnings.extend(warnings);
        for (k, v) in metadata {
            self.metadata.entry(k).or_insert(v);
        }
        if ok {
            data
        } else {
            None
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TransformResult<U> {
        TransformResult {
            data: self.data.map(f),
            errors: self.errors,
            warnings: self.warnings,
            metadata: self.metadata,
        }
    }
}

impl<T: Serialize> Serialize for TransformResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TransformResult", 5)?;
        state.serialize_field("success", &self.success())?;
        state.serialize_field("data", &self.data())?;
        state.serialize_field("errors", &self.errors)?;
        state.serialize_field("warnings", &self.warnings)?;
        state.serialize_field("metadata", &self.metadata)?;
        state.end()
    }
}

// =============================================================================
// Validation Result
// =============================================================================

/// Outcome of validating one canonical record.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub entity: EntityType,
    pub record_key: Option<String>,
    pub duplicate: bool,
    errors: Vec<Issue>,
    warnings: Vec<Issue>,
    info: Vec<Issue>,
}

impl ValidationResult {
    pub fn new(entity: EntityType, record_key: Option<String>) -> Self {
        Self {
            entity,
            record_key,
            duplicate: false,
            errors: Vec::new(),
            warnings: Vec::new(),
            info: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Issue] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Issue] {
        &self.warnings
    }

    pub fn info(&self) -> &[Issue] {
        &self.info
    }

    pub fn push(&mut self, issue: Issue) {
        match issue.severity {
            Severity::Error | Severity::Critical => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
            Severity::Info => self.info.push(issue),
        }
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    /// Fold another result into this one. The duplicate flag is sticky.
    pub fn merge(&mut self, other: ValidationResult) {
        self.duplicate |= other.duplicate;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.info.extend(other.info);
    }

    /// All issues, errors first.
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.errors.iter().chain(self.warnings.iter()).chain(self.info.iter())
    }

    pub fn has_error_on(&self, field: &str) -> bool {
        self.errors.iter().any(|i| i.is_on(field))
    }

    pub fn has_warning_on(&self, field: &str) -> bool {
        self.warnings.iter().any(|i| i.is_on(field))
    }
}

impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationResult", 7)?;
        state.serialize_field("is_valid", &self.is_valid())?;
        state.serialize_field("entity", &self.entity)?;
        state.serialize_field("record_key", &self.record_key)?;
        state.serialize_field("duplicate", &self.duplicate)?;
        state.serialize_field("errors", &self.errors)?;
        state.serialize_field("warnings", &self.warnings)?;
        state.serialize_field("info", &self.info)?;
        state.end()
    }
}

// =============================================================================
// Batch Summary
// =============================================================================

/// Counts folded from a batch of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub with_warnings: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub duplicates: usize,
}

impl BatchSummary {
    pub fn from_transforms<'a, T: 'a>(results: impl IntoIterator<Item = &'a TransformResult<T>>) -> Self {
        let mut summary = Self::default();
        for r in results {
            summary.record(r.success(), r.errors().len(), r.warnings().len(), false);
        }
        summary
    }

    pub fn from_validations<'a>(results: impl IntoIterator<Item = &'a ValidationResult>) -> Self {
        let mut summary = Self::default();
        for r in results {
            summary.record(r.is_valid(), r.errors().len(), r.warnings().len(), r.duplicate);
        }
        summary
    }

    fn record(&mut self, ok: bool, errors: usize, warnings: usize, duplicate: bool) {
        self.total += 1;
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        if warnings > 0 {
            self.with_warnings += 1;
        }
        if duplicate {
            self.duplicates += 1;
        }
        self.error_count += errors;
        self.warning_count += warnings;
    }

    pub fn merge(&mut self, other: &BatchSummary) {
        self.total += other.total;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.with_warnings += other.with_warnings;
        self.error_count += other.error_count;
        self.warning_count += other.warning_count;
        self.duplicates += other.duplicates;
    }

    pub fn all_ok(&self) -> bool {
        self.failed == 0
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "{} total, {} ok, {} failed ({} errors, {} warnings, {} duplicates)",
            self.total, self.succeeded, self.failed, self.error_count, self.warning_count, self.duplicates
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_warnings_do_not_affect_success() {
        let mut r = TransformResult::ok(42);
        r.push(Issue::coercion("bad number").on("num_teams"));
        assert!(r.success());
        assert_eq!(r.data(), Some(&42));
        assert_eq!(r.warnings().len(), 1);
    }

    #[test]
    fn test_errors_hide_data() {
        let mut r = TransformResult::ok("league");
        r.push(Issue::structural("missing league_key").on("league_key"));
        assert!(!r.success());
        assert!(r.data().is_none());
        assert!(r.into_data().is_none());
    }

    #[test]
    fn test_failed_escalates_warning() {
        let r: TransformResult<()> = TransformResult::failed(Issue::coercion("garbage key"));
        assert!(!r.success());
        assert_eq!(r.errors()[0].severity, Severity::Error);
        assert_eq!(r.errors()[0].kind, IssueKind::Coercion);
    }

    #[test]
    fn test_merge_returns_child_data_only_on_success() {
        let mut parent: TransformResult<u8> = TransformResult::new();
        let mut child = TransformResult::ok(7u32);
        child.push(Issue::coercion("meh"));
        child.insert_metadata("unmapped_stats", json!(["99"]));
        assert_eq!(parent.merge(child), Some(7));
        assert_eq!(parent.warnings().len(), 1);
        assert!(parent.metadata().contains_key("unmapped_stats"));

        let bad: TransformResult<u32> = TransformResult::failed(Issue::structural("nope"));
        assert_eq!(parent.merge(bad), None);
        assert!(!parent.success());
    }

    #[test]
    fn test_transform_result_serializes_success_flag() {
        let mut r = TransformResult::ok(json!({"a": 1}));
        r.push(Issue::structural("boom"));
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["success"], json!(false));
        assert_eq!(v["data"], Value::Null);
        assert_eq!(v["errors"][0]["severity"], json!("ERROR"));
        assert_eq!(v["errors"][0]["kind"], json!("structural"));
    }

    #[test]
    fn test_validation_result_routes_by_severity() {
        let mut v = ValidationResult::new(EntityType::League, Some("428.l.1".into()));
        v.push(Issue::missing_optional("start_date"));
        v.push(Issue::rule_warning("too many teams").on("num_teams"));
        assert!(v.is_valid());
        v.push(Issue::rule_error("bad key").on("league_key"));
        assert!(!v.is_valid());
        assert!(v.has_error_on("league_key"));
        assert!(v.has_warning_on("num_teams"));
        assert_eq!(v.info().len(), 1);
        assert_eq!(v.issues().count(), 3);
    }

    #[test]
    fn test_batch_summary_fold() {
        let results = vec![
            TransformResult::ok(1),
            TransformResult::failed(Issue::structural("x")),
            {
                let mut r = TransformResult::ok(3);
                r.push(Issue::coercion("w"));
                r
            },
        ];
        let s = BatchSummary::from_transforms(&results);
        assert_eq!(s.total, 3);
        assert_eq!(s.succeeded, 2);
        assert_eq!(s.failed, 1);
        assert_eq!(s.with_warnings, 1);
        assert!(!s.all_ok());
        assert!(s.summary().contains("3 total"));
    }

    #[test]
    fn test_scoped_issue_field() {
        let issue = Issue::coercion("bad").on("nickname").scoped("managers[0]");
        assert_eq!(issue.field.as_deref(), Some("managers[0].nickname"));
    }
}
