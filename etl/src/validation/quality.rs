//! Batch-level quality scoring over validated records.
//!
//! | dimension    | score (0-100)                                          |
//! |--------------|--------------------------------------------------------|
//! | completeness | mean share of filled values per serialized column      |
//! | accuracy     | share of records without errors                        |
//! | uniqueness   | share of records that are not duplicates               |
//! | consistency  | share of records without a business-rule issue         |
//!
//! The overall score is the mean of the four. Stat outliers are flagged with
//! the interquartile-range rule inside each granularity; they are notes for a
//! human and never change validity.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::{Validate, ValidationRules};
use crate::result::{IssueKind, ValidationResult};
use crate::stats::{Granularity, StatField, StatLine};

/// Coarse grade for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl QualityLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => QualityLevel::Excellent,
            s if s >= 75.0 => QualityLevel::Good,
            s if s >= 60.0 => QualityLevel::Fair,
            s if s >= 40.0 => QualityLevel::Poor,
            _ => QualityLevel::Critical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityLevel::Excellent => "excellent",
            QualityLevel::Good => "good",
            QualityLevel::Fair => "fair",
            QualityLevel::Poor => "poor",
            QualityLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often one output column carried a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCompleteness {
    pub field: String,
    pub present: usize,
    pub ratio: f64,
}

/// A stat value far outside the rest of its batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatOutlier {
    /// Position in the input batch.
    pub index: usize,
    pub key: Option<String>,
    pub granularity: Granularity,
    pub field: StatField,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Quality scores for one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub total: usize,
    pub duplicates: usize,
    pub completeness_score: f64,
    pub accuracy_score: f64,
    pub uniqueness_score: f64,
    pub consistency_score: f64,
    pub overall_score: f64,
    pub level: QualityLevel,
    /// Columns below the completeness threshold, lowest first.
    pub incomplete_fields: Vec<FieldCompleteness>,
    pub outliers: Vec<StatOutlier>,
}

impl QualityReport {
    /// Score a batch of `(input index, record, validation)` triples.
    ///
    /// An empty batch scores zero across the board.
    pub fn assess<'a, R, I>(entries: I, rules: &ValidationRules) -> Self
    where
        R: Validate + Serialize + 'a,
        I: IntoIterator<Item = (usize, &'a R, &'a ValidationResult)>,
    {
        let entries: Vec<(usize, &R, &ValidationResult)> = entries.into_iter().collect();
        let total = entries.len();
        if total == 0 {
            return Self::empty();
        }

        let columns = column_presence(entries.iter().map(|(_, record, _)| *record));
        let completeness: Vec<FieldCompleteness> = columns
            .into_iter()
            .map(|(field, present)| FieldCompleteness { ratio: present as f64 / total as f64, field, present })
            .collect();
        let completeness_score = if completeness.is_empty() {
            100.0
        } else {
            percent(completeness.iter().map(|c| c.ratio).sum::<f64>(), completeness.len())
        };

        let valid = entries.iter().filter(|(_, _, v)| v.is_valid()).count();
        let unique = entries.iter().filter(|(_, _, v)| !v.duplicate).count();
        let consistent = entries
            .iter()
            .filter(|(_, _, v)| !v.issues().any(|i| i.kind == IssueKind::BusinessRule))
            .count();

        let accuracy_score = percent(valid as f64, total);
        let uniqueness_score = percent(unique as f64, total);
        let consistency_score = percent(consistent as f64, total);
        let overall_score =
            round1((completeness_score + accuracy_score + uniqueness_score + consistency_score) / 4.0);

        let mut incomplete_fields: Vec<FieldCompleteness> =
            completeness.into_iter().filter(|c| c.ratio < rules.completeness_threshold).collect();
        incomplete_fields.sort_by(|a, b| a.ratio.total_cmp(&b.ratio).then_with(|| a.field.cmp(&b.field)));

        let outliers = stat_outliers(&entries, rules);

        Self {
            total,
            duplicates: total - unique,
            completeness_score,
            accuracy_score,
            uniqueness_score,
            consistency_score,
            overall_score,
            level: QualityLevel::from_score(overall_score),
            incomplete_fields,
            outliers,
        }
    }

    fn empty() -> Self {
        Self {
            total: 0,
            duplicates: 0,
            completeness_score: 0.0,
            accuracy_score: 0.0,
            uniqueness_score: 0.0,
            consistency_score: 0.0,
            overall_score: 0.0,
            level: QualityLevel::Critical,
            incomplete_fields: Vec::new(),
            outliers: Vec::new(),
        }
    }

    /// Share of duplicates in the batch, 0..=1.
    pub fn duplicate_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.duplicates as f64 / self.total as f64
        }
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "quality {:.1} ({}): completeness {:.1}, accuracy {:.1}, uniqueness {:.1}, consistency {:.1}, {} outlier(s)",
            self.overall_score,
            self.level,
            self.completeness_score,
            self.accuracy_score,
            self.uniqueness_score,
            self.consistency_score,
            self.outliers.len()
        )
    }
}

fn percent(part: f64, whole: usize) -> f64 {
    round1(part / whole as f64 * 100.0)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Filled count per top-level scalar column of the serialized records.
///
/// Nested arrays and objects are skipped; null, blank text and a column a
/// record does not emit all count as missing.
fn column_presence<'a, R: Serialize + 'a>(records: impl Iterator<Item = &'a R>) -> BTreeMap<String, usize> {
    let mut columns: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        let Ok(Value::Object(map)) = serde_json::to_value(record) else {
            continue;
        };
        for (field, value) in map {
            let filled = match &value {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                Value::Array(_) | Value::Object(_) => continue,
                _ => true,
            };
            *columns.entry(field).or_insert(0) += usize::from(filled);
        }
    }
    columns
}

fn stat_outliers<R: Validate>(entries: &[(usize, &R, &ValidationResult)], rules: &ValidationRules) -> Vec<StatOutlier> {
    let mut groups: BTreeMap<Granularity, Vec<(usize, Option<String>, &StatLine)>> = BTreeMap::new();
    for (index, record, validation) in entries {
        if let Some((granularity, line)) = record.stat_line() {
            groups.entry(granularity).or_default().push((*index, validation.record_key.clone(), line));
        }
    }

    let mut outliers = Vec::new();
    for (granularity, lines) in groups {
        for field in StatField::ALL {
            let values: Vec<(usize, &Option<String>, f64)> = lines
                .iter()
                .filter_map(|(index, key, line)| line.get(field).filter(|v| v.is_finite()).map(|v| (*index, key, v)))
                .collect();
            let Some((lower, upper)) = iqr_fences(values.iter().map(|(_, _, v)| *v), rules) else {
                continue;
            };
            outliers.extend(values.into_iter().filter(|(_, _, v)| *v < lower || *v > upper).map(
                |(index, key, value)| StatOutlier {
                    index,
                    key: key.clone(),
                    granularity,
                    field,
                    value,
                    lower,
                    upper,
                },
            ));
        }
    }
    outliers.sort_by_key(|o| (o.index, o.field));
    outliers
}

/// `(q1 - k·iqr, q3 + k·iqr)` over the values, or `None` below the sample
/// minimum.
fn iqr_fences(values: impl Iterator<Item = f64>, rules: &ValidationRules) -> Option<(f64, f64)> {
    let mut sorted: Vec<f64> = values.collect();
    let n = sorted.len();
    if n == 0 || n < rules.outlier_min_samples {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let q1 = sorted[n / 4];
    let q3 = sorted[(3 * n / 4).min(n - 1)];
    let spread = (q3 - q1) * rules.outlier_iqr_factor;
    Some((q1 - spread, q3 + spread))
}
