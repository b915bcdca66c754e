//! Defensive scalar coercion.
//!
//! Upstream scalars are weakly typed: counts come as `"12"`, `12` or `12.0`,
//! booleans as `"1"`, `1`, `true` or `"yes"`, and missing values as `null`,
//! `""` or `"-"`. Every coercion distinguishes three outcomes so callers can
//! tell "not provided" from "provided but garbage":
//!
//! - [`Coerced::Missing`] - nothing usable was sent
//! - [`Coerced::Present`] - a value of the target type
//! - [`Coerced::Invalid`] - something was sent but it does not coerce
//!
//! [`FieldReader`] wraps a lookup source and turns `Invalid` into a coercion
//! warning so transformers read fields in one line each.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::EntityParts;
use crate::result::Issue;

/// Accepted date layouts, tried in order.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

const TRUE_WORDS: &[&str] = &["1", "true", "yes", "on"];
const FALSE_WORDS: &[&str] = &["0", "false", "no", "off", ""];

/// Outcome of coercing one raw value.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced<T> {
    Missing,
    Present(T),
    Invalid,
}

impl<T> Coerced<T> {
    pub fn present(self) -> Option<T> {
        match self {
            Coerced::Present(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Coerced::Invalid)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Coerced<U> {
        match self {
            Coerced::Missing => Coerced::Missing,
            Coerced::Present(v) => Coerced::Present(f(v)),
            Coerced::Invalid => Coerced::Invalid,
        }
    }
}

/// Strings treated as "no value".
fn is_blank(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s == "-"
}

/// Truncating integer parse: `"7"`, `"7.9"` and `7.9` all give 7.
pub fn parse_int_str(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    s.parse::<f64>().ok().and_then(float_to_int)
}

fn float_to_int(f: f64) -> Option<i64> {
    if f.is_finite() && f.abs() < i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

pub fn to_int(value: &Value) -> Coerced<i64> {
    match value {
        Value::Null => Coerced::Missing,
        Value::Number(n) => match n.as_i64() {
            Some(i) => Coerced::Present(i),
            None => n.as_f64().and_then(float_to_int).map_or(Coerced::Invalid, Coerced::Present),
        },
        Value::String(s) if is_blank(s) => Coerced::Missing,
        Value::String(s) => parse_int_str(s).map_or(Coerced::Invalid, Coerced::Present),
        _ => Coerced::Invalid,
    }
}

pub fn to_float(value: &Value) -> Coerced<f64> {
    match value {
        Value::Null => Coerced::Missing,
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .map_or(Coerced::Invalid, Coerced::Present),
        Value::String(s) if is_blank(s) => Coerced::Missing,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map_or(Coerced::Invalid, Coerced::Present),
        _ => Coerced::Invalid,
    }
}

/// Boolean coercion. An empty string reads as `false`.
pub fn to_bool(value: &Value) -> Coerced<bool> {
    match value {
        Value::Null => Coerced::Missing,
        Value::Bool(b) => Coerced::Present(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) => Coerced::Present(f != 0.0),
            None => Coerced::Invalid,
        },
        Value::String(s) => {
            let word = s.trim().to_ascii_lowercase();
            if TRUE_WORDS.contains(&word.as_str()) {
                Coerced::Present(true)
            } else if FALSE_WORDS.contains(&word.as_str()) {
                Coerced::Present(false)
            } else {
                Coerced::Invalid
            }
        }
        _ => Coerced::Invalid,
    }
}

/// Trimmed text. Numbers are rendered; blank strings are missing.
pub fn to_text(value: &Value) -> Coerced<String> {
    match value {
        Value::Null => Coerced::Missing,
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                Coerced::Missing
            } else {
                Coerced::Present(t.to_string())
            }
        }
        Value::Number(n) => Coerced::Present(n.to_string()),
        Value::Bool(b) => Coerced::Present(b.to_string()),
        _ => Coerced::Invalid,
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

pub fn to_date(value: &Value) -> Coerced<NaiveDate> {
    match value {
        Value::Null => Coerced::Missing,
        Value::String(s) if is_blank(s) => Coerced::Missing,
        Value::String(s) => parse_date(s).map_or(Coerced::Invalid, Coerced::Present),
        _ => Coerced::Invalid,
    }
}

// =============================================================================
// Field Reader
// =============================================================================

/// Reads coerced fields from one or more maps and collects diagnostics.
///
/// Lookups try each source in order, so an [`EntityParts`] reader sees the
/// head before the tail.
pub struct FieldReader<'a> {
    sources: Vec<&'a Map<String, Value>>,
    scope: Option<String>,
    issues: Vec<Issue>,
}

impl<'a> FieldReader<'a> {
    pub fn new(parts: &'a EntityParts) -> Self {
        Self { sources: vec![&parts.head, &parts.tail], scope: None, issues: Vec::new() }
    }

    pub fn over(map: &'a Map<String, Value>) -> Self {
        Self { sources: vec![map], scope: None, issues: Vec::new() }
    }

    /// Prefix every reported field with `scope`.
    pub fn scoped(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn raw(&self, key: &str) -> Option<&'a Value> {
        self.sources.iter().copied().find_map(|m| m.get(key))
    }

    fn field_name(&self, key: &str) -> String {
        match &self.scope {
            Some(scope) => format!("{}.{}", scope, key),
            None => key.to_string(),
        }
    }

    pub fn push(&mut self, issue: Issue) {
        let issue = match &self.scope {
            Some(scope) => issue.scoped(scope),
            None => issue,
        };
        self.issues.push(issue);
    }

    pub fn warn(&mut self, key: &str, message: impl Into<String>) {
        let issue = Issue::coercion(message).on(key);
        self.push(issue);
    }

    /// Absorb issues from a nested reader (already scoped by it).
    pub fn absorb(&mut self, issues: Vec<Issue>) {
        self.issues.extend(issues);
    }

    pub fn finish(self) -> Vec<Issue> {
        self.issues
    }

    fn resolve<T>(&mut self, key: &str, expected: &str, coerce: fn(&Value) -> Coerced<T>) -> Option<T> {
        let raw = self.raw(key)?;
        match coerce(raw) {
            Coerced::Present(v) => Some(v),
            Coerced::Missing => None,
            Coerced::Invalid => {
                let issue = Issue::coercion(format!("expected {}, got {}", expected, raw))
                    .on(key)
                    .with_value(raw.clone());
                self.push(issue);
                None
            }
        }
    }

    /// The natural key of the entity. Missing or garbage is a blocking error.
    pub fn natural_key(&mut self, key: &str) -> Option<String> {
        match self.raw(key).map(to_text) {
            Some(Coerced::Present(v)) => Some(v),
            Some(Coerced::Invalid) => {
                let raw = self.raw(key).cloned().unwrap_or(Value::Null);
                let issue = Issue::coercion(format!("natural key '{}' is not a scalar", self.field_name(key)))
                    .on(key)
                    .with_value(raw)
                    .escalate();
                self.push(issue);
                None
            }
            _ => {
                let issue = Issue::structural(format!("missing natural key '{}'", self.field_name(key))).on(key);
                self.push(issue);
                None
            }
        }
    }

    pub fn text(&mut self, key: &str) -> Option<String> {
        self.resolve(key, "text", to_text)
    }

    pub fn int(&mut self, key: &str) -> Option<i64> {
        self.resolve(key, "an integer", to_int)
    }

    /// Integer narrowed to `T`; out-of-range values warn and read as absent.
    pub fn int_as<T: TryFrom<i64>>(&mut self, key: &str) -> Option<T> {
        let wide = self.int(key)?;
        match T::try_from(wide) {
            Ok(v) => Some(v),
            Err(_) => {
                self.warn(key, format!("integer {} out of range", wide));
                None
            }
        }
    }

    pub fn float(&mut self, key: &str) -> Option<f64> {
        self.resolve(key, "a number", to_float)
    }

    pub fn opt_bool(&mut self, key: &str) -> Option<bool> {
        self.resolve(key, "a boolean", to_bool)
    }

    /// Boolean with a default for missing or garbage input.
    pub fn bool_or(&mut self, key: &str, default: bool) -> bool {
        self.opt_bool(key).unwrap_or(default)
    }

    pub fn date(&mut self, key: &str) -> Option<NaiveDate> {
        self.resolve(key, "a date", to_date)
    }

    /// Nested attribute group (mapping or mergeable sequence).
    pub fn group(&self, key: &str) -> Option<Map<String, Value>> {
        self.raw(key).filter(|v| v.is_object() || v.is_array()).map(super::resolve_grouping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::split_head_tail;
    use crate::result::{IssueKind, Severity};
    use serde_json::json;

    #[test]
    fn test_to_int_variants() {
        assert_eq!(to_int(&json!(12)), Coerced::Present(12));
        assert_eq!(to_int(&json!("12")), Coerced::Present(12));
        assert_eq!(to_int(&json!(" 7.9 ")), Coerced::Present(7));
        assert_eq!(to_int(&json!(-2.5)), Coerced::Present(-2));
        assert_eq!(to_int(&json!("-")), Coerced::Missing);
        assert_eq!(to_int(&json!("")), Coerced::Missing);
        assert_eq!(to_int(&Value::Null), Coerced::Missing);
        assert_eq!(to_int(&json!("twelve")), Coerced::Invalid);
        assert_eq!(to_int(&json!("NaN")), Coerced::Invalid);
        assert_eq!(to_int(&json!({"a": 1})), Coerced::Invalid);
    }

    #[test]
    fn test_to_bool_word_sets() {
        for t in ["1", "true", "YES", "On", " true "] {
            assert_eq!(to_bool(&json!(t)), Coerced::Present(true), "{}", t);
        }
        for f in ["0", "false", "No", "OFF", ""] {
            assert_eq!(to_bool(&json!(f)), Coerced::Present(false), "{}", f);
        }
        assert_eq!(to_bool(&json!(2)), Coerced::Present(true));
        assert_eq!(to_bool(&json!(0)), Coerced::Present(false));
        assert_eq!(to_bool(&json!("maybe")), Coerced::Invalid);
        assert_eq!(to_bool(&Value::Null), Coerced::Missing);
    }

    #[test]
    fn test_to_text_and_dates() {
        assert_eq!(to_text(&json!("  Ballers ")), Coerced::Present("Ballers".to_string()));
        assert_eq!(to_text(&json!(428)), Coerced::Present("428".to_string()));
        assert_eq!(to_text(&json!("   ")), Coerced::Missing);
        assert_eq!(to_text(&json!([1])), Coerced::Invalid);

        let d = NaiveDate::from_ymd_opt(2024, 10, 22).unwrap();
        assert_eq!(parse_date("2024-10-22"), Some(d));
        assert_eq!(parse_date("2024/10/22"), Some(d));
        assert_eq!(parse_date("10/22/2024"), Some(d));
        assert_eq!(parse_date("22.10.2024"), None);
        assert_eq!(to_date(&json!("soon")), Coerced::Invalid);
    }

    #[test]
    fn test_field_reader_garbage_becomes_warning() {
        let parts = split_head_tail(&json!([
            [{"team_key": "428.l.1.t.1"}, {"number_of_moves": "lots"}],
            {"clinched_playoffs": "perhaps"}
        ]));
        let mut f = FieldReader::new(&parts);
        assert_eq!(f.natural_key("team_key").as_deref(), Some("428.l.1.t.1"));
        assert_eq!(f.int("number_of_moves"), None);
        assert!(!f.bool_or("clinched_playoffs", false));
        assert_eq!(f.int("absent"), None);
        let issues = f.finish();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == IssueKind::Coercion && i.severity == Severity::Warning));
        assert!(issues[0].is_on("number_of_moves"));
    }

    #[test]
    fn test_field_reader_natural_key_errors() {
        let map = json!({"league_key": "  ", "team_key": {"x": 1}});
        let map = map.as_object().unwrap();
        let mut f = FieldReader::over(map);
        assert!(f.natural_key("league_key").is_none());
        assert!(f.natural_key("team_key").is_none());
        let issues = f.finish();
        assert_eq!(issues[0].kind, IssueKind::Structural);
        assert_eq!(issues[1].kind, IssueKind::Coercion);
        assert!(issues.iter().all(|i| i.severity == Severity::Error));
    }

    #[test]
    fn test_field_reader_scope_and_narrowing() {
        let map = json!({"manager_id": "99999999999", "nickname": "--"});
        let map = map.as_object().unwrap();
        let mut f = FieldReader::over(map).scoped("managers[0]");
        assert_eq!(f.int_as::<u32>("manager_id"), None);
        let issues = f.finish();
        assert_eq!(issues[0].field.as_deref(), Some("managers[0].manager_id"));
    }
}
