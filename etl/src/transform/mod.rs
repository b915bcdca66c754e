//! Entity transformers: one raw upstream entity in, one canonical record out.
//!
//! Every transformer follows the same recipe:
//!
//! 1. strip the wrapper key and split the two-part encoding
//!    ([`crate::extract::split_head_tail`])
//! 2. read the natural key first; without it the result is unsuccessful
//! 3. read the remaining scalars through [`crate::extract::FieldReader`],
//!    turning garbage into absent values plus coercion warnings
//! 4. return a [`TransformResult`]; nothing is logged and nothing panics
//!
//! Batches go through [`Transformer::transform_batch`], which yields exactly
//! one result per input in input order.

pub mod league;
pub mod matchup;
pub mod player;
pub mod roster;
pub mod snapshot;
pub mod standings;
pub mod team;
pub mod transaction;

use serde_json::{json, Value};
use std::panic::{self, AssertUnwindSafe};

use crate::extract::{split_head_tail, unwrap_entity, EntityParts};
use crate::models::EntityType;
use crate::result::{panic_message, Issue, TransformResult};

pub use league::LeagueTransformer;
pub use matchup::MatchupTransformer;
pub use player::PlayerTransformer;
pub use roster::{RosterContext, RosterTransformer};
pub use snapshot::{SnapshotContext, SnapshotTransformer};
pub use standings::StandingsTransformer;
pub use team::TeamTransformer;
pub use transaction::TransactionTransformer;

/// Converts one raw entity into a canonical record.
pub trait Transformer {
    type Output;

    /// Record kind produced, used for validation and reporting.
    const ENTITY: EntityType;

    /// Wrapper key of this entity inside an indexed container.
    fn item_key(&self) -> &'static str;

    fn transform(&self, raw: &Value) -> TransformResult<Self::Output>;

    /// Transform many entities one-to-one.
    ///
    /// A malformed item produces an unsuccessful result at its position; a
    /// panicking item is caught and reported the same way.
    fn transform_batch<'a, I>(&self, items: I) -> Vec<TransformResult<Self::Output>>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let mut result = match panic::catch_unwind(AssertUnwindSafe(|| self.transform(item))) {
                    Ok(result) => result,
                    Err(payload) => TransformResult::failed(Issue::structural(format!(
                        "transformer aborted on item {}: {}",
                        index,
                        panic_message(payload.as_ref())
                    ))),
                };
                result.insert_metadata("batch_index", json!(index));
                result
            })
            .collect()
    }
}

/// Unwrap `item_key` and split into head/tail, or report why not.
pub(crate) fn entity_parts(raw: &Value, item_key: &str) -> Result<EntityParts, Issue> {
    let parts = split_head_tail(unwrap_entity(raw, item_key));
    if parts.is_empty() {
        Err(Issue::structural(format!("{} entity is empty or not an object/sequence", item_key)))
    } else {
        Ok(parts)
    }
}

// =============================================================================
// Names
// =============================================================================

/// A person name as sent upstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonName {
    pub full: Option<String>,
    pub first: Option<String>,
    pub last: Option<String>,
}

/// Compound `{full, first, last}` objects are taken verbatim; a bare string
/// is the full name only. Names are never split or reassembled.
pub fn parse_name(value: &Value) -> PersonName {
    let text = |v: Option<&Value>| {
        v.and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
    };
    match value {
        Value::Object(map) => PersonName {
            full: text(map.get("full")),
            first: text(map.get("first")),
            last: text(map.get("last")),
        },
        Value::String(_) => PersonName { full: text(Some(value)), ..PersonName::default() },
        _ => PersonName::default(),
    }
}

/// Position codes from any of the upstream shapes:
/// `[{"position": "PG"}, ...]`, `["PG", ...]`, `{"position": ["PG", "G"]}`
/// or a comma-separated string.
pub fn collect_positions(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    match value {
        Value::String(s) => out.extend(s.split(',').map(|p| p.trim().to_string())),
        Value::Array(items) => {
            for item in items {
                out.extend(collect_positions(item));
            }
        }
        Value::Object(map) => {
            if let Some(p) = map.get("position") {
                out.extend(collect_positions(p));
            } else if map.contains_key("count") {
                for entry in crate::extract::indexed_items(value, "position") {
                    out.extend(collect_positions(entry));
                }
            }
        }
        _ => {}
    }
    out.retain(|p| !p.is_empty());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Exploding;

    impl Transformer for Exploding {
        type Output = i64;
        const ENTITY: EntityType = EntityType::League;

        fn item_key(&self) -> &'static str {
            "thing"
        }

        fn transform(&self, raw: &Value) -> TransformResult<i64> {
            match raw.as_i64() {
                Some(13) => panic!("unlucky"),
                Some(n) => TransformResult::ok(n),
                None => TransformResult::failed(Issue::structural("not a number")),
            }
        }
    }

    #[test]
    fn test_batch_is_one_to_one_and_survives_panics() {
        let items = vec![json!(1), json!("x"), json!(13), json!(4)];
        let results = Exploding.transform_batch(&items);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].data(), Some(&1));
        assert!(!results[1].success());
        assert!(!results[2].success());
        assert!(results[2].errors()[0].message.contains("unlucky"));
        assert_eq!(results[3].data(), Some(&4));
        assert_eq!(results[3].metadata()["batch_index"], json!(3));
    }

    #[test]
    fn test_parse_name_shapes() {
        let n = parse_name(&json!({"full": "LeBron James", "first": "LeBron", "last": "James"}));
        assert_eq!(n.full.as_deref(), Some("LeBron James"));
        assert_eq!(n.last.as_deref(), Some("James"));

        let bare = parse_name(&json!("Nikola Jokic"));
        assert_eq!(bare.full.as_deref(), Some("Nikola Jokic"));
        assert!(bare.first.is_none() && bare.last.is_none());

        assert_eq!(parse_name(&json!(42)), PersonName::default());
    }

    #[test]
    fn test_collect_positions_shapes() {
        assert_eq!(collect_positions(&json!([{"position": "PG"}, {"position": "G"}])), vec!["PG", "G"]);
        assert_eq!(collect_positions(&json!({"position": ["SF", "PF"]})), vec!["SF", "PF"]);
        assert_eq!(collect_positions(&json!("PG,SG")), vec!["PG", "SG"]);
        assert_eq!(collect_positions(&json!(["C", ""])), vec!["C"]);
        assert!(collect_positions(&json!(7)).is_empty());
    }

    #[test]
    fn test_entity_parts_rejects_scalars() {
        assert!(entity_parts(&json!("nope"), "team").is_err());
        assert!(entity_parts(&json!({"team": [{"team_key": "1"}]}), "team").is_ok());
    }
}
