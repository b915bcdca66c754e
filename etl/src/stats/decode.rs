//! Value decoders for the three stat strategies.

use serde_json::Value;

use crate::extract::coerce::{parse_int_str, to_int};
use crate::extract::Coerced;

/// Tokens that mean "no value" for any stat.
const EMPTY_TOKENS: &[&str] = &["", "-", "n/a", "na"];

fn is_empty_token(s: &str) -> bool {
    EMPTY_TOKENS.contains(&s.trim().to_ascii_lowercase().as_str())
}

/// Round to three decimals.
pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Decode `"made/attempted"` into two integers.
///
/// `"-/-"` and blanks are missing. Anything without exactly one separator,
/// or with a side that is not numeric, is invalid as a whole.
pub fn decode_made_attempted(value: &Value) -> Coerced<(i64, i64)> {
    let s = match value {
        Value::Null => return Coerced::Missing,
        Value::String(s) => s.trim(),
        _ => return Coerced::Invalid,
    };
    if is_empty_token(s) {
        return Coerced::Missing;
    }
    let mut sides = s.split('/');
    let (made, attempted) = match (sides.next(), sides.next(), sides.next()) {
        (Some(m), Some(a), None) => (m, a),
        _ => return Coerced::Invalid,
    };
    if is_empty_token(made) && is_empty_token(attempted) {
        return Coerced::Missing;
    }
    match (parse_int_str(made), parse_int_str(attempted)) {
        (Some(m), Some(a)) => Coerced::Present((m, a)),
        _ => Coerced::Invalid,
    }
}

pub fn encode_made_attempted(made: i64, attempted: i64) -> String {
    format!("{}/{}", made, attempted)
}

/// Normalize a fraction or 0-100 number onto the 0-100 scale.
///
/// Exactly `1.0` is read as a fraction (100%).
fn scale_percentage(v: f64) -> Option<f64> {
    if !v.is_finite() {
        None
    } else if (0.0..=1.0).contains(&v) {
        Some(round3(v * 100.0))
    } else if v > 1.0 && v <= 100.0 {
        Some(round3(v))
    } else {
        None
    }
}

/// Decode a percentage into the 0-100 scale, rounded to three decimals.
///
/// Accepts `"70%"`, `".700"`, `0.7` and `70.0`.
pub fn decode_percentage(value: &Value) -> Coerced<f64> {
    match value {
        Value::Null => Coerced::Missing,
        Value::Number(n) => n.as_f64().and_then(scale_percentage).map_or(Coerced::Invalid, Coerced::Present),
        Value::String(s) if is_empty_token(s) => Coerced::Missing,
        Value::String(s) => {
            let s = s.trim();
            if s.contains('%') {
                s.replace('%', "")
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map_or(Coerced::Invalid, |v| Coerced::Present(round3(v)))
            } else {
                s.parse::<f64>()
                    .ok()
                    .and_then(scale_percentage)
                    .map_or(Coerced::Invalid, Coerced::Present)
            }
        }
        _ => Coerced::Invalid,
    }
}

/// Plain count with truncating coercion.
pub fn decode_count(value: &Value) -> Coerced<i64> {
    match value {
        Value::String(s) if is_empty_token(s) => Coerced::Missing,
        other => to_int(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_made_attempted_round_trip() {
        for (m, a) in [(0, 0), (7, 10), (12, 12), (3, 41)] {
            let encoded = encode_made_attempted(m, a);
            assert_eq!(decode_made_attempted(&json!(encoded)), Coerced::Present((m, a)));
        }
    }

    #[test]
    fn test_made_attempted_missing_and_invalid() {
        assert_eq!(decode_made_attempted(&json!("-/-")), Coerced::Missing);
        assert_eq!(decode_made_attempted(&json!("-")), Coerced::Missing);
        assert_eq!(decode_made_attempted(&json!("")), Coerced::Missing);
        assert_eq!(decode_made_attempted(&Value::Null), Coerced::Missing);
        assert_eq!(decode_made_attempted(&json!("7-10")), Coerced::Invalid);
        assert_eq!(decode_made_attempted(&json!("7/10/2")), Coerced::Invalid);
        assert_eq!(decode_made_attempted(&json!("a/10")), Coerced::Invalid);
        assert_eq!(decode_made_attempted(&json!(7)), Coerced::Invalid);
        assert_eq!(decode_made_attempted(&json!(" 9 / 7 ")), Coerced::Present((9, 7)));
    }

    #[test]
    fn test_percentage_equivalent_forms() {
        let forms = [json!(".700"), json!("70%"), json!("70.0"), json!(0.7), json!(70)];
        for f in forms.iter() {
            assert_eq!(decode_percentage(f), Coerced::Present(70.0), "{}", f);
        }
        assert_eq!(decode_percentage(&json!(".4567")), Coerced::Present(45.67));
        assert_eq!(decode_percentage(&json!("45.6789%")), Coerced::Present(45.679));
    }

    #[test]
    fn test_percentage_exactly_one_is_fraction() {
        assert_eq!(decode_percentage(&json!(1.0)), Coerced::Present(100.0));
        assert_eq!(decode_percentage(&json!("1")), Coerced::Present(100.0));
        assert_eq!(decode_percentage(&json!("1.5")), Coerced::Present(1.5));
    }

    #[test]
    fn test_percentage_missing_and_out_of_range() {
        assert_eq!(decode_percentage(&json!("-")), Coerced::Missing);
        assert_eq!(decode_percentage(&json!("")), Coerced::Missing);
        assert_eq!(decode_percentage(&json!("N/A")), Coerced::Missing);
        assert_eq!(decode_percentage(&json!(150)), Coerced::Invalid);
        assert_eq!(decode_percentage(&json!(-0.2)), Coerced::Invalid);
        assert_eq!(decode_percentage(&json!("abc")), Coerced::Invalid);
    }

    #[test]
    fn test_count_decoding() {
        assert_eq!(decode_count(&json!("21")), Coerced::Present(21));
        assert_eq!(decode_count(&json!(21.7)), Coerced::Present(21));
        assert_eq!(decode_count(&json!("-")), Coerced::Missing);
        assert_eq!(decode_count(&json!("N/A")), Coerced::Missing);
        assert_eq!(decode_count(&json!("x")), Coerced::Invalid);
    }
}
