// File: labsrelay-core/src/normalizer/fields.rs
//
// Lenient field readers for untyped feed payloads. "Truthy" follows the
// feed's own fallback semantics: null, false, 0, NaN and "" count as absent.

use serde_json::{Map, Number, Value};

/// Unwraps an envelope's `message`: a sequence yields its last element.
/// Returns `None` when the result is not a JSON object.
pub fn unwrap_message(message: &Value) -> Option<&Map<String, Value>> {
    let unwrapped = match message {
        Value::Array(items) => items.last()?,
        other => other,
    };
    unwrapped.as_object()
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First truthy value among `keys`, tried in order.
pub fn first_truthy<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| fields.get(*k))
        .find(|v| is_truthy(v))
}

/// `id`, then `_id`, else `null`.
pub fn resolve_id(fields: &Map<String, Value>) -> Value {
    first_truthy(fields, &["id", "_id"])
        .cloned()
        .unwrap_or(Value::Null)
}

pub fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Text of `key`, whatever its truthiness.
pub fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    text(fields.get(key))
}

/// Text of the first truthy key.
pub fn text_fallback(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    text(first_truthy(fields, keys))
}

/// Coerces numbers and numeric strings to a JSON number. Integral values are
/// kept as integers so `"42"` and `42.0` both become `42`.
pub fn number(value: Option<&Value>) -> Option<Number> {
    match value? {
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => from_f64(f),
            _ => Some(n.clone()),
        },
        Value::String(s) => parse_number(s),
        Value::Bool(b) => Some(Number::from(u8::from(*b))),
        _ => None,
    }
}

pub fn number_field(fields: &Map<String, Value>, key: &str) -> Option<Number> {
    number(fields.get(key))
}

/// Number coercion for fields the feed passes through a plain numeric cast:
/// an explicit `null` or a blank string is `0`, and `0x`/`0o`/`0b` literals
/// are read in their radix. An absent key stays `None`.
pub fn cast_number(value: Option<&Value>) -> Option<Number> {
    match value? {
        Value::Null => Some(Number::from(0)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Some(Number::from(0));
            }
            match radix_literal(trimmed) {
                Some(parsed) => parsed,
                None => parse_number(trimmed),
            }
        }
        other => number(Some(other)),
    }
}

/// `Some(..)` when `raw` carries a radix prefix, whether or not its digits parse.
fn radix_literal(raw: &str) -> Option<Option<Number>> {
    let radix = match raw.get(..2)?.to_ascii_lowercase().as_str() {
        "0x" => 16,
        "0o" => 8,
        "0b" => 2,
        _ => return None,
    };
    let digits = &raw[2..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Some(None);
    }
    Some(u64::from_str_radix(digits, radix).ok().map(Number::from))
}

fn parse_number(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(u) = trimmed.parse::<u64>() {
        return Some(Number::from(u));
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Number::from(i));
    }
    // f64::from_str accepts "inf"/"nan"; from_f64 rejects both.
    trimmed.parse::<f64>().ok().and_then(from_f64)
}

fn from_f64(f: f64) -> Option<Number> {
    if !f.is_finite() {
        return None;
    }
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        return Some(Number::from(f as i64));
    }
    Number::from_f64(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn unwrap_takes_last_element_of_sequences() {
        let msg = json!([{ "a": 1 }, { "b": 2 }]);
        assert_eq!(unwrap_message(&msg), Some(&map(json!({ "b": 2 }))));

        let msg = json!({ "a": 1 });
        assert_eq!(unwrap_message(&msg), Some(&map(json!({ "a": 1 }))));
    }

    #[test]
    fn unwrap_rejects_non_objects() {
        for msg in [
            json!("text"),
            json!(12),
            json!(null),
            json!(true),
            json!([]),
            json!([{ "a": 1 }, "tail"]),
            json!([[{ "a": 1 }]]),
        ] {
            assert_eq!(unwrap_message(&msg), None, "{msg} should be malformed");
        }
    }

    #[test]
    fn id_prefers_id_then_underscore_id() {
        assert_eq!(resolve_id(&map(json!({ "id": 5, "_id": "x" }))), json!(5));
        assert_eq!(resolve_id(&map(json!({ "_id": "abc" }))), json!("abc"));
        assert_eq!(resolve_id(&map(json!({ "id": "", "_id": "abc" }))), json!("abc"));
        assert_eq!(resolve_id(&map(json!({ "id": 0 }))), Value::Null);
        assert_eq!(resolve_id(&map(json!({}))), Value::Null);
    }

    #[test]
    fn numbers_are_coerced() {
        assert_eq!(number(Some(&json!("42"))), Some(Number::from(42)));
        assert_eq!(number(Some(&json!(" 7 "))), Some(Number::from(7)));
        assert_eq!(number(Some(&json!("-3"))), Some(Number::from(-3)));
        assert_eq!(number(Some(&json!("12.50"))), Number::from_f64(12.5));
        assert_eq!(number(Some(&json!(42.0))), Some(Number::from(42)));
        assert_eq!(number(Some(&json!(3.25))), Number::from_f64(3.25));
        assert_eq!(number(Some(&json!("abc"))), None);
        assert_eq!(number(Some(&json!("inf"))), None);
        assert_eq!(number(Some(&json!(""))), None);
        assert_eq!(number(Some(&json!({ "n": 1 }))), None);
        assert_eq!(number(None), None);
    }

    #[test]
    fn cast_number_treats_blank_as_zero_and_reads_radix_literals() {
        assert_eq!(cast_number(Some(&json!(null))), Some(Number::from(0)));
        assert_eq!(cast_number(Some(&json!(""))), Some(Number::from(0)));
        assert_eq!(cast_number(Some(&json!("   "))), Some(Number::from(0)));
        assert_eq!(cast_number(Some(&json!("0x1A"))), Some(Number::from(26)));
        assert_eq!(cast_number(Some(&json!("0o17"))), Some(Number::from(15)));
        assert_eq!(cast_number(Some(&json!("0B101"))), Some(Number::from(5)));
        assert_eq!(cast_number(Some(&json!("0x"))), None);
        assert_eq!(cast_number(Some(&json!("0x+1"))), None);
        assert_eq!(cast_number(Some(&json!("0b12"))), None);
        assert_eq!(cast_number(Some(&json!(" 42 "))), Some(Number::from(42)));
        assert_eq!(cast_number(Some(&json!(false))), Some(Number::from(0)));
        assert_eq!(cast_number(Some(&json!("many"))), None);
        assert_eq!(cast_number(None), None);
    }

    #[test]
    fn text_renders_numbers_and_drops_other_shapes() {
        assert_eq!(text(Some(&json!("hi"))), Some("hi".into()));
        assert_eq!(text(Some(&json!(10))), Some("10".into()));
        assert_eq!(text(Some(&json!([1]))), None);
        assert_eq!(text(Some(&json!(null))), None);
    }

    #[test]
    fn fallback_skips_falsy_values() {
        let fields = map(json!({ "message": "", "comment": "nice stream" }));
        assert_eq!(text_fallback(&fields, &["message", "comment"]), Some("nice stream".into()));
        assert_eq!(text_field(&fields, "message"), Some(String::new()));
        assert_eq!(text_fallback(&fields, &["missing"]), None);
    }
}
