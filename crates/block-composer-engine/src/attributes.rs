//! Attribute normalization.
//!
//! The output schema forces every attribute into a `{name, value}` string
//! pair so strict structured output stays possible. This module turns those
//! pairs back into the nested, typed map a block expects.

use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::OnceLock;

/// Converts raw manifest attributes into a nested key-value map.
///
/// Accepts two encodings:
/// - pair format `[{"name": "level", "value": "2"}, ...]`, detected by a
///   first element carrying a `name` key; values go through [`cast_value`]
///   and dotted names build nested maps
/// - legacy object format `{"level": 2}`, returned unchanged
///
/// Never fails. Anything else degrades to an empty map.
pub fn normalize(raw: &Value) -> Map<String, Value> {
    match raw {
        Value::Array(items) if is_pair_list(items) => normalize_pairs(items),
        Value::Array(items) if items.is_empty() => Map::new(),
        Value::Object(legacy) => legacy.clone(),
        Value::Null => Map::new(),
        other => {
            log::warn!("Ignoring attributes in unsupported shape: {other}");
            Map::new()
        }
    }
}

fn is_pair_list(items: &[Value]) -> bool {
    items
        .first()
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key("name"))
}

fn normalize_pairs(items: &[Value]) -> Map<String, Value> {
    let mut normalized = Map::new();

    for pair in items {
        let Some(pair) = pair.as_object() else {
            continue;
        };
        let (Some(name), Some(value)) = (pair.get("name"), pair.get("value")) else {
            continue;
        };
        if name.is_null() || value.is_null() {
            continue;
        }

        let name = match name {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        if name.is_empty() {
            continue;
        }

        set_nested(&mut normalized, &name, cast_value(value));
    }

    normalized
}

fn numeric_regex() -> &'static Regex {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    NUMERIC.get_or_init(|| Regex::new(r"^-?(0|[1-9]\d*)(\.\d+)?$").expect("Invalid numeric regex"))
}

/// Casts a stringified value back to its native JSON type.
///
/// `"true"`, `"false"` and `"null"` become literals, numbers without a
/// leading-zero ambiguity become integers or floats, and complete `{...}` or
/// `[...]` literals that parse as JSON become structures. Everything else,
/// including non-strings, is returned as given.
pub fn cast_value(value: &Value) -> Value {
    let Value::String(raw) = value else {
        return value.clone();
    };
    let trimmed = raw.trim();

    match trimmed {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }

    if numeric_regex().is_match(trimmed) {
        if let Some(number) = parse_number(trimmed) {
            return Value::Number(number);
        }
        return value.clone();
    }

    let object_like = trimmed.starts_with('{') && trimmed.ends_with('}');
    let array_like = trimmed.starts_with('[') && trimmed.ends_with(']');
    if (object_like || array_like)
        && let Ok(decoded) = serde_json::from_str::<Value>(trimmed)
    {
        return decoded;
    }

    value.clone()
}

fn parse_number(text: &str) -> Option<Number> {
    if text.contains('.') {
        text.parse::<f64>().ok().and_then(Number::from_f64)
    } else {
        text.parse::<i64>().ok().map(Number::from)
    }
}

/// Writes `value` at a dot-separated `path`, creating intermediate maps and
/// replacing any non-map value found on the way.
fn set_nested(target: &mut Map<String, Value>, path: &str, value: Value) {
    if !path.contains('.') {
        target.insert(path.to_string(), value);
        return;
    }

    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    set_path(target, &segments, value);
}

fn set_path(target: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            target.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let slot = target
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(child) = slot {
                set_path(child, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("true", json!(true))]
    #[case("false", json!(false))]
    #[case("null", json!(null))]
    #[case(" true ", json!(true))]
    #[case("2", json!(2))]
    #[case("-17", json!(-17))]
    #[case("0", json!(0))]
    #[case("1.5", json!(1.5))]
    #[case("-0.25", json!(-0.25))]
    #[case("007", json!("007"))]
    #[case("1.", json!("1."))]
    #[case(".5", json!(".5"))]
    #[case("1e5", json!("1e5"))]
    #[case("99999999999999999999", json!("99999999999999999999"))]
    #[case("{\"a\":1}", json!({"a": 1}))]
    #[case("[1, \"two\"]", json!([1, "two"]))]
    #[case("{not json}", json!("{not json}"))]
    #[case("[unclosed", json!("[unclosed"))]
    #[case("Hello", json!("Hello"))]
    #[case("", json!(""))]
    fn casts_strings(#[case] input: &str, #[case] expected: Value) {
        assert_eq!(cast_value(&json!(input)), expected);
    }

    #[test]
    fn non_strings_pass_through() {
        assert_eq!(cast_value(&json!(3)), json!(3));
        assert_eq!(cast_value(&json!({"x": "1"})), json!({"x": "1"}));
    }

    #[test]
    fn untrimmed_text_is_kept_verbatim() {
        assert_eq!(cast_value(&json!("  spaced out ")), json!("  spaced out "));
    }

    #[test]
    fn normalizes_pairs_with_casting() {
        let raw = json!([
            {"name": "level", "value": "2"},
            {"name": "content", "value": "Hello"}
        ]);
        assert_eq!(
            Value::Object(normalize(&raw)),
            json!({"level": 2, "content": "Hello"})
        );
    }

    #[test]
    fn dotted_names_build_nested_maps() {
        let raw = json!([
            {"name": "data.title", "value": "Hi"},
            {"name": "data.count", "value": "3"},
            {"name": "style.color.text", "value": "#fff"}
        ]);
        assert_eq!(
            Value::Object(normalize(&raw)),
            json!({
                "data": {"title": "Hi", "count": 3},
                "style": {"color": {"text": "#fff"}}
            })
        );
    }

    #[test]
    fn dotted_path_overwrites_scalar_on_the_way() {
        let raw = json!([
            {"name": "data", "value": "flat"},
            {"name": "data.field", "value": "nested"}
        ]);
        assert_eq!(
            Value::Object(normalize(&raw)),
            json!({"data": {"field": "nested"}})
        );
    }

    #[test]
    fn empty_segments_are_ignored() {
        let raw = json!([
            {"name": "a..b", "value": "1"},
            {"name": "...", "value": "lost"}
        ]);
        assert_eq!(Value::Object(normalize(&raw)), json!({"a": {"b": 1}}));
    }

    #[test]
    fn skips_blank_names_and_incomplete_pairs() {
        let raw = json!([
            {"name": "  ", "value": "x"},
            {"name": "missing-value"},
            {"name": "nulled", "value": null},
            "not a pair",
            {"name": " align ", "value": "wide"}
        ]);
        assert_eq!(Value::Object(normalize(&raw)), json!({"align": "wide"}));
    }

    #[test]
    fn legacy_map_is_returned_unchanged() {
        let raw = json!({"level": "2", "content": "Title"});
        assert_eq!(Value::Object(normalize(&raw)), raw);
    }

    #[test]
    fn unsupported_shapes_degrade_to_empty() {
        assert!(normalize(&json!([])).is_empty());
        assert!(normalize(&json!(null)).is_empty());
        assert!(normalize(&json!("level=2")).is_empty());
        assert!(normalize(&json!([1, 2, 3])).is_empty());
    }
}
