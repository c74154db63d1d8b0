//! Config codec
//!
//! Converts between the structured [`Layout`] and the hierarchical text
//! configuration consumed by the generation engine:
//!
//! ```json
//! {
//!   "meta": { "engine": "4.1.0", "author": "..." },
//!   "points": {
//!     "rotate": 0,
//!     "mirror": { "ref": "...", "distance": 20 },
//!     "zones": {
//!       "matrix": {
//!         "anchor": { "shift": [0, 0], "rotate": 0 },
//!         "columns": { "pinky": { "key.spread": 19.05, "rows": { "top": { "skip": true } } } },
//!         "rows": { "bottom": {}, "home": {} }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! The two directions are independent entry points. Parsing never trusts
//! stored coordinates: every key is re-derived from the zone description.

mod deserialize;
mod infer;
mod serialize;

pub use deserialize::deserialize;
pub use infer::{InferredZone, infer_zone};
pub use serialize::{points_json, serialize, to_document};

use serde_json::{Map, Value};

use crate::{KEY_UNIT, KeyOverrides, LayoutError, Result, SMALL_UNIT, Vec2};

/// Property names understood at key level, in output order.
pub const KEY_FIELDS: [&str; 11] = [
    "spread", "stagger", "splay", "origin", "padding", "orient", "shift", "rotate", "width", "height", "skip",
];

/// Reads a number. Strings may use the unit shorthands: `u` is 19 mm and
/// `U` is [`KEY_UNIT`], so `"u"`, `"1.5U"` and `"-u"` are all accepted.
pub(crate) fn parse_number(value: &Value, path: &str) -> Result<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| LayoutError::invalid(path, "number out of range")),
        Value::String(s) => parse_unit_str(s).ok_or_else(|| LayoutError::invalid(path, format!("'{s}' is not a number"))),
        _ => Err(LayoutError::invalid(path, "expected a number")),
    }
}

fn parse_unit_str(s: &str) -> Option<f64> {
    let s = s.trim();
    let unit = match s.chars().last() {
        Some('u') => Some(SMALL_UNIT),
        Some('U') => Some(KEY_UNIT),
        _ => None,
    };
    if let Some(unit) = unit {
        let factor = match s[..s.len() - 1].trim() {
            "" | "+" => 1.0,
            "-" => -1.0,
            f => f.parse::<f64>().ok()?,
        };
        return Some(factor * unit);
    }
    s.parse::<f64>().ok()
}

pub(crate) fn parse_vec2(value: &Value, path: &str) -> Result<Vec2> {
    match value {
        Value::Array(items) if items.len() == 2 => Ok(Vec2::new(
            parse_number(&items[0], &format!("{path}[0]"))?,
            parse_number(&items[1], &format!("{path}[1]"))?,
        )),
        Value::Number(_) | Value::String(_) => {
            let v = parse_number(value, path)?;
            Ok(Vec2::new(v, v))
        }
        _ => Err(LayoutError::invalid(path, "expected a [x, y] pair")),
    }
}

pub(crate) fn parse_bool(value: &Value, path: &str) -> Result<bool> {
    value.as_bool().ok_or_else(|| LayoutError::invalid(path, "expected true or false"))
}

pub(crate) fn parse_string(value: &Value, path: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(LayoutError::invalid(path, "expected a string")),
    }
}

/// Sets one key-level property. Returns `Ok(false)` for names that are not key
/// properties so callers can decide what else the entry might be.
pub(crate) fn set_key_field(key: &mut KeyOverrides, name: &str, value: &Value, path: &str) -> Result<bool> {
    match name {
        "spread" => key.spread = Some(parse_number(value, path)?),
        "stagger" => key.stagger = Some(parse_number(value, path)?),
        "splay" => key.splay = Some(parse_number(value, path)?),
        "origin" => key.origin = Some(parse_vec2(value, path)?),
        "padding" => key.padding = Some(parse_number(value, path)?),
        "orient" => key.orient = Some(parse_number(value, path)?),
        "shift" => key.shift = Some(parse_vec2(value, path)?),
        "rotate" => key.rotate = Some(parse_number(value, path)?),
        "width" => key.width = Some(parse_number(value, path)?),
        "height" => key.height = Some(parse_number(value, path)?),
        "skip" => key.skip = Some(parse_bool(value, path)?),
        _ => return Ok(false),
    }
    Ok(true)
}

pub(crate) fn clear_key_field(key: &mut KeyOverrides, name: &str) {
    match name {
        "spread" => key.spread = None,
        "stagger" => key.stagger = None,
        "splay" => key.splay = None,
        "origin" => key.origin = None,
        "padding" => key.padding = None,
        "orient" => key.orient = None,
        "shift" => key.shift = None,
        "rotate" => key.rotate = None,
        "width" => key.width = None,
        "height" => key.height = None,
        "skip" => key.skip = None,
        _ => {}
    }
}

pub(crate) fn number_value(v: f64) -> Value {
    serde_json::Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

pub(crate) fn vec2_value(v: Vec2) -> Value {
    Value::Array(vec![number_value(v.x), number_value(v.y)])
}

/// The set properties of `key` as `(name, value)` pairs in [`KEY_FIELDS`] order.
pub(crate) fn key_field_values(key: &KeyOverrides) -> Vec<(&'static str, Value)> {
    let mut out = Vec::new();
    let numbers = [
        ("spread", key.spread),
        ("stagger", key.stagger),
        ("splay", key.splay),
    ];
    out.extend(numbers.into_iter().filter_map(|(n, v)| v.map(|v| (n, number_value(v)))));
    if let Some(origin) = key.origin {
        out.push(("origin", vec2_value(origin)));
    }
    for (n, v) in [("padding", key.padding), ("orient", key.orient)] {
        if let Some(v) = v {
            out.push((n, number_value(v)));
        }
    }
    if let Some(shift) = key.shift {
        out.push(("shift", vec2_value(shift)));
    }
    for (n, v) in [("rotate", key.rotate), ("width", key.width), ("height", key.height)] {
        if let Some(v) = v {
            out.push((n, number_value(v)));
        }
    }
    if let Some(skip) = key.skip {
        out.push(("skip", Value::Bool(skip)));
    }
    out
}

/// Key block as a nested object (`{"spread": 18}`) or with dotted names (`{"key.spread": 18}`).
pub(crate) fn key_block(key: &KeyOverrides, dotted: bool) -> Map<String, Value> {
    key_field_values(key)
        .into_iter()
        .map(|(n, v)| (if dotted { format!("key.{n}") } else { n.to_string() }, v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_shorthand() {
        assert_eq!(parse_unit_str("u"), Some(19.0));
        assert_eq!(parse_unit_str("U"), Some(KEY_UNIT));
        assert_eq!(parse_unit_str("-u"), Some(-19.0));
        assert_eq!(parse_unit_str("-U"), Some(-KEY_UNIT));
        assert_eq!(parse_unit_str("0.5U"), Some(0.5 * KEY_UNIT));
        assert_eq!(parse_unit_str("2u"), Some(38.0));
        assert_eq!(parse_unit_str(" 17 "), Some(17.0));
        assert_eq!(parse_unit_str("u+1"), None);
    }

    #[test]
    fn dotted_key_block() {
        let key = KeyOverrides {
            stagger: Some(5.0),
            origin: Some(Vec2::new(0.0, -9.5)),
            ..Default::default()
        };
        let block = key_block(&key, true);
        let names: Vec<&str> = block.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["key.stagger", "key.origin"]);
        assert_eq!(block["key.origin"], serde_json::json!([0.0, -9.5]));
    }

    #[test]
    fn set_and_clear_field() {
        let mut key = KeyOverrides::default();
        assert!(set_key_field(&mut key, "padding", &serde_json::json!("U"), "p").unwrap());
        assert_eq!(key.padding, Some(KEY_UNIT));
        assert!(!set_key_field(&mut key, "tags", &serde_json::json!([]), "p").unwrap());
        assert!(set_key_field(&mut key, "skip", &serde_json::json!(3), "p").is_err());
        clear_key_field(&mut key, "padding");
        assert!(key.is_empty());
    }
}
