use std::fmt::Write;

use anyhow::{Context, bail};
use keylayout_edit::{EditorOptions, IdGenerator, Key, Layout, LayoutStore, SequentialIds, codec};
use serde::Deserialize;
use serde_json::Value;

/// Key entry accepted by `infer`; `r` defaults to 0.
#[derive(Deserialize, Debug)]
struct FlatKey {
    x: f64,
    y: f64,
    #[serde(default)]
    r: f64,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
}

fn load(text: &str, options: &EditorOptions) -> anyhow::Result<LayoutStore> {
    let mut store = LayoutStore::new(Layout::new(), options.clone());
    store.load_config(text).context("Failed to load layout configuration")?;
    log::info!("loaded {} keys in {} zones", store.layout().keys.len(), store.layout().zones.len());
    Ok(store)
}

/// Key positions of a configuration, either as JSON or as one line per key.
pub fn points(text: &str, options: &EditorOptions, json: bool) -> anyhow::Result<String> {
    let store = load(text, options)?;
    if json {
        return Ok(serde_json::to_string_pretty(&codec::points_json(store.layout()))?);
    }
    let mut out = String::new();
    for key in store.layout().keys.values() {
        writeln!(out, "{:<24} {:>10.3} {:>10.3} {:>8.2}", key.name, key.x, key.y, key.rotation)?;
    }
    Ok(out)
}

/// Parses a configuration and writes it back in canonical form.
pub fn normalize(text: &str, options: &EditorOptions) -> anyhow::Result<String> {
    let store = load(text, options)?;
    Ok(store.to_config()?)
}

/// Builds a zone configuration from a flat key list. Accepts either an array
/// of `{x, y, r}` objects or the name keyed map written by `points --json`.
pub fn infer(text: &str) -> anyhow::Result<String> {
    let value: Value = serde_json::from_str(text).context("Failed to parse key list")?;
    let entries: Vec<Value> = match value {
        Value::Array(entries) => entries,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        _ => bail!("Expected an array of keys or a map of named keys"),
    };
    if entries.is_empty() {
        bail!("Key list is empty");
    }

    let mut ids = SequentialIds::new();
    let mut layout = Layout::new();
    for (i, entry) in entries.into_iter().enumerate() {
        let flat: FlatKey = serde_json::from_value(entry).with_context(|| format!("Invalid key at index {i}"))?;
        let mut key = Key::new(ids.next_id(), flat.x, flat.y);
        key.rotation = flat.r;
        if let Some(width) = flat.width {
            key.width = width;
        }
        if let Some(height) = flat.height {
            key.height = height;
        }
        layout.keys.insert(key.id, key);
    }
    log::info!("inferring zone from {} keys", layout.keys.len());
    Ok(codec::serialize(&layout)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"{ "points": { "zones": { "matrix": {
        "anchor": { "shift": [10, 0] },
        "columns": { "a": {}, "b": { "key.stagger": 5 } },
        "rows": { "bottom": {}, "top": {} }
    } } } }"#;

    #[test]
    fn points_as_text() {
        let out = points(CONFIG, &EditorOptions::default(), false).unwrap();
        assert_eq!(out.lines().count(), 4);
        assert!(out.lines().any(|l| l.starts_with("matrix_b_bottom") && l.contains("29.050") && l.contains("5.000")));
    }

    #[test]
    fn points_as_json() {
        let out = points(CONFIG, &EditorOptions::default(), true).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["matrix_a_top"]["y"], serde_json::json!(19.05));
    }

    #[test]
    fn normalize_is_stable() {
        let once = normalize(CONFIG, &EditorOptions::default()).unwrap();
        let twice = normalize(&once, &EditorOptions::default()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn infer_from_points_output() {
        let flat = points(CONFIG, &EditorOptions::default(), true).unwrap();
        let config = infer(&flat).unwrap();
        let out = points(&config, &EditorOptions::default(), false).unwrap();
        assert_eq!(out.lines().count(), 4);
    }

    #[test]
    fn infer_rejects_bad_input() {
        assert!(infer("[]").is_err());
        assert!(infer("42").is_err());
        assert!(infer(r#"[{ "x": "left" }]"#).is_err());
    }
}
