use serde_json::{Map, Value};

use super::{parse_number, parse_string, parse_vec2, set_key_field};
use crate::{
    Anchor, Column, IdGenerator, KeyOverrides, Layout, LayoutError, LayoutMeta, MirrorSettings, Result, Row, Zone,
    generator::{self, generate_zone_keys},
};

/// Parses a configuration document into a [`Layout`].
///
/// Zones are parsed first, then every key implied by each zone's
/// column × row product is generated in zone order, so a zone anchor may
/// reference keys of an earlier zone. Either the whole document is accepted
/// or an error describing the offending path is returned.
pub fn deserialize(text: &str, ids: &mut dyn IdGenerator) -> Result<Layout> {
    let root: Value = serde_json::from_str(text)?;
    let Some(root) = root.as_object() else {
        return Err(LayoutError::invalid("", "document must be an object"));
    };

    let mut layout = Layout::new();
    if let Some(meta) = root.get("meta") {
        layout.meta = parse_meta(meta)?;
    }

    let Some(points) = root.get("points") else {
        return Err(LayoutError::invalid("points", "missing points block"));
    };
    let points = as_object(points, "points")?;

    for (name, value) in points {
        let path = format!("points.{name}");
        match name.as_str() {
            "rotate" => layout.rotation = parse_number(value, &path)?,
            "mirror" => layout.mirror = parse_mirror(value, &path)?,
            "key" => layout.key = parse_key_block(value, &path)?,
            "zones" => {
                for (zone_name, zone_value) in as_object(value, &path)? {
                    let zone = parse_zone(zone_name, zone_value)?;
                    zone.validate()?;
                    layout.zones.push(zone);
                }
            }
            _ => log::debug!("ignoring unsupported entry '{path}'"),
        }
    }

    for i in 0..layout.zones.len() {
        let keys = generate_zone_keys(&layout.zones[i], &layout, ids)?;
        for key in keys {
            layout.keys.insert(key.id, key);
        }
        let name = layout.zones[i].name.clone();
        generator::sync_zone_mirror(&mut layout, &name, ids)?;
    }
    generator::sync_mirrors(&mut layout, ids)?;
    Ok(layout)
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| LayoutError::invalid(path, "expected an object"))
}

/// Entries may be `null` (`rows: { home: }` style), meaning no overrides.
fn optional_object<'a>(value: &'a Value, path: &str) -> Result<Option<&'a Map<String, Value>>> {
    match value {
        Value::Null => Ok(None),
        _ => as_object(value, path).map(Some),
    }
}

fn parse_meta(value: &Value) -> Result<LayoutMeta> {
    let obj = as_object(value, "meta")?;
    let mut meta = LayoutMeta::default();
    for (name, value) in obj {
        let path = format!("meta.{name}");
        match name.as_str() {
            "engine" => meta.engine = parse_string(value, &path)?,
            "author" => meta.author = Some(parse_string(value, &path)?),
            "name" => meta.name = Some(parse_string(value, &path)?),
            "version" => meta.version = Some(parse_string(value, &path)?),
            _ => log::debug!("ignoring unsupported entry '{path}'"),
        }
    }
    meta.validate()?;
    Ok(meta)
}

fn parse_mirror(value: &Value, path: &str) -> Result<Option<MirrorSettings>> {
    let Some(obj) = optional_object(value, path)? else {
        return Ok(None);
    };
    let mut mirror = MirrorSettings::default();
    for (name, value) in obj {
        let path = format!("{path}.{name}");
        match name.as_str() {
            "ref" => mirror.reference = Some(parse_string(value, &path)?),
            "distance" => mirror.distance = parse_number(value, &path)?,
            _ => log::debug!("ignoring unsupported entry '{path}'"),
        }
    }
    Ok(Some(mirror))
}

fn parse_anchor(value: &Value, path: &str) -> Result<Anchor> {
    let mut anchor = Anchor::default();
    let Some(obj) = optional_object(value, path)? else {
        return Ok(anchor);
    };
    for (name, value) in obj {
        let path = format!("{path}.{name}");
        match name.as_str() {
            "ref" => anchor.reference = Some(parse_string(value, &path)?),
            "shift" => anchor.shift = parse_vec2(value, &path)?,
            "rotate" => anchor.rotate = parse_number(value, &path)?,
            _ => log::debug!("ignoring unsupported entry '{path}'"),
        }
    }
    Ok(anchor)
}

/// A plain key block: `{ "padding": 17, "shift": [1, 0] }`.
fn parse_key_block(value: &Value, path: &str) -> Result<KeyOverrides> {
    let mut key = KeyOverrides::default();
    if let Some(obj) = optional_object(value, path)? {
        for (name, value) in obj {
            let field = name.strip_prefix("key.").unwrap_or(name);
            let path = format!("{path}.{name}");
            if !set_key_field(&mut key, field, value, &path)? {
                log::debug!("ignoring unsupported entry '{path}'");
            }
        }
    }
    Ok(key)
}

/// Applies one column/row/zone entry that may be a nested `key` block, a dotted
/// `key.*` property, or a bare key property. Returns false if the entry is none
/// of those.
fn apply_key_entry(key: &mut KeyOverrides, name: &str, value: &Value, path: &str) -> Result<bool> {
    if name == "key" {
        *key = key.merged(&parse_key_block(value, path)?);
        return Ok(true);
    }
    let field = name.strip_prefix("key.").unwrap_or(name);
    set_key_field(key, field, value, path)
}

fn parse_column(name: &str, value: &Value, path: &str) -> Result<Column> {
    let mut column = Column::new(name);
    let Some(obj) = optional_object(value, path)? else {
        return Ok(column);
    };
    for (entry, value) in obj {
        let entry_path = format!("{path}.{entry}");
        if entry == "rows" {
            if let Some(rows) = optional_object(value, &entry_path)? {
                for (row_name, row_value) in rows {
                    let row_path = format!("{entry_path}.{row_name}");
                    column.rows.insert(row_name.clone(), parse_key_block(row_value, &row_path)?);
                }
            }
        } else if !apply_key_entry(&mut column.key, entry, value, &entry_path)? {
            log::debug!("ignoring unsupported entry '{entry_path}'");
        }
    }
    Ok(column)
}

fn parse_row(name: &str, value: &Value, path: &str) -> Result<Row> {
    let mut row = Row::new(name);
    if let Some(obj) = optional_object(value, path)? {
        for (entry, value) in obj {
            let entry_path = format!("{path}.{entry}");
            if !apply_key_entry(&mut row.key, entry, value, &entry_path)? {
                log::debug!("ignoring unsupported entry '{entry_path}'");
            }
        }
    }
    Ok(row)
}

fn parse_zone(name: &str, value: &Value) -> Result<Zone> {
    let path = format!("points.zones.{name}");
    let mut zone = Zone::new(name);
    let Some(obj) = optional_object(value, &path)? else {
        return Ok(zone);
    };

    for (entry, value) in obj {
        let entry_path = format!("{path}.{entry}");
        match entry.as_str() {
            "anchor" => zone.anchor = parse_anchor(value, &entry_path)?,
            "rotate" => zone.rotate = parse_number(value, &entry_path)?,
            "mirror" => zone.mirror = parse_mirror(value, &entry_path)?,
            "columns" => {
                if let Some(columns) = optional_object(value, &entry_path)? {
                    for (col_name, col_value) in columns {
                        let col_path = format!("{entry_path}.{col_name}");
                        zone.columns.push(parse_column(col_name, col_value, &col_path)?);
                    }
                }
            }
            "rows" => {
                if let Some(rows) = optional_object(value, &entry_path)? {
                    for (row_name, row_value) in rows {
                        let row_path = format!("{entry_path}.{row_name}");
                        zone.rows.push(parse_row(row_name, row_value, &row_path)?);
                    }
                }
            }
            _ => {
                if !apply_key_entry(&mut zone.key, entry, value, &entry_path)? {
                    log::debug!("ignoring unsupported entry '{entry_path}'");
                }
            }
        }
    }
    Ok(zone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KEY_UNIT, SequentialIds};

    fn parse(text: &str) -> Result<Layout> {
        deserialize(text, &mut SequentialIds::new())
    }

    #[test]
    fn parses_zone_and_generates_cross_product() {
        let layout = parse(
            r#"{
                "meta": { "engine": "4.1.0", "author": "me" },
                "points": {
                    "zones": {
                        "matrix": {
                            "anchor": { "shift": [10, 20] },
                            "columns": { "pinky": null, "ring": { "key.stagger": 5 } },
                            "rows": { "bottom": {}, "home": {} }
                        }
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(layout.meta.author.as_deref(), Some("me"));
        assert_eq!(layout.keys.len(), 4);
        let zone = layout.zone("matrix").unwrap();
        let names: Vec<&str> = zone.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["pinky", "ring"]);
        let key = layout.key_at("matrix", "ring", "home").unwrap();
        assert_eq!(key.x, 10.0 + KEY_UNIT);
        assert_eq!(key.y, 20.0 + 5.0 + KEY_UNIT);
    }

    #[test]
    fn nested_and_bare_key_entries_are_accepted() {
        let layout = parse(
            r#"{ "points": { "zones": { "z": {
                "key": { "padding": 17 },
                "columns": { "a": { "key": { "spread": "u" } }, "b": { "spread": "U" } },
                "rows": { "r1": { "key.padding": 15 }, "r2": null }
            } } } }"#,
        )
        .unwrap();
        let zone = layout.zone("z").unwrap();
        assert_eq!(zone.key.padding, Some(17.0));
        assert_eq!(zone.columns[0].key.spread, Some(19.0));
        assert_eq!(zone.columns[1].key.spread, Some(KEY_UNIT));
        assert_eq!(zone.rows[0].key.padding, Some(15.0));
    }

    #[test]
    fn reports_path_of_malformed_value() {
        let err = parse(r#"{ "points": { "zones": { "z": { "columns": { "a": { "key.stagger": true } } } } } }"#).unwrap_err();
        match err {
            LayoutError::InvalidConfig { path, .. } => assert_eq!(path, "points.zones.z.columns.a.key.stagger"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_non_semver_engine() {
        let err = parse(r#"{ "meta": { "engine": "four" }, "points": { "zones": {} } }"#).unwrap_err();
        assert!(matches!(err, LayoutError::ValidationFailed { .. }));
    }

    #[test]
    fn rejects_invalid_json_and_missing_points() {
        assert!(matches!(parse("{ nope"), Err(LayoutError::Parse(_))));
        assert!(matches!(parse("{}"), Err(LayoutError::InvalidConfig { .. })));
        assert!(parse("[]").is_err());
    }

    #[test]
    fn anchor_can_reference_earlier_zone() {
        let layout = parse(
            r#"{ "points": { "zones": {
                "matrix": { "columns": { "a": {} }, "rows": { "r": {} } },
                "thumb": { "anchor": { "ref": "matrix_a_r", "shift": [0, -20] }, "columns": { "t": {} }, "rows": { "r": {} } }
            } } }"#,
        )
        .unwrap();
        let thumb = layout.key_at("thumb", "t", "r").unwrap();
        assert_eq!(thumb.y, -20.0);

        let err = parse(r#"{ "points": { "zones": { "z": { "anchor": { "ref": "missing" }, "columns": { "a": {} }, "rows": { "r": {} } } } } }"#)
            .unwrap_err();
        assert!(matches!(err, LayoutError::UnknownReference { .. }));
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn global_rotate_turns_every_zone() {
        let layout = parse(
            r#"{ "points": { "rotate": 90, "zones": {
                "matrix": { "columns": { "a": {}, "b": {} }, "rows": { "r": {} } },
                "thumb": { "anchor": { "ref": "matrix_b_r", "shift": [0, -20] }, "columns": { "t": {} }, "rows": { "r": {} } }
            } } }"#,
        )
        .unwrap();
        let b = layout.key_by_name("matrix_b_r").unwrap();
        assert!(approx(b.x, 0.0));
        assert!(approx(b.y, KEY_UNIT));
        assert!(approx(b.rotation, 90.0));

        // the thumb anchor resolves before the rotation, then turns with it
        let thumb = layout.key_by_name("thumb_t_r").unwrap();
        assert!(approx(thumb.x, 20.0));
        assert!(approx(thumb.y, KEY_UNIT));
        assert!(approx(thumb.rotation, 90.0));
    }

    #[test]
    fn zone_mirror_adds_counterparts() {
        let layout = parse(r#"{ "points": { "zones": { "z": { "columns": { "a": {} }, "rows": { "r": {} }, "mirror": { "distance": 20 } } } } }"#)
            .unwrap();
        assert_eq!(layout.keys.len(), 2);

        let source = layout.key_at("z", "a", "r").unwrap();
        assert!(!source.mirrored);
        let mirror = layout.key_by_name("mirror_z_a_r").unwrap();
        assert!(mirror.mirrored);
        assert_eq!(mirror.mirror_of, Some(source.id));
        assert_eq!(mirror.x, 20.0);
        assert_eq!(mirror.y, 0.0);
        assert!(layout.is_mirror_counterpart(mirror));
    }

    #[test]
    fn global_mirror_uses_referenced_key() {
        let layout = parse(
            r#"{ "points": {
                "mirror": { "ref": "z_b_r", "distance": 10 },
                "zones": { "z": { "columns": { "a": {}, "b": {} }, "rows": { "r": {} } } }
            } }"#,
        )
        .unwrap();
        assert_eq!(layout.keys.len(), 4);
        let axis = KEY_UNIT + 5.0;
        assert!(approx(layout.key_by_name("mirror_z_a_r").unwrap().x, 2.0 * axis));
        assert!(approx(layout.key_by_name("mirror_z_b_r").unwrap().x, 2.0 * axis - KEY_UNIT));
    }

    #[test]
    fn zone_mirror_happens_before_global_rotate() {
        let zone_mirror = parse(r#"{ "points": { "rotate": 90, "zones": { "z": { "columns": { "a": {} }, "rows": { "r": {} }, "mirror": { "distance": 20 } } } } }"#)
            .unwrap();
        let m = zone_mirror.key_by_name("mirror_z_a_r").unwrap();
        assert!(approx(m.x, 0.0));
        assert!(approx(m.y, 20.0));
        assert!(approx(m.rotation, 90.0));

        let global_mirror = parse(r#"{ "points": { "rotate": 90, "mirror": { "distance": 20 }, "zones": { "z": { "columns": { "a": {} }, "rows": { "r": {} } } } } }"#)
            .unwrap();
        let m = global_mirror.key_by_name("mirror_z_a_r").unwrap();
        assert!(approx(m.x, 20.0));
        assert!(approx(m.y, 0.0));
        assert!(approx(m.rotation, -90.0));
    }

    #[test]
    fn unknown_mirror_reference_is_reported() {
        let err = parse(r#"{ "points": { "mirror": { "ref": "nope" }, "zones": { "z": { "columns": { "a": {} }, "rows": { "r": {} } } } } }"#).unwrap_err();
        assert!(matches!(err, LayoutError::UnknownReference { .. }));
    }
}
