use serde_json::{Map, Value, json};

use super::{KEY_FIELDS, clear_key_field, infer_zone, key_block, number_value, vec2_value};
use crate::{Anchor, Key, KeyOverrides, Layout, MirrorSettings, ResolvedKey, Result, Zone};

/// Serializes the layout into the pretty printed configuration text.
pub fn serialize(layout: &Layout) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_document(layout))?)
}

/// Builds the configuration document. Values equal to what would be inherited
/// anyway are left out; cells without a key are written as `skip: true`.
/// Detached keys are grouped into an inferred zone.
pub fn to_document(layout: &Layout) -> Value {
    let mut points = Map::new();
    if layout.rotation != 0.0 {
        points.insert("rotate".to_string(), number_value(layout.rotation));
    }
    if let Some(mirror) = &layout.mirror {
        points.insert("mirror".to_string(), mirror_value(mirror));
    }
    let global = prune(&layout.key, |k| vec![k.resolve()]);
    if !global.is_empty() {
        points.insert("key".to_string(), Value::Object(key_block(&global, false)));
    }

    let mut zones = Map::new();
    for zone in &layout.zones {
        let value = zone_value(zone, &layout.key, |column, row| layout.key_at(&zone.name, column, row).is_some());
        zones.insert(zone.name.clone(), value);
    }

    // inference works in the frame the generator places zones in
    let detached: Vec<Key> = layout
        .detached_keys()
        .map(|k| {
            let mut key = k.clone();
            let p = key.position().rotated(-layout.rotation);
            key.set_position(p);
            key.rotation -= layout.rotation;
            key
        })
        .collect();
    let detached: Vec<&Key> = detached.iter().collect();
    if !detached.is_empty() {
        let name = inferred_zone_name(layout);
        if let Some(inferred) = infer_zone(&name, &detached) {
            log::debug!("grouped {} detached keys into inferred zone '{name}'", detached.len());
            let cells = &inferred.cells;
            let value = zone_value(&inferred.zone, &layout.key, |column, row| cells.contains(&(column.to_string(), row.to_string())));
            zones.insert(name, value);
        }
    }
    points.insert("zones".to_string(), Value::Object(zones));

    let mut meta = Map::new();
    meta.insert("engine".to_string(), Value::String(layout.meta.engine.clone()));
    for (name, value) in [("author", &layout.meta.author), ("name", &layout.meta.name), ("version", &layout.meta.version)] {
        if let Some(value) = value {
            meta.insert(name.to_string(), Value::String(value.clone()));
        }
    }

    json!({ "meta": meta, "points": points })
}

/// Flat export of every key: `name -> { x, y, r, meta }`.
pub fn points_json(layout: &Layout) -> Value {
    let mut out = Map::new();
    for key in layout.keys.values() {
        let name = if key.name.is_empty() { key.id.to_string() } else { key.name.clone() };
        let mut meta = Map::new();
        meta.insert("zone".to_string(), Value::String(key.zone.clone()));
        meta.insert("column".to_string(), Value::String(key.column.clone()));
        meta.insert("row".to_string(), Value::String(key.row.clone()));
        meta.insert("width".to_string(), number_value(key.width));
        meta.insert("height".to_string(), number_value(key.height));
        meta.insert("mirrored".to_string(), Value::Bool(key.mirrored));
        for (k, v) in &key.metadata {
            meta.insert(k.clone(), v.clone());
        }
        out.insert(
            name,
            json!({
                "x": number_value(key.x),
                "y": number_value(key.y),
                "r": number_value(key.rotation),
                "meta": meta,
            }),
        );
    }
    Value::Object(out)
}

fn inferred_zone_name(layout: &Layout) -> String {
    let mut name = "matrix".to_string();
    let mut n = 2;
    while layout.has_zone(&name) {
        name = format!("matrix_{n}");
        n += 1;
    }
    name
}

fn mirror_value(mirror: &MirrorSettings) -> Value {
    let mut obj = Map::new();
    if let Some(reference) = &mirror.reference {
        obj.insert("ref".to_string(), Value::String(reference.clone()));
    }
    obj.insert("distance".to_string(), number_value(mirror.distance));
    Value::Object(obj)
}

fn anchor_value(anchor: &Anchor) -> Value {
    let mut obj = Map::new();
    if let Some(reference) = &anchor.reference {
        obj.insert("ref".to_string(), Value::String(reference.clone()));
    }
    if !anchor.shift.is_zero() {
        obj.insert("shift".to_string(), vec2_value(anchor.shift));
    }
    if anchor.rotate != 0.0 {
        obj.insert("rotate".to_string(), number_value(anchor.rotate));
    }
    Value::Object(obj)
}

/// Drops every property whose removal does not change any of the resolved
/// keys produced by `resolve_with`.
fn prune(key: &KeyOverrides, mut resolve_with: impl FnMut(&KeyOverrides) -> Vec<ResolvedKey>) -> KeyOverrides {
    let mut pruned = key.clone();
    let mut resolved = resolve_with(&pruned);
    for field in KEY_FIELDS {
        let mut candidate = pruned.clone();
        clear_key_field(&mut candidate, field);
        if candidate == pruned {
            continue;
        }
        let candidate_resolved = resolve_with(&candidate);
        if candidate_resolved == resolved {
            pruned = candidate;
            resolved = candidate_resolved;
        }
    }
    pruned
}

fn zone_value(zone: &Zone, global: &KeyOverrides, present: impl Fn(&str, &str) -> bool) -> Value {
    let mut obj = Map::new();
    if !zone.anchor.is_default() {
        obj.insert("anchor".to_string(), anchor_value(&zone.anchor));
    }

    // candidates are tried on one scratch copy and the original value is put back after each level
    let mut scratch = zone.clone();

    let zone_key = prune(&zone.key, |k| {
        scratch.key = k.clone();
        scratch.cells().map(|(c, r)| cell_of(&scratch, global, c, r)).collect()
    });
    scratch.key = zone.key.clone();
    if !zone_key.is_empty() {
        obj.insert("key".to_string(), Value::Object(key_block(&zone_key, false)));
    }

    let mut columns = Map::new();
    for (ci, column) in zone.columns.iter().enumerate() {
        let column_key = prune(&column.key, |k| {
            scratch.columns[ci].key = k.clone();
            zone.rows.iter().map(|r| cell_of(&scratch, global, &column.name, &r.name)).collect()
        });
        scratch.columns[ci].key = column.key.clone();
        let mut col_obj = key_block(&column_key, true);

        let mut rows = Map::new();
        for row in &zone.rows {
            let original = column.rows.get(&row.name);
            let mut over = original.cloned().unwrap_or_default();
            let is_present = present(&column.name, &row.name);
            if zone.cell_key(global, column, row).resolve().skip == is_present {
                over.skip = Some(!is_present);
            }
            let over = prune(&over, |k| {
                scratch.columns[ci].rows.insert(row.name.clone(), k.clone());
                vec![cell_of(&scratch, global, &column.name, &row.name)]
            });
            match original {
                Some(original) => scratch.columns[ci].rows.insert(row.name.clone(), original.clone()),
                None => scratch.columns[ci].rows.remove(&row.name),
            };
            if !over.is_empty() {
                rows.insert(row.name.clone(), Value::Object(key_block(&over, false)));
            }
        }
        if !rows.is_empty() {
            col_obj.insert("rows".to_string(), Value::Object(rows));
        }
        columns.insert(column.name.clone(), Value::Object(col_obj));
    }
    obj.insert("columns".to_string(), Value::Object(columns));

    let mut rows = Map::new();
    for (ri, row) in zone.rows.iter().enumerate() {
        let row_key = prune(&row.key, |k| {
            scratch.rows[ri].key = k.clone();
            zone.columns.iter().map(|c| cell_of(&scratch, global, &c.name, &row.name)).collect()
        });
        scratch.rows[ri].key = row.key.clone();
        rows.insert(row.name.clone(), Value::Object(key_block(&row_key, true)));
    }
    obj.insert("rows".to_string(), Value::Object(rows));

    if zone.rotate != 0.0 {
        obj.insert("rotate".to_string(), number_value(zone.rotate));
    }
    if let Some(mirror) = &zone.mirror {
        obj.insert("mirror".to_string(), mirror_value(mirror));
    }
    Value::Object(obj)
}

/// Resolved cell plus the column-wide values, so pruning notices changes in either.
fn cell_of(zone: &Zone, global: &KeyOverrides, column: &str, row: &str) -> ResolvedKey {
    let (Some(c), Some(r)) = (zone.column(column), zone.row(row)) else {
        return ResolvedKey::default();
    };
    let cell = zone.cell_key(global, c, r).resolve();
    let col = zone.column_key(global, c).resolve();
    ResolvedKey {
        spread: col.spread,
        stagger: col.stagger,
        splay: col.splay,
        origin: col.origin,
        ..cell
    }
}
