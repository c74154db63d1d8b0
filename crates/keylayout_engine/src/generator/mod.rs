//! Zone position generator
//!
//! Turns a zone's column/row description into absolute key positions using
//! the same accumulation rules as the external generation engine:
//!
//! - columns advance the zone anchor by `spread` (X, skipped for the first
//!   column) and `stagger` (Y)
//! - every non-zero `splay` records a rotation around the column anchor plus
//!   the column `origin`; recorded rotations are cumulative and are applied,
//!   in recording order, to every later column as well
//! - rows advance a running anchor by `padding` in the anchor's own frame;
//!   a placed key replaces the running anchor, so padding is measured from it
//! - per key `orient`, `shift`, `rotate` are applied in that order, then the
//!   zone `rotate` turns the result around the zone anchor
//! - the global `rotate` turns every zone key around the origin; anchors
//!   resolve against positions with that rotation undone
//! - a zone `mirror` reflects the zone's keys before the global rotation,
//!   the global `mirror` reflects the keys of every other zone after it
//!
//! Placement is a pure function of its inputs.

use std::collections::BTreeMap;

use crate::{Anchor, IdGenerator, Key, KeyId, KeyOverrides, Layout, LayoutError, MirrorSettings, Point, ResolvedKey, Result, Vec2, Zone};

/// Position computed for one zone cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellPlacement {
    pub column: String,
    pub row: String,
    pub point: Point,
    /// Resolved properties of the cell.
    pub key: ResolvedKey,
    /// Resolved column-wide properties (spread, stagger, splay, origin).
    pub column_key: ResolvedKey,
}

/// Position of `key` with the global rotation undone.
fn unrotated(key: &Key, rotation: f64) -> Point {
    let mut point = key.to_point();
    point.rotate(-rotation, Vec2::ZERO);
    point
}

fn referenced_key<'a>(owner: &str, reference: &str, layout: &'a Layout) -> Result<&'a Key> {
    layout.key_by_name(reference).ok_or_else(|| LayoutError::UnknownReference {
        zone: owner.to_string(),
        reference: reference.to_string(),
    })
}

/// Start point of a zone: the referenced key (if any), shifted in that key's
/// frame and rotated by the anchor rotation.
pub fn resolve_anchor(zone_name: &str, anchor: &Anchor, layout: &Layout) -> Result<Point> {
    let mut point = match &anchor.reference {
        Some(reference) => unrotated(referenced_key(zone_name, reference, layout)?, layout.rotation),
        None => Point::new(0.0, 0.0, 0.0),
    };
    point.shift(anchor.shift, true);
    point.r += anchor.rotate;
    Ok(point)
}

/// Runs the placement loop. `occupied(column, row)` decides whether a cell
/// holds a key; unoccupied and skipped cells only advance the running anchor.
pub fn place_zone(zone: &Zone, global: &KeyOverrides, start: Point, occupied: impl Fn(&str, &str) -> bool) -> Vec<CellPlacement> {
    let zone_origin = start.position();
    let mut zone_anchor = start;
    let mut rotations: Vec<(f64, Vec2)> = Vec::new();
    let mut placements = Vec::new();

    for (i, column) in zone.columns.iter().enumerate() {
        let column_key = zone.column_key(global, column).resolve();
        if i > 0 {
            zone_anchor.x += column_key.spread;
        }
        zone_anchor.y += column_key.stagger;
        let column_anchor = zone_anchor.clone();

        if column_key.splay != 0.0 {
            rotations.push((column_key.splay, column_anchor.position() + column_key.origin));
        }

        let mut running = column_anchor;
        for (angle, origin) in &rotations {
            running.rotate(*angle, *origin);
        }

        for row in &zone.rows {
            let key = zone.cell_key(global, column, row).resolve();
            if key.skip || !occupied(&column.name, &row.name) {
                running.shift(Vec2::new(0.0, key.padding), true);
                continue;
            }

            let mut candidate = running.clone();
            candidate.r += key.orient;
            candidate.shift(key.shift, true);
            candidate.r += key.rotate;
            running = candidate.clone();

            if zone.rotate != 0.0 {
                candidate.rotate(zone.rotate, zone_origin);
            }

            placements.push(CellPlacement {
                column: column.name.clone(),
                row: row.name.clone(),
                point: candidate,
                key,
                column_key,
            });
            running.shift(Vec2::new(0.0, key.padding), true);
        }
    }
    placements
}

/// Placement loop followed by the global rotation.
fn place_in_layout(zone: &Zone, layout: &Layout, occupied: impl Fn(&str, &str) -> bool) -> Result<Vec<CellPlacement>> {
    let start = resolve_anchor(&zone.name, &zone.anchor, layout)?;
    let mut placements = place_zone(zone, &layout.key, start, occupied);
    if layout.rotation != 0.0 {
        for p in &mut placements {
            p.point.rotate(layout.rotation, Vec2::ZERO);
        }
    }
    Ok(placements)
}

/// New `{x, y, rotation}` for every cell of `zone` that has a key in `layout`.
pub fn recalculate_zone(zone: &Zone, layout: &Layout) -> Result<Vec<(KeyId, Point)>> {
    let placements = place_in_layout(zone, layout, |column, row| layout.key_at(&zone.name, column, row).is_some())?;

    Ok(placements
        .into_iter()
        .filter_map(|p| layout.key_at(&zone.name, &p.column, &p.row).map(|k| (k.id, p.point)))
        .collect())
}

/// Keys for every non-skipped cell of `zone` that has no key in `layout` yet.
/// Each key captures the spread, stagger, splay and padding it was built with.
pub fn generate_zone_keys(zone: &Zone, layout: &Layout, ids: &mut dyn IdGenerator) -> Result<Vec<Key>> {
    let placements = place_in_layout(zone, layout, |_, _| true)?;

    let mut keys = Vec::new();
    for p in placements {
        if layout.key_at(&zone.name, &p.column, &p.row).is_some() {
            continue;
        }
        let mut key = Key::new(layout.fresh_id(ids), p.point.x, p.point.y).in_cell(&zone.name, &p.column, &p.row);
        key.rotation = p.point.r;
        key.width = p.key.width;
        key.height = p.key.height;
        key.overrides = KeyOverrides {
            spread: Some(p.column_key.spread),
            stagger: Some(p.column_key.stagger),
            splay: Some(p.column_key.splay),
            padding: Some(p.key.padding),
            ..Default::default()
        };
        keys.push(key);
    }
    Ok(keys)
}

/// Writes recalculated positions of a zone back into the layout.
/// Returns the number of keys that were updated.
pub fn apply_recalculation(layout: &mut Layout, zone_name: &str) -> Result<usize> {
    let Some(zone) = layout.zone(zone_name) else {
        return Ok(0);
    };
    let updates = recalculate_zone(zone, layout)?;
    let count = updates.len();
    for (id, point) in updates {
        if let Some(key) = layout.key_mut(id) {
            key.x = point.x;
            key.y = point.y;
            key.rotation = point.r;
        }
    }
    log::debug!("recalculated {count} keys of zone '{zone_name}'");
    Ok(count)
}

/// Lays out every zone again in declaration order, then refreshes all
/// mirrored counterparts. Used when a layout-wide setting changes.
pub fn recalculate_layout(layout: &mut Layout, ids: &mut dyn IdGenerator) -> Result<()> {
    let names: Vec<String> = layout.zones.iter().map(|z| z.name.clone()).collect();
    for name in &names {
        apply_recalculation(layout, name)?;
        sync_zone_mirror(layout, name, ids)?;
    }
    sync_mirrors(layout, ids)
}

// === Mirroring ===

/// X of the mirror axis: the referenced key (or the origin) plus half the
/// distance. `in_zone_frame` resolves the reference with the global rotation
/// undone.
pub fn mirror_axis(owner: &str, settings: &MirrorSettings, layout: &Layout, in_zone_frame: bool) -> Result<f64> {
    let x = match &settings.reference {
        Some(reference) => {
            let key = referenced_key(owner, reference, layout)?;
            if in_zone_frame { unrotated(key, layout.rotation).x } else { key.x }
        }
        None => 0.0,
    };
    Ok(x + settings.distance / 2.0)
}

fn mirrored_point(key: &Key, axis: f64, in_zone_frame: bool, rotation: f64) -> Point {
    if !in_zone_frame {
        let mut point = key.to_point();
        point.mirror(axis);
        return point;
    }
    let mut point = unrotated(key, rotation);
    point.mirror(axis);
    point.rotate(rotation, Vec2::ZERO);
    point
}

/// Creates, moves or drops the mirrored counterparts of one zone. With no
/// axis every counterpart of the zone is removed.
fn mirror_zone_keys(layout: &mut Layout, zone_name: &str, axis: Option<(f64, bool)>, ids: &mut dyn IdGenerator) {
    let targets: Vec<(KeyId, Point)> = match axis {
        Some((axis, in_zone_frame)) => layout
            .keys_in_zone(zone_name)
            .filter(|k| !k.mirrored)
            .map(|k| (k.id, mirrored_point(k, axis, in_zone_frame, layout.rotation)))
            .collect(),
        None => Vec::new(),
    };
    let mut existing: BTreeMap<KeyId, KeyId> = BTreeMap::new();
    let mut stale = Vec::new();
    for key in layout.keys_in_zone(zone_name).filter(|k| k.mirrored) {
        match key.mirror_of {
            Some(source) if targets.iter().any(|(id, _)| *id == source) && !existing.contains_key(&source) => {
                existing.insert(source, key.id);
            }
            _ => stale.push(key.id),
        }
    }
    for id in &stale {
        layout.remove_key(*id);
    }

    for (source_id, point) in targets {
        let Some(source) = layout.key(source_id) else {
            continue;
        };
        let mut key = source.clone();
        key.id = match existing.get(&source_id) {
            Some(id) => *id,
            None => layout.fresh_id(ids),
        };
        key.x = point.x;
        key.y = point.y;
        key.rotation = point.r;
        key.mirrored = true;
        key.mirror_of = Some(source_id);
        key.name = format!("mirror_{}", source.name);
        layout.keys.insert(key.id, key);
    }
    if !stale.is_empty() {
        log::debug!("dropped {} mirrored keys of zone '{zone_name}'", stale.len());
    }
}

/// Refreshes the counterparts of a zone that carries its own `mirror`.
/// Zones without one are left alone.
pub fn sync_zone_mirror(layout: &mut Layout, zone_name: &str, ids: &mut dyn IdGenerator) -> Result<()> {
    let Some(settings) = layout.zone(zone_name).and_then(|z| z.mirror.clone()) else {
        return Ok(());
    };
    let axis = mirror_axis(zone_name, &settings, layout, true)?;
    mirror_zone_keys(layout, zone_name, Some((axis, true)), ids);
    Ok(())
}

/// Refreshes the mirrored counterparts of every zone: a zone's own mirror
/// wins over the global one, and keys of zones covered by neither lose
/// their counterparts.
pub fn sync_mirrors(layout: &mut Layout, ids: &mut dyn IdGenerator) -> Result<()> {
    let global = match layout.mirror.clone() {
        Some(settings) => Some(mirror_axis("points.mirror", &settings, layout, false)?),
        None => None,
    };
    let names: Vec<String> = layout.zones.iter().map(|z| z.name.clone()).collect();
    for name in &names {
        let own = layout.zone(name).and_then(|z| z.mirror.clone());
        let axis = match own {
            Some(settings) => Some((mirror_axis(name, &settings, layout, true)?, true)),
            None => global.map(|axis| (axis, false)),
        };
        mirror_zone_keys(layout, name, axis, ids);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Column, KEY_UNIT, SequentialIds};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn spread_zone() -> Zone {
        let mut zone = Zone::with_grid("matrix", &["c1", "c2"], &["r1", "r2"]);
        zone.anchor = Anchor::at(10.0, 20.0);
        zone.columns[1].key = KeyOverrides {
            spread: Some(19.05),
            stagger: Some(5.0),
            splay: Some(0.0),
            ..Default::default()
        };
        zone
    }

    fn generated(zone: &Zone) -> Vec<Key> {
        let layout = Layout::new();
        generate_zone_keys(zone, &layout, &mut SequentialIds::new()).unwrap()
    }

    fn find<'a>(keys: &'a [Key], column: &str, row: &str) -> &'a Key {
        keys.iter().find(|k| k.column == column && k.row == row).unwrap()
    }

    #[test]
    fn second_column_uses_spread_and_stagger() {
        let keys = generated(&spread_zone());
        let key = find(&keys, "c2", "r1");
        assert!(approx(key.x, 10.0 + 19.05));
        assert!(approx(key.y, 20.0 + 5.0));
        assert_eq!(key.name, "matrix_c2_r1");
    }

    #[test]
    fn rows_advance_by_padding() {
        let keys = generated(&spread_zone());
        let key = find(&keys, "c1", "r2");
        assert!(approx(key.x, 10.0));
        assert!(approx(key.y, 20.0 + KEY_UNIT));
    }

    #[test]
    fn generation_is_deterministic() {
        let mut zone = spread_zone();
        zone.columns[1].key.splay = Some(-12.5);
        zone.rotate = 7.0;
        let a = generated(&zone);
        let b = generated(&zone);
        assert_eq!(a, b);
    }

    #[test]
    fn splay_rotates_every_following_column() {
        let mut zone = Zone::with_grid("z", &["a", "b", "c"], &["r"]);
        zone.columns[1].key.splay = Some(90.0);
        let keys = generated(&zone);

        // column b pivots around its own anchor, so stays put but is rotated
        let b = find(&keys, "b", "r");
        assert!(approx(b.x, KEY_UNIT));
        assert!(approx(b.y, 0.0));
        assert!(approx(b.rotation, 90.0));

        // column c is placed one spread further and swung around b's anchor
        let c = find(&keys, "c", "r");
        assert!(approx(c.x, KEY_UNIT));
        assert!(approx(c.y, KEY_UNIT));
        assert!(approx(c.rotation, 90.0));
    }

    #[test]
    fn missing_cells_only_advance_padding() {
        let zone = Zone::with_grid("z", &["a"], &["r1", "r2", "r3"]);
        let mut layout = Layout::new();
        layout.zones.push(zone.clone());
        let mut ids = SequentialIds::new();
        for key in generate_zone_keys(&zone, &layout, &mut ids).unwrap() {
            layout.keys.insert(key.id, key);
        }
        let middle = layout.key_at("z", "a", "r2").unwrap().id;
        layout.remove_key(middle);

        let updates = recalculate_zone(&zone, &layout).unwrap();
        assert_eq!(updates.len(), 2);
        let top = layout.key_at("z", "a", "r3").unwrap().id;
        let (_, p) = updates.iter().find(|(id, _)| *id == top).unwrap();
        assert!(approx(p.y, 2.0 * KEY_UNIT));
    }

    #[test]
    fn shift_is_applied_after_orient() {
        let mut zone = Zone::with_grid("z", &["a"], &["r"]);
        zone.columns[0].rows.insert(
            "r".to_string(),
            KeyOverrides {
                orient: Some(90.0),
                shift: Some(Vec2::new(1.0, 0.0)),
                rotate: Some(10.0),
                ..Default::default()
            },
        );
        let keys = generated(&zone);
        let k = find(&keys, "a", "r");
        assert!(approx(k.x, 0.0));
        assert!(approx(k.y, 1.0));
        assert!(approx(k.rotation, 100.0));
    }

    #[test]
    fn zone_rotate_turns_keys_around_anchor() {
        let mut zone = Zone::with_grid("z", &["a", "b"], &["r"]);
        zone.anchor = Anchor::at(5.0, 5.0);
        zone.rotate = 90.0;
        let keys = generated(&zone);
        let b = find(&keys, "b", "r");
        assert!(approx(b.x, 5.0));
        assert!(approx(b.y, 5.0 + KEY_UNIT));
        assert!(approx(b.rotation, 90.0));
    }

    #[test]
    fn row_override_beats_column_row_override() {
        let mut zone = Zone::with_grid("z", &["a"], &["r1", "r2"]);
        zone.key.padding = Some(10.0);
        zone.columns[0].rows.insert(
            "r1".to_string(),
            KeyOverrides {
                padding: Some(12.0),
                ..Default::default()
            },
        );
        zone.rows[0].key.padding = Some(15.0);
        let keys = generated(&zone);
        assert!(approx(find(&keys, "a", "r2").y, 15.0));
    }

    #[test]
    fn skipped_cells_are_not_generated() {
        let mut zone = Zone::with_grid("z", &["a"], &["r1", "r2"]);
        zone.columns[0].rows.insert(
            "r1".to_string(),
            KeyOverrides {
                skip: Some(true),
                ..Default::default()
            },
        );
        let keys = generated(&zone);
        assert_eq!(keys.len(), 1);
        assert!(approx(keys[0].y, KEY_UNIT));
    }

    #[test]
    fn anchor_reference_starts_from_named_key() {
        let mut layout = Layout::new();
        let mut base = Key::new(KeyId(1), 100.0, 50.0);
        base.name = "thumb_home".to_string();
        base.rotation = 90.0;
        layout.keys.insert(base.id, base);

        let mut zone = Zone::with_grid("z", &["a"], &["r"]);
        zone.anchor = Anchor {
            reference: Some("thumb_home".to_string()),
            shift: Vec2::new(10.0, 0.0),
            rotate: 0.0,
        };
        let p = resolve_anchor(&zone.name, &zone.anchor, &layout).unwrap();
        assert!(approx(p.x, 100.0));
        assert!(approx(p.y, 60.0));
        assert!(approx(p.r, 90.0));

        zone.anchor.reference = Some("nope".to_string());
        assert!(resolve_anchor(&zone.name, &zone.anchor, &layout).is_err());
    }

    #[test]
    fn generated_keys_capture_column_values() {
        let mut zone = spread_zone();
        zone.columns.push(Column::new("c3"));
        let keys = generated(&zone);
        let k = find(&keys, "c2", "r2");
        assert_eq!(k.overrides.stagger, Some(5.0));
        assert_eq!(k.overrides.spread, Some(19.05));
        assert_eq!(k.overrides.padding, Some(KEY_UNIT));
    }
}
