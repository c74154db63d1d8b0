use std::collections::BTreeSet;

use crate::{ANGLE_TOLERANCE, Anchor, Column, KEY_UNIT, Key, KeyOverrides, POSITION_TOLERANCE, Point, Row, Vec2, Zone};

/// A zone reconstructed from loose keys plus the cells that actually hold one.
#[derive(Clone, Debug, PartialEq)]
pub struct InferredZone {
    pub zone: Zone,
    pub cells: BTreeSet<(String, String)>,
}

fn round(v: f64) -> f64 {
    (v * 1_000_000.0).round() / 1_000_000.0
}

fn near(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Distance of `key` from `base` along the base key's own up axis.
fn offset_along_column(base: &Key, key: &Key) -> f64 {
    let up = Vec2::new(0.0, 1.0).rotated(base.rotation);
    let d = key.position() - base.position();
    d.x * up.x + d.y * up.y
}

/// One inferred column: keys with their offset from the lowest one.
struct ColumnKeys<'a> {
    base: &'a Key,
    keys: Vec<(&'a Key, f64)>,
}

fn column_keys<'a>(cluster: &[&'a Key]) -> ColumnKeys<'a> {
    let first = cluster[0];
    let mut keys: Vec<(&Key, f64)> = cluster.iter().map(|k| (*k, offset_along_column(first, k))).collect();
    keys.sort_by(|a, b| a.1.total_cmp(&b.1));
    let base = keys[0].0;
    let lowest = keys[0].1;
    for entry in &mut keys {
        entry.1 -= lowest;
    }
    ColumnKeys { base, keys }
}

/// Distinct offsets, merged when closer than [`POSITION_TOLERANCE`].
fn levels_of(columns: &[ColumnKeys]) -> Vec<f64> {
    let mut offsets: Vec<f64> = columns.iter().flat_map(|c| c.keys.iter().map(|(_, o)| *o)).collect();
    offsets.sort_by(f64::total_cmp);
    let mut levels: Vec<f64> = Vec::new();
    for offset in offsets {
        match levels.last() {
            Some(last) if offset - last <= POSITION_TOLERANCE => {}
            _ => levels.push(offset),
        }
    }
    levels
}

fn level_index(levels: &[f64], offset: f64) -> usize {
    levels
        .iter()
        .enumerate()
        .min_by(|a, b| (a.1 - offset).abs().total_cmp(&(b.1 - offset).abs()))
        .map_or(0, |(i, _)| i)
}

/// Groups keys into a best-effort zone.
///
/// Columns are clusters of keys whose X lies within [`POSITION_TOLERANCE`] of
/// the cluster start, ordered left to right. Inside a column keys are
/// measured along the column's up axis from its lowest key; those offsets,
/// merged across all columns, become the rows, so the row count is the
/// number of distinct levels. Spread, stagger and splay are the deltas
/// between column bases with the splay rotations of earlier columns undone,
/// which is how the generator accumulates them.
pub fn infer_zone(name: &str, keys: &[&Key]) -> Option<InferredZone> {
    if keys.is_empty() {
        return None;
    }

    let mut sorted: Vec<&Key> = keys.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

    let mut clusters: Vec<Vec<&Key>> = Vec::new();
    for key in sorted {
        match clusters.last_mut() {
            Some(cluster) if near(cluster[0].x, key.x, POSITION_TOLERANCE) => cluster.push(key),
            _ => clusters.push(vec![key]),
        }
    }
    let columns: Vec<ColumnKeys> = clusters.iter().map(|c| column_keys(c)).collect();
    let levels = levels_of(&columns);
    let gaps: Vec<f64> = levels.windows(2).map(|w| w[1] - w[0]).collect();

    let mut zone = Zone::new(name);
    let first = columns[0].base;
    zone.anchor = Anchor {
        reference: None,
        shift: Vec2::new(round(first.x), round(first.y)),
        rotate: if near(first.rotation, 0.0, ANGLE_TOLERANCE) { 0.0 } else { round(first.rotation) },
    };

    zone.rows = (1..=levels.len()).map(|n| Row::new(format!("row{n}"))).collect();
    let uniform = gaps.iter().all(|gap| near(*gap, gaps[0], POSITION_TOLERANCE));
    if uniform {
        if let Some(gap) = gaps.first().filter(|gap| !near(**gap, KEY_UNIT, POSITION_TOLERANCE)) {
            zone.key.padding = Some(round(*gap));
        }
    } else {
        for (row, gap) in zone.rows.iter_mut().zip(&gaps) {
            if !near(*gap, KEY_UNIT, POSITION_TOLERANCE) {
                row.key.padding = Some(round(*gap));
            }
        }
    }

    let mut cells = BTreeSet::new();
    // unrotated column anchor of the previous column and the splays recorded so far
    let mut previous = first.position();
    let mut rotations: Vec<(f64, Vec2)> = Vec::new();
    for (i, column) in columns.iter().enumerate() {
        let column_name = format!("col{}", i + 1);
        let base = column.base;
        let mut key = KeyOverrides::default();
        if i > 0 {
            let mut anchor = Point::new(base.x, base.y, 0.0);
            for (angle, origin) in rotations.iter().rev() {
                anchor.rotate(-angle, *origin);
            }
            let spread = anchor.x - previous.x;
            let stagger = anchor.y - previous.y;
            let splay = base.rotation - columns[i - 1].base.rotation;
            if !near(spread, KEY_UNIT, POSITION_TOLERANCE) {
                key.spread = Some(round(spread));
            }
            if !near(stagger, 0.0, POSITION_TOLERANCE) {
                key.stagger = Some(round(stagger));
            }
            if !near(splay, 0.0, ANGLE_TOLERANCE) {
                key.splay = Some(round(splay));
                rotations.push((splay, anchor.position()));
            }
            previous = anchor.position();
        }
        zone.columns.push(Column::new(column_name.clone()).with_key(key));

        for (_, offset) in &column.keys {
            cells.insert((column_name.clone(), format!("row{}", level_index(&levels, *offset) + 1)));
        }
    }

    if cells.len() < keys.len() {
        log::warn!("{} keys collapsed onto shared cells while inferring zone '{name}'", keys.len() - cells.len());
    }
    Some(InferredZone { zone, cells })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyId;

    fn key(id: u64, x: f64, y: f64) -> Key {
        Key::new(KeyId(id), x, y)
    }

    fn rotated(id: u64, x: f64, y: f64, r: f64) -> Key {
        let mut k = key(id, x, y);
        k.rotation = r;
        k
    }

    #[test]
    fn clusters_columns_and_rows() {
        let keys = [
            key(1, 0.0, 0.0),
            key(2, 0.05, KEY_UNIT),
            key(3, KEY_UNIT, 4.0),
            key(4, KEY_UNIT, 4.0 + KEY_UNIT),
            key(5, 2.0 * KEY_UNIT, 4.0 + KEY_UNIT),
        ];
        let refs: Vec<&Key> = keys.iter().collect();
        let inferred = infer_zone("matrix", &refs).unwrap();
        let zone = inferred.zone;

        assert_eq!(zone.columns.len(), 3);
        assert_eq!(zone.rows.len(), 2);
        assert_eq!(zone.columns[1].key.stagger, Some(4.0));
        assert_eq!(zone.columns[1].key.spread, None);
        assert_eq!(zone.columns[2].key.stagger, Some(KEY_UNIT));
        assert!(inferred.cells.contains(&("col1".to_string(), "row2".to_string())));
        assert_eq!(inferred.cells.len(), 5);
    }

    #[test]
    fn gaps_inside_a_column_become_missing_rows() {
        let keys = [key(1, 0.0, 0.0), key(2, 0.0, KEY_UNIT), key(3, 0.0, 3.0 * KEY_UNIT), key(4, KEY_UNIT, 2.0 * KEY_UNIT)];
        let refs: Vec<&Key> = keys.iter().collect();
        let inferred = infer_zone("matrix", &refs).unwrap();
        assert_eq!(inferred.zone.rows.len(), 3);
        assert!(inferred.cells.contains(&("col1".to_string(), "row3".to_string())));
        assert_eq!(inferred.zone.columns[1].key.stagger, Some(2.0 * KEY_UNIT));
    }

    #[test]
    fn irregular_gaps_give_one_row_per_level() {
        let keys = [key(1, 0.0, 0.0), key(2, 0.0, 0.2), key(3, 0.0, 2000.0)];
        let refs: Vec<&Key> = keys.iter().collect();
        let inferred = infer_zone("matrix", &refs).unwrap();
        let zone = &inferred.zone;

        assert_eq!(zone.rows.len(), 3);
        assert_eq!(inferred.cells.len(), 3);
        assert_eq!(zone.key.padding, None);
        assert_eq!(zone.rows[0].key.padding, Some(0.2));
        assert_eq!(zone.rows[1].key.padding, Some(1999.8));
    }

    #[test]
    fn rotation_delta_becomes_splay() {
        let a = rotated(1, 0.0, 0.0, 0.0);
        let b = rotated(2, 20.0, 0.0, -10.0);
        let inferred = infer_zone("m", &[&a, &b]).unwrap();
        assert_eq!(inferred.zone.columns[1].key.splay, Some(-10.0));
        assert_eq!(inferred.zone.columns[1].key.spread, Some(20.0));
    }

    #[test]
    fn later_columns_are_measured_in_the_splayed_frame() {
        let a = rotated(1, 0.0, 0.0, 0.0);
        let b = rotated(2, 20.0, 0.0, -10.0);
        let c = rotated(3, 40.0, 0.0, -20.0);
        let inferred = infer_zone("m", &[&a, &b, &c]).unwrap();
        let column = &inferred.zone.columns[2].key;

        let (sin, cos) = 10f64.to_radians().sin_cos();
        assert!((column.spread.unwrap() - 20.0 * cos).abs() < 1e-6);
        assert!((column.stagger.unwrap() - 20.0 * sin).abs() < 1e-6);
        assert_eq!(column.splay, Some(-10.0));
    }
}
