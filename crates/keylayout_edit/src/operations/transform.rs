use keylayout_engine::{IdGenerator, KeyId, Layout, LayoutError, Result, Vec2, normalize_angle};

use crate::{GridSettings, MirrorAxis};

fn existing(layout: &Layout, ids: &[KeyId]) -> Result<Vec<KeyId>> {
    let found: Vec<KeyId> = ids.iter().copied().filter(|id| layout.keys.contains_key(id)).collect();
    if found.is_empty() {
        return Err(LayoutError::rejected("no keys to transform"));
    }
    Ok(found)
}

/// Moves keys by `delta`.
///
/// Without rotation lock the delta is taken in each key's own frame, so a
/// rotated key moves along its rotated axes. With snapping enabled the
/// resulting position is rounded to the grid.
pub fn move_keys(layout: &mut Layout, ids: &[KeyId], delta: Vec2, grid: &GridSettings) -> Result<()> {
    for id in existing(layout, ids)? {
        let Some(key) = layout.key_mut(id) else {
            continue;
        };
        let step = if grid.rotation_lock { delta } else { delta.rotated(-key.rotation) };
        let mut position = key.position() + step;
        if grid.snap {
            position = Vec2::new(grid.snap_value(position.x), grid.snap_value(position.y));
        }
        key.set_position(position);
    }
    Ok(())
}

/// Average position of the given keys.
pub fn centroid(layout: &Layout, ids: &[KeyId]) -> Option<Vec2> {
    let positions: Vec<Vec2> = ids.iter().filter_map(|id| layout.key(*id)).map(|k| k.position()).collect();
    if positions.is_empty() {
        return None;
    }
    let sum = positions.iter().fold(Vec2::ZERO, |acc, p| acc + *p);
    let n = positions.len() as f64;
    Some(Vec2::new(sum.x / n, sum.y / n))
}

/// Rotates keys around `origin` (their centroid if `None`) and adds `angle`
/// to their rotation, normalized to (-180, 180].
pub fn rotate_keys(layout: &mut Layout, ids: &[KeyId], angle: f64, origin: Option<Vec2>) -> Result<()> {
    let ids = existing(layout, ids)?;
    let origin = match origin {
        Some(origin) => origin,
        None => centroid(layout, &ids).unwrap_or(Vec2::ZERO),
    };
    for id in ids {
        if let Some(key) = layout.key_mut(id) {
            key.set_position(key.position().rotated_around(angle, origin));
            key.rotation = normalize_angle(key.rotation + angle);
        }
    }
    Ok(())
}

/// Creates mirrored copies of keys and returns their ids.
///
/// The axis lies half a millimeter past the largest coordinate of the
/// selection. Copies are detached from their zone and point back at their
/// source through `mirror_of`.
pub fn mirror_keys(layout: &mut Layout, ids: &[KeyId], axis: MirrorAxis, id_gen: &mut dyn IdGenerator) -> Result<Vec<KeyId>> {
    let ids = existing(layout, ids)?;
    let coordinate = |p: Vec2| match axis {
        MirrorAxis::Vertical => p.x,
        MirrorAxis::Horizontal => p.y,
    };
    let line = ids
        .iter()
        .filter_map(|id| layout.key(*id))
        .map(|k| coordinate(k.position()))
        .fold(f64::NEG_INFINITY, f64::max)
        + 0.5;

    let mut created = Vec::new();
    for id in ids {
        let Some(source) = layout.key(id) else {
            continue;
        };
        let mut key = source.clone();
        key.id = layout.fresh_id(id_gen);
        match axis {
            MirrorAxis::Vertical => {
                key.x = 2.0 * line - source.x;
                key.rotation_origin.x = -source.rotation_origin.x;
            }
            MirrorAxis::Horizontal => {
                key.y = 2.0 * line - source.y;
                key.rotation_origin.y = -source.rotation_origin.y;
            }
        }
        key.rotation = -source.rotation;
        key.mirrored = !source.mirrored;
        key.mirror_of = Some(source.id);
        key.zone.clear();
        key.column.clear();
        key.row.clear();
        if !source.name.is_empty() {
            key.name = format!("mirror_{}", source.name);
        }
        let id = key.id;
        if layout.insert_key(key) {
            created.push(id);
        }
    }
    log::debug!("mirrored {} keys across {axis:?} axis at {line}", created.len());
    Ok(created)
}

#[cfg(test)]
mod tests {
    use keylayout_engine::{Key, SequentialIds};

    use super::*;

    fn layout_with(keys: &[(u64, f64, f64, f64)]) -> Layout {
        let mut layout = Layout::new();
        for (id, x, y, r) in keys {
            let mut key = Key::new(KeyId(*id), *x, *y);
            key.rotation = *r;
            layout.keys.insert(key.id, key);
        }
        layout
    }

    #[test]
    fn snap_rounds_to_grid() {
        let mut layout = layout_with(&[(1, 0.0, 0.0, 0.0)]);
        let grid = GridSettings {
            visible: true,
            snap: true,
            size: 5.0,
            rotation_lock: false,
        };
        move_keys(&mut layout, &[KeyId(1)], Vec2::new(6.0, 12.6), &grid).unwrap();
        assert_eq!(layout.key(KeyId(1)).unwrap().position(), Vec2::new(5.0, 15.0));
    }

    #[test]
    fn rotate_about_centroid() {
        let mut layout = layout_with(&[(1, 0.0, 0.0, 170.0), (2, 10.0, 0.0, 0.0)]);
        rotate_keys(&mut layout, &[KeyId(1), KeyId(2)], 180.0, None).unwrap();
        let a = layout.key(KeyId(1)).unwrap();
        assert!((a.x - 10.0).abs() < 1e-9);
        assert!(a.y.abs() < 1e-9);
        assert_eq!(a.rotation, -10.0);
        assert_eq!(layout.key(KeyId(2)).unwrap().rotation, 180.0);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut layout = layout_with(&[(1, 0.0, 0.0, 0.0)]);
        assert!(rotate_keys(&mut layout, &[KeyId(7)], 10.0, None).is_err());
        assert!(mirror_keys(&mut layout, &[], MirrorAxis::Vertical, &mut SequentialIds::starting_at(10)).is_err());
    }

    #[test]
    fn horizontal_mirror_flips_y() {
        let mut layout = layout_with(&[(1, 3.0, 2.0, 15.0), (2, 3.0, 8.0, 0.0)]);
        let created = mirror_keys(&mut layout, &[KeyId(1), KeyId(2)], MirrorAxis::Horizontal, &mut SequentialIds::starting_at(10)).unwrap();
        assert_eq!(created, vec![KeyId(10), KeyId(11)]);
        let key = layout.key(KeyId(10)).unwrap();
        assert_eq!(key.y, 2.0 * 8.5 - 2.0);
        assert_eq!(key.x, 3.0);
        assert_eq!(key.rotation, -15.0);
        assert_eq!(key.mirror_of, Some(KeyId(1)));
    }
}
