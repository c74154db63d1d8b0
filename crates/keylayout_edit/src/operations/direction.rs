//! Inserting keys next to an existing key
//!
//! Column and row names carry a trailing number (`col2`, `row3`). Inserting
//! left/right steps that number on the column, up/down on the row, and the
//! new key lands one key unit away from the reference.

use std::collections::BTreeSet;

use keylayout_engine::{Column, IdGenerator, KEY_UNIT, Key, KeyId, Layout, LayoutError, Result, Row, Vec2};

use crate::Direction;

/// Splits `name` into its non-numeric prefix and trailing number.
pub fn split_suffix(name: &str) -> (&str, Option<u64>) {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let (prefix, number) = name.split_at(name.len() - digits);
    (prefix, number.parse().ok())
}

/// Trailing number of a column or row name, 1 if there is none.
pub fn suffix_index(name: &str) -> i64 {
    split_suffix(name).1.map_or(1, |n| n as i64)
}

/// Name one step away from `name`, or `None` if the index would drop below 1.
pub fn step_name(name: &str, step: i64) -> Option<String> {
    let (prefix, _) = split_suffix(name);
    let index = suffix_index(name) + step;
    if index < 1 {
        return None;
    }
    Some(format!("{prefix}{index}"))
}

/// Column and row the new key would get.
fn target_slot(key: &Key, direction: Direction) -> Option<(String, String)> {
    if direction.is_horizontal() {
        Some((step_name(&key.column, direction.step())?, key.row.clone()))
    } else {
        Some((key.column.clone(), step_name(&key.row, direction.step())?))
    }
}

fn offset(direction: Direction) -> Vec2 {
    match direction {
        Direction::Up => Vec2::new(0.0, KEY_UNIT),
        Direction::Down => Vec2::new(0.0, -KEY_UNIT),
        Direction::Left => Vec2::new(-KEY_UNIT, 0.0),
        Direction::Right => Vec2::new(KEY_UNIT, 0.0),
    }
}

/// Directions in which no key can be inserted next to `key`: the index would
/// drop to zero, or a key of the same zone already has the target numbers.
pub fn blocked_directions(key: &Key, layout: &Layout) -> BTreeSet<Direction> {
    let mut blocked = BTreeSet::new();
    for direction in Direction::ALL {
        let Some((column, row)) = target_slot(key, direction) else {
            blocked.insert(direction);
            continue;
        };
        let (column, row) = (suffix_index(&column), suffix_index(&row));
        let taken = layout
            .keys
            .values()
            .any(|k| k.id != key.id && k.zone == key.zone && suffix_index(&k.column) == column && suffix_index(&k.row) == row);
        if taken {
            blocked.insert(direction);
        }
    }
    blocked
}

/// Adds a copy of `reference` one key unit away in `direction` and returns
/// its id. A column or row that the zone does not know yet is inserted next
/// to the reference's one.
pub fn add_key_in_direction(layout: &mut Layout, reference: KeyId, direction: Direction, ids: &mut dyn IdGenerator) -> Result<KeyId> {
    let Some(source) = layout.key(reference) else {
        return Err(LayoutError::rejected(format!("unknown key {reference}")));
    };
    if layout.is_mirror_counterpart(source) {
        return Err(LayoutError::rejected(format!("{reference} is a mirrored counterpart")));
    }
    if blocked_directions(source, layout).contains(&direction) {
        return Err(LayoutError::rejected(format!("{direction:?} of {reference} is blocked")));
    }
    let Some((column, row)) = target_slot(source, direction) else {
        return Err(LayoutError::rejected(format!("{direction:?} of {reference} is blocked")));
    };

    let mut key = source.clone();
    key.id = layout.fresh_id(ids);
    key.set_position(source.position() + offset(direction));
    key.mirrored = false;
    key.mirror_of = None;
    if !source.zone.is_empty() {
        key.name = Key::cell_name(&source.zone, &column, &row);
    }
    key.column = column.clone();
    key.row = row.clone();

    let (ref_column, ref_row) = (source.column.clone(), source.row.clone());
    if let Some(zone) = layout.zone_mut(&key.zone) {
        if direction.is_horizontal() && zone.column(&column).is_none() {
            let at = zone.column_index(&ref_column).map_or(zone.columns.len(), |i| if direction.step() > 0 { i + 1 } else { i });
            zone.columns.insert(at, Column::new(column));
        }
        if !direction.is_horizontal() && zone.row(&row).is_none() {
            let at = zone.row_index(&ref_row).map_or(zone.rows.len(), |i| if direction.step() > 0 { i + 1 } else { i });
            zone.rows.insert(at, Row::new(row));
        }
    }

    let id = key.id;
    if !layout.insert_key(key) {
        return Err(LayoutError::rejected(format!("target cell of {direction:?} from {reference} is taken")));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_parsing() {
        assert_eq!(split_suffix("col12"), ("col", Some(12)));
        assert_eq!(split_suffix("pinky"), ("pinky", None));
        assert_eq!(split_suffix("42"), ("", Some(42)));
        assert_eq!(suffix_index("home"), 1);
        assert_eq!(step_name("row1", -1), None);
        assert_eq!(step_name("row1", 1).as_deref(), Some("row2"));
        assert_eq!(step_name("thumb", 1).as_deref(), Some("thumb2"));
    }
}
