//! Structural zone edits
//!
//! Every change to a zone's columns or rows is followed by a key sync:
//! keys of cells that no longer exist are deleted, newly introduced cells
//! get generated keys and the zone is laid out again.

use std::collections::BTreeSet;

use keylayout_engine::{Column, IdGenerator, Layout, LayoutError, Result, Row, Zone, generator};

use crate::ZoneUpdate;

type Cells = BTreeSet<(String, String)>;

fn cells_of(zone: &Zone) -> Cells {
    zone.cells().map(|(c, r)| (c.to_string(), r.to_string())).collect()
}

fn zone_cells(layout: &Layout, name: &str) -> Result<Cells> {
    layout.zone(name).map(cells_of).ok_or_else(|| LayoutError::rejected(format!("unknown zone '{name}'")))
}

/// Brings the keys of zone `name` in line with its cells. Only cells that
/// were not part of `before` receive new keys, so deleted keys stay deleted.
pub fn sync_zone_keys(layout: &mut Layout, name: &str, before: &Cells, ids: &mut dyn IdGenerator) -> Result<()> {
    let Some(zone) = layout.zone(name) else {
        return Err(LayoutError::rejected(format!("unknown zone '{name}'")));
    };
    zone.validate()?;

    let stale: Vec<_> = layout
        .keys_in_zone(name)
        .filter(|k| !zone.has_cell(&k.column, &k.row))
        .map(|k| k.id)
        .collect();
    for id in &stale {
        layout.remove_key(*id);
    }

    let Some(zone) = layout.zone(name) else {
        return Ok(());
    };
    let created: Vec<_> = generator::generate_zone_keys(zone, layout, ids)?
        .into_iter()
        .filter(|k| !before.contains(&(k.column.clone(), k.row.clone())))
        .collect();
    let created_count = created.len();
    for key in created {
        layout.insert_key(key);
    }

    recalculate_from(layout, name, ids)?;
    log::debug!("synced zone '{name}': {} keys removed, {created_count} added", stale.len());
    Ok(())
}

/// Recalculates `name` and every later zone anchored on a key, since those
/// may reference keys that just moved. Zone mirrors follow each zone so a
/// later anchor may reference a mirrored key.
fn recalculate_from(layout: &mut Layout, name: &str, ids: &mut dyn IdGenerator) -> Result<()> {
    let Some(start) = layout.zones.iter().position(|z| z.name == name) else {
        return Ok(());
    };
    let dependent: Vec<String> = layout.zones[start..]
        .iter()
        .enumerate()
        .filter(|(i, z)| *i == 0 || z.anchor.reference.is_some())
        .map(|(_, z)| z.name.clone())
        .collect();
    for zone in dependent {
        generator::apply_recalculation(layout, &zone)?;
        generator::sync_zone_mirror(layout, &zone, ids)?;
    }
    Ok(())
}

pub fn add_zone(layout: &mut Layout, zone: Zone, ids: &mut dyn IdGenerator) -> Result<()> {
    if layout.has_zone(&zone.name) {
        return Err(LayoutError::rejected(format!("zone '{}' already exists", zone.name)));
    }
    zone.validate()?;
    let name = zone.name.clone();
    layout.zones.push(zone);
    sync_zone_keys(layout, &name, &Cells::new(), ids)
}

pub fn update_zone(layout: &mut Layout, name: &str, update: ZoneUpdate, ids: &mut dyn IdGenerator) -> Result<()> {
    let before = zone_cells(layout, name)?;
    let Some(zone) = layout.zone_mut(name) else {
        return Err(LayoutError::rejected(format!("unknown zone '{name}'")));
    };
    if let Some(anchor) = update.anchor {
        zone.anchor = anchor;
    }
    if let Some(key) = update.key {
        zone.key = key;
    }
    if let Some(columns) = update.columns {
        zone.columns = columns;
    }
    if let Some(rows) = update.rows {
        zone.rows = rows;
    }
    if let Some(rotate) = update.rotate {
        zone.rotate = rotate;
    }
    if let Some(mirror) = update.mirror {
        zone.mirror = mirror;
    }
    sync_zone_keys(layout, name, &before, ids)
}

/// Removes a zone together with every key placed in it.
pub fn delete_zone(layout: &mut Layout, name: &str) -> Result<usize> {
    let Some(index) = layout.zones.iter().position(|z| z.name == name) else {
        return Err(LayoutError::rejected(format!("unknown zone '{name}'")));
    };
    layout.zones.remove(index);
    let members: Vec<_> = layout.keys.values().filter(|k| k.zone == name).map(|k| k.id).collect();
    for id in &members {
        layout.remove_key(*id);
    }
    Ok(members.len())
}

pub fn add_column(layout: &mut Layout, zone: &str, column: Column, ids: &mut dyn IdGenerator) -> Result<()> {
    let before = zone_cells(layout, zone)?;
    let Some(z) = layout.zone_mut(zone) else {
        return Err(LayoutError::rejected(format!("unknown zone '{zone}'")));
    };
    if z.column(&column.name).is_some() {
        return Err(LayoutError::rejected(format!("column '{}' already exists in zone '{zone}'", column.name)));
    }
    z.columns.push(column);
    sync_zone_keys(layout, zone, &before, ids)
}

pub fn remove_column(layout: &mut Layout, zone: &str, column: &str, ids: &mut dyn IdGenerator) -> Result<()> {
    let before = zone_cells(layout, zone)?;
    let Some(z) = layout.zone_mut(zone) else {
        return Err(LayoutError::rejected(format!("unknown zone '{zone}'")));
    };
    let Some(index) = z.column_index(column) else {
        return Err(LayoutError::rejected(format!("no column '{column}' in zone '{zone}'")));
    };
    z.columns.remove(index);
    sync_zone_keys(layout, zone, &before, ids)
}

pub fn add_row(layout: &mut Layout, zone: &str, row: Row, ids: &mut dyn IdGenerator) -> Result<()> {
    let before = zone_cells(layout, zone)?;
    let Some(z) = layout.zone_mut(zone) else {
        return Err(LayoutError::rejected(format!("unknown zone '{zone}'")));
    };
    if z.row(&row.name).is_some() {
        return Err(LayoutError::rejected(format!("row '{}' already exists in zone '{zone}'", row.name)));
    }
    z.rows.push(row);
    sync_zone_keys(layout, zone, &before, ids)
}

pub fn remove_row(layout: &mut Layout, zone: &str, row: &str, ids: &mut dyn IdGenerator) -> Result<()> {
    let before = zone_cells(layout, zone)?;
    let Some(z) = layout.zone_mut(zone) else {
        return Err(LayoutError::rejected(format!("unknown zone '{zone}'")));
    };
    let Some(index) = z.row_index(row) else {
        return Err(LayoutError::rejected(format!("no row '{row}' in zone '{zone}'")));
    };
    z.rows.remove(index);
    for column in &mut z.columns {
        column.rows.remove(row);
    }
    sync_zone_keys(layout, zone, &before, ids)
}
