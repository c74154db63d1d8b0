use keylayout_engine::{IdGenerator, KeyId, LayoutError, LayoutMeta, Result, generator};

use crate::{Action, EditorState, KeyUpdate, Selection, operations};

/// Applies `action` to a copy of `state`.
///
/// Edits that do not apply (unknown ids, blocked insertions, duplicate names)
/// leave the state as it is. Only validation failures are reported as errors.
/// After every document edit the mirrored counterparts are brought in line
/// with their sources.
pub fn reduce(state: &EditorState, action: Action, ids: &mut dyn IdGenerator) -> Result<EditorState> {
    let mut next = state.clone();
    let changes_layout = action.changes_layout();
    let mut result = apply(&mut next, action, ids);
    if changes_layout && result.is_ok() {
        result = generator::sync_mirrors(&mut next.layout, ids);
        next.selection.prune(&next.layout);
    }
    match result {
        Ok(()) => Ok(next),
        Err(err @ LayoutError::ValidationFailed { .. }) => Err(err),
        Err(err) => {
            log::debug!("{err}");
            Ok(state.clone())
        }
    }
}

fn apply(state: &mut EditorState, action: Action, ids: &mut dyn IdGenerator) -> Result<()> {
    match action {
        // === Tool & Viewport ===
        Action::SetTool(tool) => state.tool = tool,
        Action::SetZoom(zoom) => {
            if !zoom.is_finite() {
                return Err(LayoutError::rejected(format!("zoom {zoom} is not finite")));
            }
            state.viewport.zoom = state.options.clamp_zoom(zoom);
        }
        Action::SetPan(pan) => state.viewport.pan = pan,
        Action::PanBy(delta) => state.viewport.pan = state.viewport.pan + delta,

        // === Selection ===
        Action::SetSelection(keys) => {
            state.selection.ids = keys.into_iter().filter(|id| state.layout.keys.contains_key(id)).collect();
        }
        Action::ExtendSelection(keys) => {
            state.selection.ids.extend(keys.into_iter().filter(|id| state.layout.keys.contains_key(id)));
        }
        Action::ClearSelection => state.selection.ids.clear(),
        Action::SelectAll => state.selection.ids = state.layout.keys.keys().copied().collect(),
        Action::SetActiveZone(zone) => {
            if let Some(name) = zone.as_ref().filter(|name| !state.layout.has_zone(name)) {
                return Err(LayoutError::rejected(format!("unknown zone '{name}'")));
            }
            state.selection.active_zone = zone;
        }
        Action::BeginSelectionRect(p) => {
            state.selection.rect.start = p;
            state.selection.rect.end = p;
            state.selection.rect.active = true;
        }
        Action::UpdateSelectionRect(p) => {
            if !state.selection.rect.active {
                return Err(LayoutError::rejected("no selection rectangle in progress"));
            }
            state.selection.rect.end = p;
        }
        Action::EndSelectionRect => {
            if !state.selection.rect.active {
                return Err(LayoutError::rejected("no selection rectangle in progress"));
            }
            let rect = state.selection.rect;
            state.selection.ids = state.layout.keys.values().filter(|k| rect.contains(k.position())).map(|k| k.id).collect();
            state.selection.rect.active = false;
        }

        // === Keys ===
        Action::AddKey(key) => {
            let id = key.id;
            if !state.layout.insert_key(key) {
                return Err(LayoutError::rejected(format!("key {id} or its cell is already taken")));
            }
        }
        Action::AddKeyInDirection { reference, direction } => {
            let id = operations::add_key_in_direction(&mut state.layout, reference, direction, ids)?;
            state.selection.ids = [id].into();
        }
        Action::UpdateKey { id, update } => update_key(state, id, update)?,
        Action::DeleteKeys(keys) => delete_keys(state, &keys)?,
        Action::DeleteSelected => {
            let keys: Vec<_> = state.selection.ids.iter().copied().collect();
            delete_keys(state, &keys)?;
        }
        Action::MoveSelected(delta) => {
            let keys: Vec<_> = state.selection.ids.iter().copied().collect();
            operations::move_keys(&mut state.layout, &keys, delta, &state.grid)?;
        }
        Action::RotateSelected { angle, origin } => {
            let keys: Vec<_> = state.selection.ids.iter().copied().collect();
            operations::rotate_keys(&mut state.layout, &keys, angle, origin)?;
        }
        Action::MirrorSelected(axis) => {
            let keys: Vec<_> = state.selection.ids.iter().copied().collect();
            let created = operations::mirror_keys(&mut state.layout, &keys, axis, ids)?;
            state.selection.ids = created.into_iter().collect();
        }
        Action::Copy => {
            let keys: Vec<_> = state.selection.ids.iter().copied().collect();
            state.clipboard = operations::copy_keys(&state.layout, &keys);
        }
        Action::Paste => {
            let created = operations::paste_keys(&mut state.layout, &state.clipboard, state.options.paste_offset, ids)?;
            state.selection.ids = created.into_iter().collect();
        }

        // === Zones ===
        Action::AddZone(zone) => operations::add_zone(&mut state.layout, zone, ids)?,
        Action::UpdateZone { name, update } => operations::update_zone(&mut state.layout, &name, update, ids)?,
        Action::DeleteZone(name) => {
            let removed = operations::delete_zone(&mut state.layout, &name)?;
            log::debug!("deleted zone '{name}' with {removed} keys");
            state.selection.prune(&state.layout);
        }
        Action::AddColumn { zone, column } => operations::add_column(&mut state.layout, &zone, column, ids)?,
        Action::RemoveColumn { zone, column } => {
            operations::remove_column(&mut state.layout, &zone, &column, ids)?;
            state.selection.prune(&state.layout);
        }
        Action::AddRow { zone, row } => operations::add_row(&mut state.layout, &zone, row, ids)?,
        Action::RemoveRow { zone, row } => {
            operations::remove_row(&mut state.layout, &zone, &row, ids)?;
            state.selection.prune(&state.layout);
        }

        // === Document ===
        Action::SetLayout(layout) => {
            state.layout = layout;
            state.selection = Selection::default();
        }
        Action::SetMirror(mirror) => state.layout.mirror = mirror,
        Action::SetRotation(rotation) => {
            if !rotation.is_finite() {
                return Err(LayoutError::rejected(format!("rotation {rotation} is not finite")));
            }
            state.layout.rotation = rotation;
            generator::recalculate_layout(&mut state.layout, ids)?;
        }
        Action::UpdateMeta(update) => {
            let meta = &mut state.layout.meta;
            if let Some(engine) = update.engine {
                LayoutMeta::validate_engine(&engine)?;
                meta.engine = engine.trim().to_string();
            }
            if let Some(author) = update.author {
                meta.author = Some(author).filter(|s| !s.is_empty());
            }
            if let Some(name) = update.name {
                meta.name = Some(name).filter(|s| !s.is_empty());
            }
            if let Some(version) = update.version {
                meta.version = Some(version).filter(|s| !s.is_empty());
            }
        }

        // === History ===
        Action::PushHistory(description) => state.history.push(state.layout.clone(), description),
        Action::Undo => {
            let Some(layout) = state.history.undo() else {
                return Err(LayoutError::rejected("nothing to undo"));
            };
            state.layout = (*layout).clone();
            state.selection.ids.clear();
            state.selection.prune(&state.layout);
        }
        Action::Redo => {
            let Some(layout) = state.history.redo() else {
                return Err(LayoutError::rejected("nothing to redo"));
            };
            state.layout = (*layout).clone();
            state.selection.ids.clear();
            state.selection.prune(&state.layout);
        }

        // === Grid ===
        Action::ToggleGrid => state.grid.visible = !state.grid.visible,
        Action::ToggleSnap => state.grid.snap = !state.grid.snap,
        Action::SetGridSize(size) => {
            if !(size.is_finite() && size > 0.0) {
                return Err(LayoutError::rejected(format!("grid size {size} must be positive")));
            }
            state.grid.size = size;
        }
        Action::ToggleRotationLock => state.grid.rotation_lock = !state.grid.rotation_lock,
    }
    Ok(())
}

fn update_key(state: &mut EditorState, id: KeyId, update: KeyUpdate) -> Result<()> {
    let Some(key) = state.layout.key_mut(id) else {
        return Err(LayoutError::rejected(format!("unknown key {id}")));
    };
    if let Some(x) = update.x {
        key.x = x;
    }
    if let Some(y) = update.y {
        key.y = y;
    }
    if let Some(width) = update.width {
        key.width = width;
    }
    if let Some(height) = update.height {
        key.height = height;
    }
    if let Some(rotation) = update.rotation {
        key.rotation = rotation;
    }
    if let Some(origin) = update.rotation_origin {
        key.rotation_origin = origin;
    }
    if let Some(name) = update.name {
        key.name = name;
    }
    if let Some(color) = update.color {
        key.color = color;
    }
    if let Some(metadata) = update.metadata {
        key.metadata = metadata;
    }
    if let Some(overrides) = update.overrides {
        key.overrides = overrides;
    }
    Ok(())
}

fn delete_keys(state: &mut EditorState, keys: &[KeyId]) -> Result<()> {
    let removed = keys.iter().filter(|id| state.layout.remove_key(**id).is_some()).count();
    if removed == 0 {
        return Err(LayoutError::rejected("none of the keys to delete exist"));
    }
    state.selection.prune(&state.layout);
    Ok(())
}
