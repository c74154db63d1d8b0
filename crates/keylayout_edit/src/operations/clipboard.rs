use keylayout_engine::{IdGenerator, Key, KeyId, Layout, LayoutError, Result, Vec2};

/// Snapshot of the given keys, in id order.
pub fn copy_keys(layout: &Layout, ids: &[KeyId]) -> Vec<Key> {
    ids.iter().filter_map(|id| layout.key(*id)).cloned().collect()
}

/// Inserts detached copies of `clipboard` shifted by `offset` on both axes
/// and returns their ids.
pub fn paste_keys(layout: &mut Layout, clipboard: &[Key], offset: f64, ids: &mut dyn IdGenerator) -> Result<Vec<KeyId>> {
    if clipboard.is_empty() {
        return Err(LayoutError::rejected("clipboard is empty"));
    }
    let mut created = Vec::with_capacity(clipboard.len());
    for source in clipboard {
        let mut key = source.clone();
        key.id = layout.fresh_id(ids);
        key.set_position(source.position() + Vec2::new(offset, offset));
        key.zone.clear();
        key.column.clear();
        key.row.clear();
        key.mirror_of = None;
        if !source.name.is_empty() {
            key.name = format!("copy_{}", source.name);
        }
        let id = key.id;
        if layout.insert_key(key) {
            created.push(id);
        }
    }
    Ok(created)
}
