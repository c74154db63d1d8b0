//! Editor state
//!
//! Everything the editor needs besides the document itself: selection,
//! viewport, grid, active tool, history and clipboard. The reducer returns a
//! fresh `EditorState` for every action.

use std::collections::BTreeSet;

use keylayout_engine::{Key, KeyId, Layout, Vec2};

use crate::{EditorOptions, History, Tool};

/// Transient rubber band rectangle in world coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SelectionRect {
    pub start: Vec2,
    pub end: Vec2,
    pub active: bool,
}

impl SelectionRect {
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.start.x.min(self.end.x), self.start.y.min(self.end.y))
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.start.x.max(self.end.x), self.start.y.max(self.end.y))
    }

    pub fn contains(&self, p: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }
}

/// Selected keys. Every id is a key of the current layout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    pub ids: BTreeSet<KeyId>,
    pub active_zone: Option<String>,
    pub rect: SelectionRect,
}

impl Selection {
    pub fn contains(&self, id: KeyId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Drops ids that no longer name a key of `layout`.
    pub fn prune(&mut self, layout: &Layout) {
        self.ids.retain(|id| layout.keys.contains_key(id));
        if self.active_zone.as_ref().is_some_and(|z| !layout.has_zone(z)) {
            self.active_zone = None;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub pan: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { zoom: 1.0, pan: Vec2::ZERO }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSettings {
    pub visible: bool,
    pub snap: bool,
    pub size: f64,
    pub rotation_lock: bool,
}

impl GridSettings {
    pub fn from_options(options: &EditorOptions) -> Self {
        Self {
            visible: options.show_grid,
            snap: options.snap_to_grid,
            size: options.grid_size,
            rotation_lock: options.rotation_lock,
        }
    }

    pub fn snap_value(&self, v: f64) -> f64 {
        (v / self.size).round() * self.size
    }
}

impl Default for GridSettings {
    fn default() -> Self {
        Self::from_options(&EditorOptions::default())
    }
}

#[derive(Clone, Debug)]
pub struct EditorState {
    pub layout: Layout,
    pub selection: Selection,
    pub viewport: Viewport,
    pub grid: GridSettings,
    pub tool: Tool,
    pub history: History,
    pub clipboard: Vec<Key>,
    pub options: EditorOptions,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(Layout::new(), EditorOptions::default())
    }
}

impl EditorState {
    pub fn new(layout: Layout, options: EditorOptions) -> Self {
        Self {
            layout,
            selection: Selection::default(),
            viewport: Viewport::default(),
            grid: GridSettings::from_options(&options),
            tool: Tool::default(),
            history: History::new(options.history_capacity),
            clipboard: Vec::new(),
            options,
        }
    }

    pub fn selected_keys(&self) -> impl Iterator<Item = &Key> + '_ {
        self.selection.ids.iter().filter_map(|id| self.layout.key(*id))
    }
}
