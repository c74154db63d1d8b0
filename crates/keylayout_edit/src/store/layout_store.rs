use std::collections::BTreeSet;

use keylayout_engine::{IdGenerator, Key, KeyId, Layout, Result, SequentialIds, Vec2, codec};

use crate::{Action, Direction, EditorOptions, EditorState, GridSettings, History, MirrorAxis, Selection, Tool, UndoState, Viewport, operations};

use super::reduce;

/// Owner of the editor state. All changes go through [`LayoutStore::dispatch`].
pub struct LayoutStore {
    state: EditorState,
    ids: Box<dyn IdGenerator>,
}

impl Default for LayoutStore {
    fn default() -> Self {
        Self::new(Layout::new(), EditorOptions::default())
    }
}

impl LayoutStore {
    /// Creates a store whose ids continue after the highest id of `layout`.
    pub fn new(layout: Layout, options: EditorOptions) -> Self {
        let ids = SequentialIds::after(layout.keys.keys());
        Self::with_id_generator(layout, options, Box::new(ids))
    }

    pub fn with_id_generator(layout: Layout, options: EditorOptions, ids: Box<dyn IdGenerator>) -> Self {
        let mut state = EditorState::new(layout, options);
        state.history.push(state.layout.clone(), "Initial layout");
        Self { state, ids }
    }

    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        self.state = reduce(&self.state, action, self.ids.as_mut())?;
        Ok(())
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn layout(&self) -> &Layout {
        &self.state.layout
    }

    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.state.viewport
    }

    pub fn grid(&self) -> &GridSettings {
        &self.state.grid
    }

    pub fn tool(&self) -> Tool {
        self.state.tool
    }

    pub fn history(&self) -> &History {
        &self.state.history
    }

    pub fn clipboard(&self) -> &[Key] {
        &self.state.clipboard
    }

    pub fn options(&self) -> &EditorOptions {
        &self.state.options
    }

    pub fn selected_ids(&self) -> Vec<KeyId> {
        self.state.selection.ids.iter().copied().collect()
    }

    // === Document ===

    /// Parses a configuration, replaces the layout and records it in history.
    pub fn load_config(&mut self, text: &str) -> Result<()> {
        let layout = codec::deserialize(text, self.ids.as_mut())?;
        self.dispatch(Action::SetLayout(layout))?;
        self.push_history("Load configuration")
    }

    pub fn to_config(&self) -> Result<String> {
        codec::serialize(&self.state.layout)
    }

    pub fn push_history(&mut self, description: impl Into<String>) -> Result<()> {
        self.dispatch(Action::PushHistory(description.into()))
    }

    // === Editing ===

    pub fn select(&mut self, ids: impl IntoIterator<Item = KeyId>) -> Result<()> {
        self.dispatch(Action::SetSelection(ids.into_iter().collect()))
    }

    pub fn blocked_directions(&self, id: KeyId) -> BTreeSet<Direction> {
        match self.state.layout.key(id) {
            Some(key) => operations::blocked_directions(key, &self.state.layout),
            None => Direction::ALL.into_iter().collect(),
        }
    }

    /// Inserts a key next to `reference`. Returns the new key, or `None` if
    /// the direction is blocked.
    pub fn add_key_in_direction(&mut self, reference: KeyId, direction: Direction) -> Result<Option<KeyId>> {
        let before = self.state.layout.keys.len();
        self.dispatch(Action::AddKeyInDirection { reference, direction })?;
        if self.state.layout.keys.len() == before {
            return Ok(None);
        }
        Ok(self.state.selection.ids.iter().next().copied())
    }

    pub fn move_selected(&mut self, delta: Vec2) -> Result<()> {
        self.dispatch(Action::MoveSelected(delta))
    }

    pub fn rotate_selected(&mut self, angle: f64, origin: Option<Vec2>) -> Result<()> {
        self.dispatch(Action::RotateSelected { angle, origin })
    }

    /// Mirrors the selection and returns the ids of the new keys.
    pub fn mirror_selected(&mut self, axis: MirrorAxis) -> Result<Vec<KeyId>> {
        if self.state.selection.is_empty() {
            return Ok(Vec::new());
        }
        self.dispatch(Action::MirrorSelected(axis))?;
        Ok(self.selected_ids())
    }

    pub fn copy(&mut self) -> Result<()> {
        self.dispatch(Action::Copy)
    }

    /// Pastes the clipboard and returns the ids of the new keys.
    pub fn paste(&mut self) -> Result<Vec<KeyId>> {
        if self.state.clipboard.is_empty() {
            return Ok(Vec::new());
        }
        self.dispatch(Action::Paste)?;
        Ok(self.selected_ids())
    }

    pub fn set_zoom(&mut self, zoom: f64) -> Result<()> {
        self.dispatch(Action::SetZoom(zoom))
    }
}

impl UndoState for LayoutStore {
    fn undo_description(&self) -> Option<String> {
        self.state.history.undo_description()
    }

    fn can_undo(&self) -> bool {
        self.state.history.can_undo()
    }

    fn undo(&mut self) -> Result<()> {
        self.dispatch(Action::Undo)
    }

    fn redo_description(&self) -> Option<String> {
        self.state.history.redo_description()
    }

    fn can_redo(&self) -> bool {
        self.state.history.can_redo()
    }

    fn redo(&mut self) -> Result<()> {
        self.dispatch(Action::Redo)
    }
}
