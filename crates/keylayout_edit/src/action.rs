use keylayout_engine::{Anchor, Column, Key, KeyId, KeyOverrides, Layout, Metadata, MirrorSettings, Row, Vec2, Zone};
use serde::{Deserialize, Serialize};

/// Interaction mode of the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    Select,
    Pan,
    AddKey,
    Move,
    Rotate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Left and right step through columns, up and down through rows.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// +1 or -1 on the column/row index.
    pub fn step(self) -> i64 {
        match self {
            Direction::Up | Direction::Right => 1,
            Direction::Down | Direction::Left => -1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MirrorAxis {
    /// Reflect across a vertical line, flipping X.
    Vertical,
    /// Reflect across a horizontal line, flipping Y.
    Horizontal,
}

/// Partial key update; `None` leaves the field as it is.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub rotation_origin: Option<Vec2>,
    pub name: Option<String>,
    pub color: Option<String>,
    pub metadata: Option<Metadata>,
    pub overrides: Option<KeyOverrides>,
}

/// Partial zone update. Replacing columns or rows synchronizes the zone's keys.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneUpdate {
    pub anchor: Option<Anchor>,
    pub key: Option<KeyOverrides>,
    pub columns: Option<Vec<Column>>,
    pub rows: Option<Vec<Row>>,
    pub rotate: Option<f64>,
    pub mirror: Option<Option<MirrorSettings>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetaUpdate {
    pub engine: Option<String>,
    pub author: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Every change the layout store understands.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    // === Tool & Viewport ===
    SetTool(Tool),
    SetZoom(f64),
    SetPan(Vec2),
    PanBy(Vec2),

    // === Selection ===
    SetSelection(Vec<KeyId>),
    ExtendSelection(Vec<KeyId>),
    ClearSelection,
    SelectAll,
    SetActiveZone(Option<String>),
    BeginSelectionRect(Vec2),
    UpdateSelectionRect(Vec2),
    EndSelectionRect,

    // === Keys ===
    AddKey(Key),
    AddKeyInDirection { reference: KeyId, direction: Direction },
    UpdateKey { id: KeyId, update: KeyUpdate },
    DeleteKeys(Vec<KeyId>),
    DeleteSelected,
    MoveSelected(Vec2),
    RotateSelected { angle: f64, origin: Option<Vec2> },
    MirrorSelected(MirrorAxis),
    Copy,
    Paste,

    // === Zones ===
    AddZone(Zone),
    UpdateZone { name: String, update: ZoneUpdate },
    DeleteZone(String),
    AddColumn { zone: String, column: Column },
    RemoveColumn { zone: String, column: String },
    AddRow { zone: String, row: Row },
    RemoveRow { zone: String, row: String },

    // === Document ===
    SetLayout(Layout),
    SetMirror(Option<MirrorSettings>),
    SetRotation(f64),
    UpdateMeta(MetaUpdate),

    // === History ===
    PushHistory(String),
    Undo,
    Redo,

    // === Grid ===
    ToggleGrid,
    ToggleSnap,
    SetGridSize(f64),
    ToggleRotationLock,
}

impl Action {
    /// Actions that change the document, as opposed to view or selection state.
    pub fn changes_layout(&self) -> bool {
        matches!(
            self,
            Action::AddKey(_)
                | Action::AddKeyInDirection { .. }
                | Action::UpdateKey { .. }
                | Action::DeleteKeys(_)
                | Action::DeleteSelected
                | Action::MoveSelected(_)
                | Action::RotateSelected { .. }
                | Action::MirrorSelected(_)
                | Action::Paste
                | Action::AddZone(_)
                | Action::UpdateZone { .. }
                | Action::DeleteZone(_)
                | Action::AddColumn { .. }
                | Action::RemoveColumn { .. }
                | Action::AddRow { .. }
                | Action::RemoveRow { .. }
                | Action::SetLayout(_)
                | Action::SetMirror(_)
                | Action::SetRotation(_)
                | Action::UpdateMeta(_)
        )
    }
}
