use serde::{Deserialize, Serialize};

use crate::{DEFAULT_KEY_COLOR, DEFAULT_KEY_HEIGHT, DEFAULT_KEY_WIDTH, KeyId, KeyOverrides, Metadata, Point, Vec2};

/// A single key of the layout.
///
/// `zone`, `column` and `row` are names resolved by lookup in the owning
/// [`crate::Layout`]; a key whose zone is not part of the layout is detached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Key {
    pub id: KeyId,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub rotation_origin: Vec2,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub column: String,
    #[serde(default)]
    pub row: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub mirrored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_of: Option<KeyId>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    /// Spread, stagger, splay and padding in effect when the key was generated.
    #[serde(default, skip_serializing_if = "KeyOverrides::is_empty")]
    pub overrides: KeyOverrides,
}

fn default_width() -> f64 {
    DEFAULT_KEY_WIDTH
}

fn default_height() -> f64 {
    DEFAULT_KEY_HEIGHT
}

fn default_color() -> String {
    DEFAULT_KEY_COLOR.to_string()
}

impl Key {
    pub fn new(id: KeyId, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            width: DEFAULT_KEY_WIDTH,
            height: DEFAULT_KEY_HEIGHT,
            rotation: 0.0,
            rotation_origin: Vec2::ZERO,
            name: String::new(),
            zone: String::new(),
            column: String::new(),
            row: String::new(),
            color: default_color(),
            mirrored: false,
            mirror_of: None,
            metadata: Metadata::new(),
            overrides: KeyOverrides::default(),
        }
    }

    /// Places the key into a zone cell and derives its name from it.
    pub fn in_cell(mut self, zone: &str, column: &str, row: &str) -> Self {
        self.zone = zone.to_string();
        self.column = column.to_string();
        self.row = row.to_string();
        self.name = Self::cell_name(zone, column, row);
        self
    }

    /// Name the generation engine gives the key in a zone cell.
    pub fn cell_name(zone: &str, column: &str, row: &str) -> String {
        format!("{zone}_{column}_{row}")
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn set_position(&mut self, p: Vec2) {
        self.x = p.x;
        self.y = p.y;
    }

    pub fn to_point(&self) -> Point {
        let mut point = Point::new(self.x, self.y, self.rotation);
        point.meta = self.metadata.clone();
        point
    }

    /// Mirrored counterparts share the cell names of their source but do not
    /// occupy the cell.
    pub fn is_in_cell(&self, zone: &str, column: &str, row: &str) -> bool {
        !self.mirrored && self.zone == zone && self.column == column && self.row == row
    }
}
