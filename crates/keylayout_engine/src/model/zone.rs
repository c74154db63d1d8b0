use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{KEY_UNIT, Vec2};

/// Key-level properties. Every field is optional so the same type serves as
/// zone default, column default, row override and per-cell override.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stagger: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Vec2>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orient: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<Vec2>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<bool>,
}

impl KeyOverrides {
    pub fn is_empty(&self) -> bool {
        *self == KeyOverrides::default()
    }

    /// Returns `self` with every value set in `over` replacing its own.
    pub fn merged(&self, over: &KeyOverrides) -> KeyOverrides {
        KeyOverrides {
            spread: over.spread.or(self.spread),
            stagger: over.stagger.or(self.stagger),
            splay: over.splay.or(self.splay),
            origin: over.origin.or(self.origin),
            padding: over.padding.or(self.padding),
            orient: over.orient.or(self.orient),
            shift: over.shift.or(self.shift),
            rotate: over.rotate.or(self.rotate),
            width: over.width.or(self.width),
            height: over.height.or(self.height),
            skip: over.skip.or(self.skip),
        }
    }

    /// Fully resolved values with built-in defaults filled in.
    pub fn resolve(&self) -> ResolvedKey {
        let d = ResolvedKey::default();
        ResolvedKey {
            spread: self.spread.unwrap_or(d.spread),
            stagger: self.stagger.unwrap_or(d.stagger),
            splay: self.splay.unwrap_or(d.splay),
            origin: self.origin.unwrap_or(d.origin),
            padding: self.padding.unwrap_or(d.padding),
            orient: self.orient.unwrap_or(d.orient),
            shift: self.shift.unwrap_or(d.shift),
            rotate: self.rotate.unwrap_or(d.rotate),
            width: self.width.unwrap_or(d.width),
            height: self.height.unwrap_or(d.height),
            skip: self.skip.unwrap_or(d.skip),
        }
    }
}

/// Key properties after the precedence chain has been applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedKey {
    pub spread: f64,
    pub stagger: f64,
    pub splay: f64,
    pub origin: Vec2,
    pub padding: f64,
    pub orient: f64,
    pub shift: Vec2,
    pub rotate: f64,
    pub width: f64,
    pub height: f64,
    pub skip: bool,
}

impl Default for ResolvedKey {
    fn default() -> Self {
        Self {
            spread: KEY_UNIT,
            stagger: 0.0,
            splay: 0.0,
            origin: Vec2::ZERO,
            padding: KEY_UNIT,
            orient: 0.0,
            shift: Vec2::ZERO,
            rotate: 0.0,
            width: crate::DEFAULT_KEY_WIDTH,
            height: crate::DEFAULT_KEY_HEIGHT,
            skip: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub key: KeyOverrides,
    /// Per-row overrides that only apply inside this column.
    #[serde(default)]
    pub rows: BTreeMap<String, KeyOverrides>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_key(mut self, key: KeyOverrides) -> Self {
        self.key = key;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub name: String,
    #[serde(default)]
    pub key: KeyOverrides,
}

impl Row {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Name of an already placed key the zone is built from.
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default)]
    pub shift: Vec2,
    #[serde(default)]
    pub rotate: f64,
}

impl Anchor {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            shift: Vec2::new(x, y),
            ..Default::default()
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Anchor::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MirrorSettings {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default)]
    pub distance: f64,
}

/// A named group of columns × rows sharing an anchor.
///
/// Column and row order drives the placement accumulation: columns advance
/// left to right, rows bottom to top.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    #[serde(default)]
    pub anchor: Anchor,
    #[serde(default)]
    pub key: KeyOverrides,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub rotate: f64,
    #[serde(default)]
    pub mirror: Option<MirrorSettings>,
}

impl Zone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builds a zone with default columns and rows from plain names.
    pub fn with_grid(name: impl Into<String>, columns: &[&str], rows: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| Column::new(*c)).collect(),
            rows: rows.iter().map(|r| Row::new(*r)).collect(),
            ..Default::default()
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn row(&self, name: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn row_index(&self, name: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.name == name)
    }

    pub fn has_cell(&self, column: &str, row: &str) -> bool {
        self.column(column).is_some() && self.row(row).is_some()
    }

    /// Every (column, row) pair in placement order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.columns
            .iter()
            .flat_map(move |c| self.rows.iter().map(move |r| (c.name.as_str(), r.name.as_str())))
    }

    /// Column-wide properties: global → zone → column.
    pub fn column_key(&self, global: &KeyOverrides, column: &Column) -> KeyOverrides {
        global.merged(&self.key).merged(&column.key)
    }

    /// Cell properties: global → zone → column → column row override → zone row.
    pub fn cell_key(&self, global: &KeyOverrides, column: &Column, row: &Row) -> KeyOverrides {
        let mut key = self.column_key(global, column);
        if let Some(over) = column.rows.get(&row.name) {
            key = key.merged(over);
        }
        key.merged(&row.key)
    }

    /// Checks name uniqueness of columns and rows.
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.is_empty() {
            return Err(crate::LayoutError::invalid("points.zones", "zone name must not be empty"));
        }
        for (i, c) in self.columns.iter().enumerate() {
            if c.name.is_empty() || self.columns[..i].iter().any(|o| o.name == c.name) {
                return Err(crate::LayoutError::invalid(
                    format!("points.zones.{}.columns", self.name),
                    format!("column name '{}' is empty or not unique", c.name),
                ));
            }
        }
        for (i, r) in self.rows.iter().enumerate() {
            if r.name.is_empty() || self.rows[..i].iter().any(|o| o.name == r.name) {
                return Err(crate::LayoutError::invalid(
                    format!("points.zones.{}.rows", self.name),
                    format!("row name '{}' is empty or not unique", r.name),
                ));
            }
        }
        Ok(())
    }
}
