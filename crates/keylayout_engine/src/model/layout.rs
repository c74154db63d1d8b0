use std::collections::BTreeMap;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::{DEFAULT_ENGINE_VERSION, IdGenerator, Key, KeyId, KeyOverrides, LayoutError, MirrorSettings, Result, Zone};

/// Document metadata written to the `meta` block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutMeta {
    pub engine: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Default for LayoutMeta {
    fn default() -> Self {
        Self {
            engine: DEFAULT_ENGINE_VERSION.to_string(),
            author: None,
            name: None,
            version: None,
        }
    }
}

impl LayoutMeta {
    /// The engine field must be a semantic version (`4.1.0`).
    pub fn validate_engine(engine: &str) -> Result<Version> {
        Version::parse(engine.trim()).map_err(|err| LayoutError::validation("meta.engine", format!("'{engine}' is not a semantic version: {err}")))
    }

    pub fn validate(&self) -> Result<()> {
        Self::validate_engine(&self.engine)?;
        Ok(())
    }
}

/// The whole document. Keys and zones are owned here and addressed by id or
/// name, so `clone()` is a complete, independent snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
    pub keys: BTreeMap<KeyId, Key>,
    /// Zones in declaration order; names are unique.
    pub zones: Vec<Zone>,
    /// Global key defaults, the least specific level of the precedence chain.
    pub key: KeyOverrides,
    pub mirror: Option<MirrorSettings>,
    pub rotation: f64,
    pub meta: LayoutMeta,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.name == name)
    }

    pub fn zone_mut(&mut self, name: &str) -> Option<&mut Zone> {
        self.zones.iter_mut().find(|z| z.name == name)
    }

    pub fn has_zone(&self, name: &str) -> bool {
        self.zone(name).is_some()
    }

    pub fn key(&self, id: KeyId) -> Option<&Key> {
        self.keys.get(&id)
    }

    pub fn key_mut(&mut self, id: KeyId) -> Option<&mut Key> {
        self.keys.get_mut(&id)
    }

    pub fn key_by_name(&self, name: &str) -> Option<&Key> {
        self.keys.values().find(|k| k.name == name)
    }

    /// Keys whose zone is part of this layout.
    pub fn keys_in_zone<'a>(&'a self, zone: &'a str) -> impl Iterator<Item = &'a Key> + 'a {
        self.keys.values().filter(move |k| k.zone == zone)
    }

    /// Keys that do not belong to any zone of this layout.
    pub fn detached_keys(&self) -> impl Iterator<Item = &Key> + '_ {
        self.keys.values().filter(move |k| !self.has_zone(&k.zone))
    }

    pub fn key_at(&self, zone: &str, column: &str, row: &str) -> Option<&Key> {
        self.keys.values().find(|k| k.is_in_cell(zone, column, row))
    }

    /// True when another key than `except` occupies the cell of a known zone.
    pub fn is_cell_taken(&self, zone: &str, column: &str, row: &str, except: Option<KeyId>) -> bool {
        self.has_zone(zone) && self.keys.values().any(|k| Some(k.id) != except && k.is_in_cell(zone, column, row))
    }

    /// Draws ids from `ids` until one is not used by any key of this layout.
    pub fn fresh_id(&self, ids: &mut dyn IdGenerator) -> KeyId {
        loop {
            let id = ids.next_id();
            if !self.keys.contains_key(&id) {
                return id;
            }
        }
    }

    /// True for the mirrored counterpart the zone or global mirror setting
    /// generates for a zone key. Such keys follow their source.
    pub fn is_mirror_counterpart(&self, key: &Key) -> bool {
        key.mirrored && self.has_zone(&key.zone)
    }

    /// Inserts a key, replacing nothing. Returns false if the id is taken or the
    /// target cell is already occupied.
    pub fn insert_key(&mut self, key: Key) -> bool {
        if self.keys.contains_key(&key.id) || self.is_cell_taken(&key.zone, &key.column, &key.row, None) {
            return false;
        }
        self.keys.insert(key.id, key);
        true
    }

    /// Removes a key and detaches every mirror that pointed at it.
    pub fn remove_key(&mut self, id: KeyId) -> Option<Key> {
        let removed = self.keys.remove(&id)?;
        for key in self.keys.values_mut() {
            if key.mirror_of == Some(id) {
                key.mirror_of = None;
            }
        }
        Some(removed)
    }
}
