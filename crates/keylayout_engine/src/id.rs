use serde::{Deserialize, Serialize};

/// Identifier of a key. Unique within a layout and never reused after creation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(pub u64);

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "key-{}", self.0)
    }
}

/// Source of fresh key ids.
///
/// Passed into every operation that creates keys so tests can supply a
/// deterministic sequence.
pub trait IdGenerator {
    fn next_id(&mut self) -> KeyId;
}

/// Hands out increasing ids starting at a given value.
#[derive(Clone, Debug)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Continues after the highest id already in use.
    pub fn after<'a>(ids: impl IntoIterator<Item = &'a KeyId>) -> Self {
        let max = ids.into_iter().map(|id| id.0).max().unwrap_or(0);
        Self::starting_at(max + 1)
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> KeyId {
        let id = KeyId(self.next);
        self.next += 1;
        id
    }
}
