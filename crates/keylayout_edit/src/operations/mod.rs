//! Editing operations
//!
//! Pure functions over a `Layout` used by the reducer. Each returns
//! `LayoutError::Rejected` when the edit does not apply; the layout may be
//! partially modified in that case, so callers work on a copy.

mod clipboard;
pub use clipboard::*;

mod direction;
pub use direction::*;

mod transform;
pub use transform::*;

mod zones;
pub use zones::*;
