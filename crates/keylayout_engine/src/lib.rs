//! Geometry, data model, zone position generator and config codec for
//! keyboard key layouts built from zones of columns and rows.

mod error;
pub use error::*;

mod id;
pub use id::*;

mod point;
pub use point::*;

mod units;
pub use units::*;

mod model;
pub use model::*;

pub mod codec;
pub mod generator;

pub type Result<T> = std::result::Result<T, LayoutError>;
