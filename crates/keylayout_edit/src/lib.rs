//! Editor core for key layouts: the layout store with its reducer, editing
//! operations, snapshot history, editor options and coordination of requests
//! to the external generation engine.

pub use keylayout_engine::*;

mod action;
pub use action::*;

mod history;
pub use history::*;

mod options;
pub use options::*;

mod generation;
pub use generation::*;

pub mod operations;

mod store;
pub use store::*;
