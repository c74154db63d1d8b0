mod layout_store;
pub use layout_store::*;

mod reducer;
pub use reducer::*;

mod state;
pub use state::*;
