mod key;
pub use key::*;

mod layout;
pub use layout::*;

mod zone;
pub use zone::*;
