mod errors;
mod events;
mod session;

pub use errors::*;
pub use events::*;
pub use session::*;
